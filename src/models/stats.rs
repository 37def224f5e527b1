use colorful::{Colorful, RGB};

/// Result of one discovery scan.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CollectOutcome {
    pub new_found: usize,
    pub scanned: usize,
    pub skipped_fresh: usize,
    pub total_listed: usize,
    pub flood_wait: Option<u64>,
}

impl CollectOutcome {
    pub fn print_summary(&self, output: &std::path::Path) {
        let success = RGB::new(16, 185, 129);
        let info = RGB::new(59, 130, 246);
        println!(
            "\n✅ Found {} new inactive chats ({} dialogs scanned, {} skipped as fresh)",
            self.new_found.to_string().color(success),
            self.scanned.to_string().color(info),
            self.skipped_fresh.to_string().color(info),
        );
        println!("💾 {} chats listed in {}", self.total_listed, output.display());
        if let Some(wait) = self.flood_wait {
            println!("🛑 Scan halted by rate limit, retry in {wait}s");
        }
    }
}

/// Result of one legacy-chat search sweep.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LegacyOutcome {
    pub new_found: usize,
    pub letters_searched: usize,
    pub total_listed: usize,
    pub flood_wait: Option<u64>,
}

impl LegacyOutcome {
    pub fn print_summary(&self, output: &std::path::Path) {
        let success = RGB::new(16, 185, 129);
        println!(
            "\n✅ Found {} legacy chats across {} queries",
            self.new_found.to_string().color(success),
            self.letters_searched,
        );
        println!("💾 {} chats listed in {}", self.total_listed, output.display());
        if let Some(wait) = self.flood_wait {
            println!("🛑 Search halted by rate limit, retry in {wait}s");
        }
    }
}

/// Running totals for a cleaning batch. A chat only counts as processed
/// once every found message in it was handled.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CleanOutcome {
    pub total_deleted: usize,
    pub total_found: usize,
    pub chats_processed: usize,
    pub errors: usize,
    pub flood_wait: Option<u64>,
}

impl CleanOutcome {
    pub fn print_summary(&self, total_chats: usize, dry_run: bool) {
        let warning = RGB::new(245, 158, 11);
        println!("\n{}", "=".repeat(40));
        println!("Summary:");
        println!("  Chats processed: {}/{}", self.chats_processed, total_chats);
        println!("  Messages found: {}", self.total_found);
        if dry_run {
            println!("  Messages to delete: {}", self.total_found);
        } else {
            println!("  Messages deleted: {}", self.total_deleted);
        }
        if self.errors > 0 {
            println!("  Errors: {}", self.errors.to_string().color(warning));
        }
        if let Some(wait) = self.flood_wait {
            println!("  🛑 Rate limited: wait {wait}s before the next run");
        }
    }
}

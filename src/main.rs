mod config;
mod display;
mod models;
mod processing;
mod provider;
mod storage;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::processing::clean::{CleanConfig, clean_chats, clear_chat};
use crate::processing::collect::{CollectConfig, collect_inactive_chats, store_dialogs};
use crate::processing::legacy::{DEFAULT_SEARCH_LETTERS, LegacyConfig, collect_legacy_chats};
use crate::provider::TelegramProvider;

const KEEP_FILE: &str = "keep_chats.json";
const DELETED_FILE: &str = "deleted_chats.json";
const FRESH_CACHE_FILE: &str = "fresh_chats.json";
const DEFAULT_CLEAR_LIMIT: usize = 100;

// Telegram tolerates roughly one write per second per account before it
// starts handing out FLOOD_WAITs; stay just under that.
const DELETE_DELAY: Duration = Duration::from_secs(1);
const SEARCH_DELAY: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(
    name = "tgsweep",
    version,
    about = "Find inactive Telegram chats and sweep your own messages out of them"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Collect chats whose last activity is older than a threshold
    Collect {
        /// Output JSON file path
        #[arg(short, long, default_value = "inactive_chats.json")]
        output: PathBuf,
        /// Months of inactivity before a chat counts as inactive
        #[arg(short, long, default_value_t = 6)]
        months: u32,
        /// Stop after this many newly found chats
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Dump every dialog to a JSON file, active or not
    Store {
        /// Output JSON file path
        #[arg(short, long, default_value = "dialogs.json")]
        output: PathBuf,
    },
    /// Review a collected list in the terminal
    View {
        #[arg(default_value = "inactive_chats.json")]
        file: PathBuf,
    },
    /// Review the keep list and un-keep entries
    Keep {
        #[arg(default_value = KEEP_FILE)]
        file: PathBuf,
    },
    /// Delete your own messages from every chat in the list
    Clean {
        #[arg(default_value = "inactive_chats.json")]
        file: PathBuf,
        /// Report what would be deleted without deleting anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Clear your own messages from a single chat by id
    Clear {
        chat_id: i64,
        /// Maximum number of messages to delete
        #[arg(short, long, default_value_t = DEFAULT_CLEAR_LIMIT)]
        limit: usize,
        /// Report what would be deleted without deleting anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Hunt for old chats hidden from the dialog list
    LegacyChats {
        /// Output JSON file path
        #[arg(short, long, default_value = "legacy_chats.json")]
        output: PathBuf,
        /// Characters to feed the directory search, one query each
        #[arg(short, long, default_value = DEFAULT_SEARCH_LETTERS)]
        letters: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        // The two review commands never touch the network.
        Command::View { file } => display::viewer::review_chats(&file, Path::new(KEEP_FILE)),
        Command::Keep { file } => display::viewer::review_keep_list(&file),
        command => run_remote(command).await,
    }
}

async fn run_remote(command: Command) -> Result<()> {
    let api = config::ApiConfig::from_env()?;
    let provider = TelegramProvider::connect(&api).await?;

    match command {
        Command::Collect {
            output,
            months,
            limit,
        } => {
            println!("🔍 Fetching dialogs (looking for chats inactive for {months}+ months)...");
            let config = CollectConfig {
                output: output.clone(),
                keep_file: KEEP_FILE.into(),
                deleted_file: DELETED_FILE.into(),
                cache_file: FRESH_CACHE_FILE.into(),
                months,
                limit,
            };
            let outcome = collect_inactive_chats(&provider, &config).await?;
            outcome.print_summary(&output);
        }
        Command::Store { output } => {
            println!("🔍 Fetching dialogs...");
            let count = store_dialogs(&provider, &output).await?;
            println!("💾 Stored {count} dialogs to {}", output.display());
        }
        Command::Clean { file, dry_run } => {
            let chats = storage::load_chat_list(&file)?;
            if chats.is_empty() {
                println!("No chats found in the file.");
                return Ok(());
            }
            println!("Processing {} chats...", chats.len());
            if dry_run {
                println!("DRY RUN - No messages will be deleted");
            }
            let config = CleanConfig {
                dry_run,
                list_file: Some(file.clone()),
                deleted_file: DELETED_FILE.into(),
                delay: DELETE_DELAY,
            };
            let outcome = clean_chats(&provider, &chats, &config).await?;
            outcome.print_summary(chats.len(), dry_run);

            // The swept-chats log only exists to stop rediscovery while a
            // campaign is in flight; once the list empties it has done its
            // job.
            if !dry_run && storage::load_chat_list_or_default(&file)?.is_empty() {
                storage::clear_deleted_chats(Path::new(DELETED_FILE))?;
                println!("🧹 Cleared {DELETED_FILE}");
            }
        }
        Command::Clear {
            chat_id,
            limit,
            dry_run,
        } => {
            clear_chat(&provider, chat_id, Some(limit), dry_run, DELETE_DELAY).await?;
        }
        Command::LegacyChats { output, letters } => {
            let config = LegacyConfig {
                output: output.clone(),
                keep_file: KEEP_FILE.into(),
                letters,
                delay: SEARCH_DELAY,
            };
            let outcome = collect_legacy_chats(&provider, &config).await?;
            outcome.print_summary(&output);
        }
        Command::View { .. } | Command::Keep { .. } => unreachable!("handled before connecting"),
    }
    Ok(())
}

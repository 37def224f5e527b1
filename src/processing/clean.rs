use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use colorful::{Colorful, RGB};

use crate::models::{ChatRecord, CleanOutcome};
use crate::provider::{ChatProvider, ProviderError};
use crate::storage;

pub struct CleanConfig {
    pub dry_run: bool,
    /// When set, the remaining list is rewritten after every chat so an
    /// interrupted batch can pick up where it stopped.
    pub list_file: Option<PathBuf>,
    pub deleted_file: PathBuf,
    /// Pause after each successful deletion.
    pub delay: Duration,
}

/// Deletes the account's own messages from every chat in the list, in
/// order. A flood-wait from any deletion abandons the whole batch: the
/// current chat stays in the persisted list, half-cleaned, for the next
/// run.
pub async fn clean_chats(
    provider: &dyn ChatProvider,
    chats: &[ChatRecord],
    config: &CleanConfig,
) -> Result<CleanOutcome> {
    let mut outcome = CleanOutcome::default();
    if chats.is_empty() {
        return Ok(outcome);
    }

    let info = RGB::new(59, 130, 246);
    let mut remaining: Vec<ChatRecord> = chats.to_vec();
    let total = chats.len();

    for chat in chats {
        let progress = outcome.chats_processed + outcome.errors + 1;
        println!(
            "\n[{}/{}] {}",
            progress,
            total,
            chat.name.clone().color(info)
        );

        match provider.resolve(chat.id).await {
            Ok(_) => {}
            Err(ProviderError::RateLimited { wait_secs }) => {
                outcome.flood_wait = Some(wait_secs);
                persist_remaining(config, &remaining)?;
                println!("  🛑 Rate limited, stopping the batch");
                break;
            }
            Err(err) => {
                println!("  ⚠️ Could not resolve chat: {err}");
                outcome.errors += 1;
                continue;
            }
        }

        let messages = match provider.own_messages(chat.id, None).await {
            Ok(messages) => messages,
            Err(ProviderError::RateLimited { wait_secs }) => {
                outcome.flood_wait = Some(wait_secs);
                persist_remaining(config, &remaining)?;
                println!("  🛑 Rate limited, stopping the batch");
                break;
            }
            Err(err) => {
                println!("  ⚠️ Could not scan messages: {err}");
                outcome.errors += 1;
                continue;
            }
        };
        outcome.total_found += messages.len();

        if messages.is_empty() {
            println!("  No messages found");
            outcome.chats_processed += 1;
            if !config.dry_run {
                remaining.retain(|entry| entry.id != chat.id);
                persist_remaining(config, &remaining)?;
                storage::record_deleted_chat(&config.deleted_file, chat.id, &chat.name)?;
            }
            continue;
        }

        println!("  Found {} messages", messages.len());
        if config.dry_run {
            println!("  [DRY RUN] Would delete {} messages", messages.len());
            outcome.chats_processed += 1;
            continue;
        }

        let mut deleted_here = 0;
        let mut halt_wait = None;
        for message in &messages {
            match provider.delete_message(chat.id, message.id).await {
                Ok(()) => {
                    deleted_here += 1;
                    tokio::time::sleep(config.delay).await;
                }
                Err(ProviderError::RateLimited { wait_secs }) => {
                    halt_wait = Some(wait_secs);
                    break;
                }
                Err(err) => {
                    println!("  Failed to delete message {}: {err}", message.id);
                }
            }
        }
        outcome.total_deleted += deleted_here;

        if let Some(wait_secs) = halt_wait {
            outcome.flood_wait = Some(wait_secs);
            // The chat is only partially cleaned, so it stays listed.
            persist_remaining(config, &remaining)?;
            println!(
                "  🛑 Rate limited after {deleted_here}/{} deletions, stopping the batch",
                messages.len()
            );
            break;
        }

        println!("  Deleted {deleted_here}/{} messages", messages.len());
        outcome.chats_processed += 1;
        remaining.retain(|entry| entry.id != chat.id);
        persist_remaining(config, &remaining)?;
        storage::record_deleted_chat(&config.deleted_file, chat.id, &chat.name)?;
    }

    Ok(outcome)
}

fn persist_remaining(config: &CleanConfig, remaining: &[ChatRecord]) -> Result<()> {
    if let Some(path) = &config.list_file {
        storage::save_chat_list(path, remaining)?;
    }
    Ok(())
}

/// Clears the account's own messages from a single chat, outside any list
/// or campaign state.
pub async fn clear_chat(
    provider: &dyn ChatProvider,
    chat_id: i64,
    limit: Option<usize>,
    dry_run: bool,
    delay: Duration,
) -> Result<CleanOutcome> {
    let mut outcome = CleanOutcome::default();

    let entity = match provider.resolve(chat_id).await {
        Ok(entity) => entity,
        Err(err) => {
            println!("❌ Could not find chat {chat_id}: {err}");
            outcome.errors += 1;
            return Ok(outcome);
        }
    };
    println!("Chat: {} ({})", entity.display_name(), entity.kind());
    if dry_run {
        println!("DRY RUN - No messages will be deleted");
    }

    println!("Scanning messages...");
    let messages = provider.own_messages(chat_id, limit).await?;
    for message in &messages {
        let date = message
            .date
            .map(|d| d.to_rfc3339())
            .unwrap_or_default();
        let preview: String = message.text.chars().take(50).collect();
        let preview = if preview.is_empty() {
            "[media]".to_string()
        } else {
            preview
        };
        println!("  [{date}] ID:{} - {preview}", message.id);
    }
    outcome.total_found = messages.len();

    if messages.is_empty() {
        println!("No messages found to delete");
        return Ok(outcome);
    }
    println!("\nFound {} messages", messages.len());

    if dry_run {
        println!("Dry run complete. Run again without --dry-run to delete.");
        return Ok(outcome);
    }

    println!("Deleting messages...");
    for message in &messages {
        match provider.delete_message(chat_id, message.id).await {
            Ok(()) => {
                outcome.total_deleted += 1;
                println!("  Deleted message ID: {}", message.id);
                tokio::time::sleep(delay).await;
            }
            Err(ProviderError::RateLimited { wait_secs }) => {
                outcome.flood_wait = Some(wait_secs);
                println!("🛑 Rate limited, wait {wait_secs}s before retrying");
                break;
            }
            Err(err) => {
                println!("  Failed to delete message {}: {err}", message.id);
            }
        }
    }

    println!(
        "\nDeleted {}/{} messages",
        outcome.total_deleted,
        messages.len()
    );
    Ok(outcome)
}

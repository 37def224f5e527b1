use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, anyhow};
use futures::StreamExt;

use crate::models::{ChatRecord, LegacyOutcome};
use crate::provider::{ChatProvider, ProviderError};
use crate::storage;

pub const DEFAULT_SEARCH_LETTERS: &str = "abcdefghijklmnopqrstuvwxyz0123456789";

pub struct LegacyConfig {
    pub output: PathBuf,
    pub keep_file: PathBuf,
    pub letters: String,
    /// Pause between directory queries.
    pub delay: Duration,
}

/// Hunts for conversations that no longer show up in the dialog list by
/// querying the directory search with every character of the alphabet.
/// Anything that search returns but the dialog list does not is recorded
/// with `source: "search"`.
pub async fn collect_legacy_chats(
    provider: &dyn ChatProvider,
    config: &LegacyConfig,
) -> Result<LegacyOutcome> {
    let keep = storage::load_keep_ids(&config.keep_file);
    let mut listed = storage::load_chat_list_or_default(&config.output)?;
    let mut known: HashSet<i64> = listed.iter().map(|chat| chat.id).collect();

    let mut outcome = LegacyOutcome::default();

    println!("🔍 Fetching the visible dialog list first...");
    let mut visible: HashSet<i64> = HashSet::new();
    {
        let mut dialogs = provider.dialogs();
        while let Some(item) = dialogs.next().await {
            match item {
                Ok(dialog) => {
                    visible.insert(dialog.entity.id());
                }
                Err(ProviderError::RateLimited { wait_secs }) => {
                    outcome.flood_wait = Some(wait_secs);
                    println!("🛑 Rate limited while listing dialogs, stopping here");
                    storage::save_chat_list(&config.output, &listed)?;
                    outcome.total_listed = listed.len();
                    return Ok(outcome);
                }
                Err(err) => return Err(anyhow!(err).context("dialog scan aborted")),
            }
        }
    }

    let mut new_chats: Vec<ChatRecord> = Vec::new();
    for letter in config.letters.chars() {
        let query = letter.to_string();
        println!("🔎 Searching '{letter}'...");
        match provider.search_directory(&query).await {
            Ok(matches) => {
                outcome.letters_searched += 1;
                for entity in matches {
                    let id = entity.id();
                    if visible.contains(&id) || keep.contains(&id) || known.contains(&id) {
                        continue;
                    }
                    let mut record = ChatRecord::from_entity(&entity);
                    record.source = Some("search".to_string());
                    new_chats.push(record);
                    known.insert(id);
                }
            }
            Err(ProviderError::EmptyQuery) => {
                outcome.letters_searched += 1;
                println!("  Query '{letter}' rejected, skipping");
            }
            Err(ProviderError::RateLimited { wait_secs }) => {
                outcome.flood_wait = Some(wait_secs);
                println!("🛑 Rate limited, abandoning the remaining alphabet");
                break;
            }
            Err(err) => {
                outcome.letters_searched += 1;
                println!("  ⚠️ Search '{letter}' failed: {err}");
            }
        }
        tokio::time::sleep(config.delay).await;
    }

    // Whatever was gathered before a halt still gets written.
    outcome.new_found = new_chats.len();
    listed.extend(new_chats);
    outcome.total_listed = listed.len();
    storage::save_chat_list(&config.output, &listed)?;
    Ok(outcome)
}

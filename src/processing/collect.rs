use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use futures::StreamExt;

use crate::models::{
    ChatRecord, CollectOutcome, format_timestamp, is_inactive, parse_timestamp,
};
use crate::provider::{ChatProvider, ProviderError};
use crate::storage::{self, FreshEntry};

pub struct CollectConfig {
    pub output: PathBuf,
    pub keep_file: PathBuf,
    pub deleted_file: PathBuf,
    pub cache_file: PathBuf,
    pub months: u32,
    pub limit: Option<usize>,
}

/// Walks the dialog list and appends chats inactive for longer than the
/// threshold to the output file.
///
/// Skip precedence per dialog: kept, already swept, already listed,
/// cached as fresh. Only then is the last-message date consulted. Active
/// chats feed the freshness cache; both the cache and the output list are
/// written exactly once, at the end.
pub async fn collect_inactive_chats(
    provider: &dyn ChatProvider,
    config: &CollectConfig,
) -> Result<CollectOutcome> {
    let keep = storage::load_keep_ids(&config.keep_file);
    let deleted = storage::load_deleted_ids(&config.deleted_file);

    let mut listed = storage::load_chat_list_or_default(&config.output)?;
    let before = listed.len();
    listed.retain(|chat| !keep.contains(&chat.id));
    if listed.len() != before {
        storage::save_chat_list(&config.output, &listed)?;
        println!("🧹 Dropped {} kept chats from {}", before - listed.len(), config.output.display());
    }

    let mut cache = storage::load_fresh_cache(&config.cache_file);
    let fresh_ids: HashSet<i64> = cache
        .iter()
        .filter(|(_, entry)| {
            parse_timestamp(&entry.last_message_date)
                .is_some_and(|date| !is_inactive(Some(date), config.months))
        })
        .map(|(id, _)| *id)
        .collect();

    let mut listed_ids: HashSet<i64> = listed.iter().map(|chat| chat.id).collect();
    let mut staged_fresh: HashMap<i64, FreshEntry> = HashMap::new();
    let mut new_chats: Vec<ChatRecord> = Vec::new();
    let mut outcome = CollectOutcome::default();
    let mut fatal: Option<ProviderError> = None;

    {
        let mut dialogs = provider.dialogs();
        while let Some(item) = dialogs.next().await {
            let dialog = match item {
                Ok(dialog) => dialog,
                Err(ProviderError::RateLimited { wait_secs }) => {
                    println!("🛑 Rate limited while scanning, stopping here");
                    outcome.flood_wait = Some(wait_secs);
                    break;
                }
                Err(err) => {
                    fatal = Some(err);
                    break;
                }
            };

            outcome.scanned += 1;
            let id = dialog.entity.id();
            if keep.contains(&id) || deleted.contains(&id) || listed_ids.contains(&id) {
                continue;
            }
            if fresh_ids.contains(&id) {
                outcome.skipped_fresh += 1;
                continue;
            }

            if !is_inactive(dialog.last_message_date, config.months) {
                if let Some(date) = dialog.last_message_date {
                    staged_fresh.insert(
                        id,
                        FreshEntry {
                            last_message_date: format_timestamp(date),
                            name: dialog.entity.display_name(),
                        },
                    );
                }
                continue;
            }

            new_chats.push(ChatRecord::from_dialog(&dialog));
            listed_ids.insert(id);
            if config.limit.is_some_and(|cap| new_chats.len() >= cap) {
                break;
            }
        }
    }

    // One write each, no matter how far the scan got.
    outcome.new_found = new_chats.len();
    cache.extend(staged_fresh);
    storage::save_fresh_cache(&config.cache_file, &cache)?;
    listed.extend(new_chats);
    outcome.total_listed = listed.len();
    storage::save_chat_list(&config.output, &listed)?;

    if let Some(err) = fatal {
        return Err(anyhow!(err).context("dialog scan aborted"));
    }
    Ok(outcome)
}

/// Dumps every dialog, active or not, to a JSON file.
pub async fn store_dialogs(
    provider: &dyn ChatProvider,
    output: &std::path::Path,
) -> Result<usize> {
    let mut records = Vec::new();
    {
        let mut dialogs = provider.dialogs();
        while let Some(item) = dialogs.next().await {
            let dialog = item.map_err(|err| anyhow!(err).context("dialog scan aborted"))?;
            records.push(ChatRecord::from_dialog(&dialog));
        }
    }
    storage::save_chat_list(output, &records)?;
    Ok(records.len())
}

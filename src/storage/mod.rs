use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::ChatRecord;

/// Every mutation below rewrites the whole file. A crash between two
/// operations leaves the previous fully-written state on disk.

pub fn load_chat_list(path: &Path) -> Result<Vec<ChatRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}

pub fn load_chat_list_or_default(path: &Path) -> Result<Vec<ChatRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    load_chat_list(path)
}

pub fn save_chat_list(path: &Path, chats: &[ChatRecord]) -> Result<()> {
    let raw = serde_json::to_string_pretty(chats)?;
    fs::write(path, raw).with_context(|| format!("failed to write {}", path.display()))
}

/// Ids the user never wants touched. Corrupt or missing files read as
/// empty; entries without an id are skipped rather than rejected.
pub fn load_keep_ids(path: &Path) -> HashSet<i64> {
    let Ok(raw) = fs::read_to_string(path) else {
        return HashSet::new();
    };
    let Ok(entries) = serde_json::from_str::<Vec<Value>>(&raw) else {
        return HashSet::new();
    };
    entries
        .iter()
        .filter_map(|entry| entry.get("id").and_then(Value::as_i64))
        .collect()
}

pub fn load_keep_records(path: &Path) -> Vec<ChatRecord> {
    let Ok(raw) = fs::read_to_string(path) else {
        return Vec::new();
    };
    let Ok(entries) = serde_json::from_str::<Vec<Value>>(&raw) else {
        return Vec::new();
    };
    entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect()
}

pub fn add_to_keep_list(path: &Path, chat: &ChatRecord) -> Result<()> {
    let mut records = load_keep_records(path);
    if records.iter().any(|existing| existing.id == chat.id) {
        return Ok(());
    }
    records.push(chat.clone());
    save_chat_list(path, &records)
}

/// No-op when the file does not exist; un-keeping never creates state.
pub fn remove_from_keep_list(path: &Path, id: i64) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let mut records = load_keep_records(path);
    records.retain(|record| record.id != id);
    save_chat_list(path, &records)
}

/// Minimal record of a chat whose messages were already swept in the
/// current campaign. Exists only to stop rediscovery between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeletedRecord {
    pub id: i64,
    pub name: String,
}

pub fn load_deleted_ids(path: &Path) -> HashSet<i64> {
    let Ok(raw) = fs::read_to_string(path) else {
        return HashSet::new();
    };
    let Ok(records) = serde_json::from_str::<Vec<DeletedRecord>>(&raw) else {
        return HashSet::new();
    };
    records.into_iter().map(|record| record.id).collect()
}

pub fn record_deleted_chat(path: &Path, id: i64, name: &str) -> Result<()> {
    let mut records = match fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str::<Vec<DeletedRecord>>(&raw).unwrap_or_default(),
        Err(_) => Vec::new(),
    };
    if !records.iter().any(|record| record.id == id) {
        records.push(DeletedRecord {
            id,
            name: name.to_string(),
        });
    }
    let raw = serde_json::to_string_pretty(&records)?;
    fs::write(path, raw).with_context(|| format!("failed to write {}", path.display()))
}

pub fn clear_deleted_chats(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("failed to remove {}", path.display())),
    }
}

/// Cache entry for a chat last seen active. The entry is trusted until
/// its recorded date ages past the inactivity threshold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FreshEntry {
    #[serde(default)]
    pub last_message_date: String,
    #[serde(default)]
    pub name: String,
}

pub fn load_fresh_cache(path: &Path) -> HashMap<i64, FreshEntry> {
    let Ok(raw) = fs::read_to_string(path) else {
        return HashMap::new();
    };
    serde_json::from_str(&raw).unwrap_or_default()
}

pub fn save_fresh_cache(path: &Path, cache: &HashMap<i64, FreshEntry>) -> Result<()> {
    let raw = serde_json::to_string_pretty(cache)?;
    fs::write(path, raw).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: i64, name: &str) -> ChatRecord {
        ChatRecord {
            id,
            name: name.to_string(),
            ..ChatRecord::from_entity(&crate::models::PeerEntity::Person {
                id,
                first_name: Some(name.to_string()),
                last_name: None,
                username: None,
                phone: None,
                bot: false,
            })
        }
    }

    #[test]
    fn chat_list_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chats.json");
        let chats = vec![record(123, "John Doe"), record(456, "Test Channel")];

        save_chat_list(&path, &chats).unwrap();
        let loaded = load_chat_list(&path).unwrap();

        assert_eq!(loaded, chats);
    }

    #[test]
    fn chat_list_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(load_chat_list(&dir.path().join("nope.json")).is_err());
        assert!(
            load_chat_list_or_default(&dir.path().join("nope.json"))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn chat_list_invalid_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "not valid json {").unwrap();
        assert!(load_chat_list(&path).is_err());
    }

    #[test]
    fn keep_ids_tolerate_missing_and_corrupt_files() {
        let dir = TempDir::new().unwrap();
        assert!(load_keep_ids(&dir.path().join("keep.json")).is_empty());

        let path = dir.path().join("keep.json");
        fs::write(&path, "invalid json {").unwrap();
        assert!(load_keep_ids(&path).is_empty());
    }

    #[test]
    fn keep_ids_skip_entries_without_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keep.json");
        fs::write(
            &path,
            r#"[{"id": 123, "name": "Chat 1"}, {"name": "No id"}, {"id": 456, "name": "Chat 2"}]"#,
        )
        .unwrap();

        assert_eq!(load_keep_ids(&path), HashSet::from([123, 456]));
    }

    #[test]
    fn add_to_keep_list_creates_appends_and_dedupes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keep.json");

        add_to_keep_list(&path, &record(123, "Test Chat")).unwrap();
        add_to_keep_list(&path, &record(456, "Other")).unwrap();
        add_to_keep_list(&path, &record(123, "Duplicate")).unwrap();

        let records = load_keep_records(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 123);
        assert_eq!(records[0].name, "Test Chat");
        assert_eq!(records[1].id, 456);
    }

    #[test]
    fn add_to_keep_list_recovers_from_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keep.json");
        fs::write(&path, "corrupted {").unwrap();

        add_to_keep_list(&path, &record(123, "New Chat")).unwrap();

        let records = load_keep_records(&path);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 123);
    }

    #[test]
    fn remove_from_keep_list_by_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keep.json");
        for (id, name) in [(123, "Chat 1"), (456, "Chat 2"), (789, "Chat 3")] {
            add_to_keep_list(&path, &record(id, name)).unwrap();
        }

        remove_from_keep_list(&path, 456).unwrap();

        let remaining: Vec<i64> = load_keep_records(&path).iter().map(|r| r.id).collect();
        assert_eq!(remaining, vec![123, 789]);

        remove_from_keep_list(&path, 999).unwrap();
        assert_eq!(load_keep_records(&path).len(), 2);
    }

    #[test]
    fn remove_from_keep_list_does_not_create_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("keep.json");

        remove_from_keep_list(&path, 123).unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn deleted_log_records_and_clears() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deleted.json");

        record_deleted_chat(&path, 123, "Chat 1").unwrap();
        record_deleted_chat(&path, 456, "Chat 2").unwrap();
        record_deleted_chat(&path, 123, "Chat 1 again").unwrap();

        assert_eq!(load_deleted_ids(&path), HashSet::from([123, 456]));

        clear_deleted_chats(&path).unwrap();
        assert!(!path.exists());
        clear_deleted_chats(&path).unwrap();
    }

    #[test]
    fn fresh_cache_roundtrip_and_tolerance() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");

        assert!(load_fresh_cache(&path).is_empty());

        let mut cache = HashMap::new();
        cache.insert(
            123,
            FreshEntry {
                last_message_date: "2025-06-15T10:30:00+00:00".to_string(),
                name: "Test Chat".to_string(),
            },
        );
        save_fresh_cache(&path, &cache).unwrap();

        let loaded = load_fresh_cache(&path);
        assert_eq!(loaded.get(&123).unwrap().name, "Test Chat");

        fs::write(&path, "invalid json {").unwrap();
        assert!(load_fresh_cache(&path).is_empty());
    }
}

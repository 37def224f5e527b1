use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    #[default]
    User,
    Bot,
    Group,
    Channel,
    Supergroup,
}

impl std::fmt::Display for ChatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ChatKind::User => "user",
            ChatKind::Bot => "bot",
            ChatKind::Group => "group",
            ChatKind::Channel => "channel",
            ChatKind::Supergroup => "supergroup",
        };
        f.pad(label)
    }
}

/// One peer as the provider reports it. Closed set: every call site
/// matches exhaustively, so a new variant is a compile error everywhere
/// it matters.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerEntity {
    Person {
        id: i64,
        first_name: Option<String>,
        last_name: Option<String>,
        username: Option<String>,
        phone: Option<String>,
        bot: bool,
    },
    Group {
        id: i64,
        title: Option<String>,
        participants_count: Option<i32>,
    },
    Broadcast {
        id: i64,
        title: Option<String>,
        username: Option<String>,
        broadcast: bool,
        participants_count: Option<i32>,
    },
    /// The account was removed from this chat; only scraps of metadata
    /// survive, and sometimes not even the broadcast flag.
    Forbidden {
        id: i64,
        title: Option<String>,
        broadcast: Option<bool>,
    },
}

impl PeerEntity {
    pub fn id(&self) -> i64 {
        match self {
            PeerEntity::Person { id, .. }
            | PeerEntity::Group { id, .. }
            | PeerEntity::Broadcast { id, .. }
            | PeerEntity::Forbidden { id, .. } => *id,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            PeerEntity::Person {
                id,
                first_name,
                last_name,
                username,
                ..
            } => {
                let joined = [first_name.as_deref(), last_name.as_deref()]
                    .into_iter()
                    .flatten()
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                if !joined.is_empty() {
                    joined
                } else if let Some(username) = username.as_deref().filter(|u| !u.is_empty()) {
                    username.to_string()
                } else {
                    id.to_string()
                }
            }
            PeerEntity::Group { id, title, .. } | PeerEntity::Broadcast { id, title, .. } => title
                .as_deref()
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| id.to_string()),
            PeerEntity::Forbidden { id, title, .. } => title
                .as_deref()
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("[forbidden] {id}")),
        }
    }

    pub fn kind(&self) -> ChatKind {
        match self {
            PeerEntity::Person { bot: true, .. } => ChatKind::Bot,
            PeerEntity::Person { .. } => ChatKind::User,
            PeerEntity::Group { .. } => ChatKind::Group,
            PeerEntity::Broadcast {
                broadcast: true, ..
            } => ChatKind::Channel,
            PeerEntity::Broadcast { .. } => ChatKind::Supergroup,
            PeerEntity::Forbidden {
                broadcast: Some(false),
                ..
            } => ChatKind::Supergroup,
            // When the forbidden peer does not say whether it was a
            // broadcast, "channel" is the recorded default. Callers must
            // not trust the kind of forbidden entries.
            PeerEntity::Forbidden { .. } => ChatKind::Channel,
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            PeerEntity::Person { username, .. } | PeerEntity::Broadcast { username, .. } => {
                username.as_deref()
            }
            PeerEntity::Group { .. } | PeerEntity::Forbidden { .. } => None,
        }
    }
}

/// One entry from the provider's dialog stream.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogSummary {
    pub entity: PeerEntity,
    pub last_message_date: Option<DateTime<Utc>>,
    pub unread_count: i32,
}

/// A message authored by the current account.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnMessage {
    pub id: i32,
    pub date: Option<DateTime<Utc>>,
    pub text: String,
}

/// A chat as persisted in the JSON state files. Field names match the
/// files this tool has always written, so hand-edited lists stay loadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: ChatKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_date: Option<String>,
    #[serde(default)]
    pub unread_count: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ChatRecord {
    pub fn from_dialog(dialog: &DialogSummary) -> Self {
        let mut record = Self::from_entity(&dialog.entity);
        record.last_message_date = dialog.last_message_date.map(format_timestamp);
        record.unread_count = dialog.unread_count;
        record
    }

    pub fn from_entity(entity: &PeerEntity) -> Self {
        let (phone, participants_count) = match entity {
            PeerEntity::Person { phone, .. } => (phone.clone(), None),
            PeerEntity::Group {
                participants_count, ..
            }
            | PeerEntity::Broadcast {
                participants_count, ..
            } => (None, *participants_count),
            PeerEntity::Forbidden { .. } => (None, None),
        };
        Self {
            id: entity.id(),
            name: entity.display_name(),
            kind: entity.kind(),
            last_message_date: None,
            unread_count: 0,
            username: entity.username().map(str::to_string),
            phone,
            participants_count,
            source: None,
        }
    }
}

/// True when the chat counts as inactive: no message at all, or the last
/// one is older than `months` (fixed 30-day months, not calendar-aware).
pub fn is_inactive(last_message_date: Option<DateTime<Utc>>, months: u32) -> bool {
    match last_message_date {
        None => true,
        Some(date) => date < Utc::now() - TimeDelta::days(i64::from(months) * 30),
    }
}

/// Parses the timestamps found in state files. Naive timestamps are read
/// as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn format_timestamp(date: DateTime<Utc>) -> String {
    date.to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: i64) -> PeerEntity {
        PeerEntity::Person {
            id,
            first_name: Some("Old".into()),
            last_name: Some("User".into()),
            username: Some("olduser".into()),
            phone: None,
            bot: false,
        }
    }

    #[test]
    fn inactive_when_older_than_threshold() {
        let old = Utc::now() - TimeDelta::days(200);
        assert!(is_inactive(Some(old), 6));
    }

    #[test]
    fn active_when_recent() {
        let recent = Utc::now() - TimeDelta::days(30);
        assert!(!is_inactive(Some(recent), 6));
    }

    #[test]
    fn inactive_when_no_messages() {
        assert!(is_inactive(None, 6));
    }

    #[test]
    fn respects_custom_threshold() {
        let four_months_ago = Utc::now() - TimeDelta::days(120);
        assert!(is_inactive(Some(four_months_ago), 3));
        assert!(!is_inactive(Some(four_months_ago), 6));
    }

    #[test]
    fn now_is_never_inactive() {
        assert!(!is_inactive(Some(Utc::now()), 1));
    }

    #[test]
    fn person_name_joins_first_and_last() {
        assert_eq!(person(1).display_name(), "Old User");
    }

    #[test]
    fn person_name_falls_back_to_username_then_id() {
        let entity = PeerEntity::Person {
            id: 42,
            first_name: None,
            last_name: None,
            username: Some("ghost".into()),
            phone: None,
            bot: false,
        };
        assert_eq!(entity.display_name(), "ghost");

        let entity = PeerEntity::Person {
            id: 42,
            first_name: Some(String::new()),
            last_name: None,
            username: None,
            phone: None,
            bot: false,
        };
        assert_eq!(entity.display_name(), "42");
    }

    #[test]
    fn bot_flag_changes_kind() {
        let entity = PeerEntity::Person {
            id: 7,
            first_name: Some("Robo".into()),
            last_name: None,
            username: None,
            phone: None,
            bot: true,
        };
        assert_eq!(entity.kind(), ChatKind::Bot);
        assert_eq!(person(1).kind(), ChatKind::User);
    }

    #[test]
    fn broadcast_flag_splits_channel_and_supergroup() {
        let channel = PeerEntity::Broadcast {
            id: 1,
            title: Some("News".into()),
            username: None,
            broadcast: true,
            participants_count: Some(100),
        };
        let supergroup = PeerEntity::Broadcast {
            id: 2,
            title: Some("Chatter".into()),
            username: None,
            broadcast: false,
            participants_count: Some(100),
        };
        assert_eq!(channel.kind(), ChatKind::Channel);
        assert_eq!(supergroup.kind(), ChatKind::Supergroup);
    }

    #[test]
    fn forbidden_defaults_to_channel_unless_flag_says_otherwise() {
        let unknown = PeerEntity::Forbidden {
            id: 9,
            title: None,
            broadcast: None,
        };
        let megagroup = PeerEntity::Forbidden {
            id: 9,
            title: None,
            broadcast: Some(false),
        };
        assert_eq!(unknown.kind(), ChatKind::Channel);
        assert_eq!(megagroup.kind(), ChatKind::Supergroup);
        assert_eq!(unknown.display_name(), "[forbidden] 9");
    }

    #[test]
    fn group_name_falls_back_to_id() {
        let entity = PeerEntity::Group {
            id: 77,
            title: None,
            participants_count: None,
        };
        assert_eq!(entity.display_name(), "77");
        assert_eq!(entity.kind(), ChatKind::Group);
    }

    #[test]
    fn record_serializes_with_legacy_field_names() {
        let record = ChatRecord::from_dialog(&DialogSummary {
            entity: person(123),
            last_message_date: Some(Utc::now()),
            unread_count: 4,
        });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 123);
        assert_eq!(json["type"], "user");
        assert_eq!(json["name"], "Old User");
        assert_eq!(json["unread_count"], 4);
        assert!(json["last_message_date"].is_string());
        assert_eq!(json["username"], "olduser");
    }

    #[test]
    fn record_loads_minimal_entries() {
        let record: ChatRecord = serde_json::from_str(r#"{"id": 5, "name": "Bare"}"#).unwrap();
        assert_eq!(record.id, 5);
        assert_eq!(record.kind, ChatKind::User);
        assert_eq!(record.last_message_date, None);
    }

    #[test]
    fn parses_offset_and_naive_timestamps() {
        let offset = parse_timestamp("2025-06-15T10:30:00+02:00").unwrap();
        assert_eq!(offset.to_rfc3339(), "2025-06-15T08:30:00+00:00");

        let naive = parse_timestamp("2025-06-15T10:30:00").unwrap();
        assert_eq!(naive.to_rfc3339(), "2025-06-15T10:30:00+00:00");

        assert!(parse_timestamp("not a date").is_none());
    }
}

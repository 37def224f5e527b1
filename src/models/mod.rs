mod chat;
mod stats;

pub use chat::{
    ChatKind, ChatRecord, DialogSummary, OwnMessage, PeerEntity, format_timestamp, is_inactive,
    parse_timestamp,
};
pub use stats::{CleanOutcome, CollectOutcome, LegacyOutcome};

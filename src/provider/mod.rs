mod telegram;

pub use telegram::TelegramProvider;

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::models::{DialogSummary, OwnMessage, PeerEntity};

/// Failures the messaging provider can signal. Rate limiting is a normal
/// outcome here, not an exception: it carries the wait the server asked
/// for and callers decide how much of their batch to abandon.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("rate limited, retry in {wait_secs}s")]
    RateLimited { wait_secs: u64 },

    #[error("no chat found for id {0}")]
    NotFound(i64),

    #[error("not a participant of this chat")]
    NotParticipant,

    #[error("admin privileges required")]
    AdminRequired,

    #[error("query rejected as empty or unsupported")]
    EmptyQuery,

    #[error("{0}")]
    Transport(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// What the orchestrators need from a messaging account. All calls are
/// issued sequentially; implementations never see concurrent requests.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Lazily walks the account's full dialog list. The stream may be
    /// arbitrarily long; pagination is the implementation's business.
    fn dialogs(&self) -> BoxStream<'_, ProviderResult<DialogSummary>>;

    async fn resolve(&self, chat_id: i64) -> ProviderResult<PeerEntity>;

    /// Messages authored by the current account in the given chat,
    /// newest first. `limit` caps how many are returned.
    async fn own_messages(
        &self,
        chat_id: i64,
        limit: Option<usize>,
    ) -> ProviderResult<Vec<OwnMessage>>;

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> ProviderResult<()>;

    /// Global directory search, the way the official clients implement
    /// their contact search box.
    async fn search_directory(&self, query: &str) -> ProviderResult<Vec<PeerEntity>>;
}

//! Persistence seams for the chat service. One trait per aggregate, with an
//! in-memory implementation used by tests and a Postgres implementation used
//! in production, selected at construction time.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{ChatMessage, Conversation, ConversationId, UserId};

/// Default and maximum page size for message listings.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Resolve a caller-requested page size against the bound. Callers may ask
/// for less than the default, down to an empty page; never for more.
pub(crate) fn clamp_page(take: Option<i64>) -> i64 {
    take.unwrap_or(DEFAULT_PAGE_SIZE).clamp(0, DEFAULT_PAGE_SIZE)
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Insert a new message or replace an existing one matched by id. No
    /// validation beyond required fields; that is the chat service's job.
    async fn upsert(&self, message: ChatMessage) -> AppResult<ChatMessage>;

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<ChatMessage>>;

    /// Non-deleted messages of a conversation, most recent first (created_at
    /// desc, id as tiebreak). Unknown conversations yield an empty page.
    async fn list_by_conversation(
        &self,
        conversation_id: &ConversationId,
        skip: i64,
        take: Option<i64>,
    ) -> AppResult<Vec<ChatMessage>>;

    /// Flip `is_read` on every unread message addressed to `reader` in the
    /// conversation. Idempotent; returns the number of rows updated.
    async fn mark_conversation_read(
        &self,
        conversation_id: &ConversationId,
        reader: &UserId,
    ) -> AppResult<u64>;

    /// Non-deleted, unread messages addressed to `reader`.
    async fn count_unread(
        &self,
        conversation_id: &ConversationId,
        reader: &UserId,
    ) -> AppResult<i64>;

    /// Set the soft-delete flag. Returns false when the message does not
    /// exist or was already deleted (a no-op, not an error).
    async fn soft_delete(&self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Return the conversation for the pair, creating it atomically when
    /// absent. Concurrent callers with the same pair observe one record.
    async fn get_or_create(&self, a: &UserId, b: &UserId) -> AppResult<Conversation>;

    async fn get_by_id(&self, id: &ConversationId) -> AppResult<Option<Conversation>>;

    /// All conversations `user` takes part in, last activity first; archived
    /// ones only when requested.
    async fn list_by_participant(
        &self,
        user: &UserId,
        include_archived: bool,
    ) -> AppResult<Vec<Conversation>>;

    /// Advance `last_message_at`/`updated_at` to `at`. Monotonic: never
    /// regresses the stored timestamp. No-op for unknown conversations.
    async fn touch_last_message(&self, id: &ConversationId, at: DateTime<Utc>) -> AppResult<()>;

    /// Returns false when the conversation does not exist.
    async fn set_archived(&self, id: &ConversationId, archived: bool) -> AppResult<bool>;
}

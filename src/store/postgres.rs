//! Postgres-backed store implementations. Soft deletion, read state and
//! archival are plain flag columns; the get-or-create race is settled by an
//! `ON CONFLICT DO NOTHING` insert followed by a re-read of the canonical row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use super::{clamp_page, ConversationStore, MessageStore};
use crate::error::AppResult;
use crate::models::{ChatMessage, Conversation, ConversationId, MessageType, UserId};

#[derive(Clone)]
pub struct PgMessageStore {
    db: Pool<Postgres>,
}

impl PgMessageStore {
    pub fn new(db: Pool<Postgres>) -> Self {
        Self { db }
    }
}

fn row_to_message(row: sqlx::postgres::PgRow) -> ChatMessage {
    let message_type: String = row.get("message_type");
    ChatMessage {
        id: row.get("id"),
        conversation_id: ConversationId::from(row.get::<String, _>("conversation_id")),
        sender_id: UserId::new(row.get::<String, _>("sender_id")),
        receiver_id: UserId::new(row.get::<String, _>("receiver_id")),
        content: row.get("content"),
        message_type: MessageType::from_str(&message_type),
        metadata: row.get("metadata"),
        is_read: row.get("is_read"),
        is_delivered: row.get("is_delivered"),
        is_deleted: row.get("is_deleted"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn upsert(&self, message: ChatMessage) -> AppResult<ChatMessage> {
        sqlx::query(
            r#"
            INSERT INTO messages
                (id, conversation_id, sender_id, receiver_id, content, message_type,
                 metadata, is_read, is_delivered, is_deleted, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO UPDATE SET
                content = EXCLUDED.content,
                message_type = EXCLUDED.message_type,
                metadata = EXCLUDED.metadata,
                is_read = EXCLUDED.is_read,
                is_delivered = EXCLUDED.is_delivered,
                is_deleted = EXCLUDED.is_deleted,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(message.id)
        .bind(message.conversation_id.as_str())
        .bind(message.sender_id.as_str())
        .bind(message.receiver_id.as_str())
        .bind(&message.content)
        .bind(message.message_type.as_str())
        .bind(&message.metadata)
        .bind(message.is_read)
        .bind(message.is_delivered)
        .bind(message.is_deleted)
        .bind(message.created_at)
        .bind(message.updated_at)
        .execute(&self.db)
        .await?;
        Ok(message)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<ChatMessage>> {
        let row = sqlx::query("SELECT * FROM messages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(row_to_message))
    }

    async fn list_by_conversation(
        &self,
        conversation_id: &ConversationId,
        skip: i64,
        take: Option<i64>,
    ) -> AppResult<Vec<ChatMessage>> {
        let take = clamp_page(take);
        let rows = sqlx::query(
            r#"
            SELECT * FROM messages
            WHERE conversation_id = $1 AND is_deleted = FALSE
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(conversation_id.as_str())
        .bind(take)
        .bind(skip.max(0))
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(row_to_message).collect())
    }

    async fn mark_conversation_read(
        &self,
        conversation_id: &ConversationId,
        reader: &UserId,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE messages SET is_read = TRUE, updated_at = NOW()
            WHERE conversation_id = $1 AND receiver_id = $2 AND is_read = FALSE
            "#,
        )
        .bind(conversation_id.as_str())
        .bind(reader.as_str())
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected())
    }

    async fn count_unread(
        &self,
        conversation_id: &ConversationId,
        reader: &UserId,
    ) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)::bigint FROM messages
            WHERE conversation_id = $1 AND receiver_id = $2
              AND is_read = FALSE AND is_deleted = FALSE
            "#,
        )
        .bind(conversation_id.as_str())
        .bind(reader.as_str())
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }

    async fn soft_delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE messages SET is_deleted = TRUE, updated_at = NOW() \
             WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct PgConversationStore {
    db: Pool<Postgres>,
}

impl PgConversationStore {
    pub fn new(db: Pool<Postgres>) -> Self {
        Self { db }
    }
}

fn row_to_conversation(row: sqlx::postgres::PgRow) -> Conversation {
    Conversation {
        id: ConversationId::from(row.get::<String, _>("id")),
        participants: [
            UserId::new(row.get::<String, _>("participant_low")),
            UserId::new(row.get::<String, _>("participant_high")),
        ],
        last_message_at: row.get("last_message_at"),
        is_archived: row.get("is_archived"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl ConversationStore for PgConversationStore {
    async fn get_or_create(&self, a: &UserId, b: &UserId) -> AppResult<Conversation> {
        let id = ConversationId::derive(a, b)?;
        let (low, high) = if a <= b { (a, b) } else { (b, a) };

        // The deterministic id doubles as the unique constraint: the losing
        // writer's insert is a no-op and both callers read the same row back.
        sqlx::query(
            r#"
            INSERT INTO conversations (id, participant_low, participant_high)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id.as_str())
        .bind(low.as_str())
        .bind(high.as_str())
        .execute(&self.db)
        .await?;

        let row = sqlx::query("SELECT * FROM conversations WHERE id = $1")
            .bind(id.as_str())
            .fetch_one(&self.db)
            .await?;
        Ok(row_to_conversation(row))
    }

    async fn get_by_id(&self, id: &ConversationId) -> AppResult<Option<Conversation>> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(row_to_conversation))
    }

    async fn list_by_participant(
        &self,
        user: &UserId,
        include_archived: bool,
    ) -> AppResult<Vec<Conversation>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM conversations
            WHERE (participant_low = $1 OR participant_high = $1)
              AND ($2 OR is_archived = FALSE)
            ORDER BY last_message_at DESC NULLS LAST, created_at DESC
            "#,
        )
        .bind(user.as_str())
        .bind(include_archived)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(row_to_conversation).collect())
    }

    async fn touch_last_message(&self, id: &ConversationId, at: DateTime<Utc>) -> AppResult<()> {
        // Guarded update keeps the timestamp monotonic under concurrent sends.
        sqlx::query(
            r#"
            UPDATE conversations SET last_message_at = $2, updated_at = $2
            WHERE id = $1 AND (last_message_at IS NULL OR last_message_at < $2)
            "#,
        )
        .bind(id.as_str())
        .bind(at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn set_archived(&self, id: &ConversationId, archived: bool) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE conversations SET is_archived = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.as_str())
        .bind(archived)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

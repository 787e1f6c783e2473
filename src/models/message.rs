use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::conversation::{ConversationId, UserId};

/// Message body tag. Only `text` and `datemark` carry behavior in the chat
/// service; the rest pass through for the clients to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
    Location,
    DateMark,
}

impl Default for MessageType {
    fn default() -> Self {
        MessageType::Text
    }
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Image => "image",
            MessageType::Location => "location",
            MessageType::DateMark => "datemark",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "image" => MessageType::Image,
            "location" => MessageType::Location,
            "datemark" => MessageType::DateMark,
            _ => MessageType::Text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub message_type: MessageType,
    /// Structured payload for datemark/location messages (a place reference).
    /// Opaque to storage.
    pub metadata: Option<serde_json::Value>,
    /// false -> true only, via mark-as-read.
    pub is_read: bool,
    /// Set at creation; there is no offline-delivery state machine.
    pub is_delivered: bool,
    /// Soft-delete flag; false -> true only. Deleted messages stay in storage
    /// but are excluded from every read path.
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(
        conversation_id: ConversationId,
        sender_id: UserId,
        receiver_id: UserId,
        content: String,
        message_type: MessageType,
        metadata: Option<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            receiver_id,
            content,
            message_type,
            metadata,
            is_read: false,
            is_delivered: true,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

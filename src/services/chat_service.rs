//! The one component with business rules. Validates and authorizes every
//! operation before touching storage, then composes results from the two
//! stores. Holds no state of its own beyond the injected handles.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ChatMessage, Conversation, ConversationId, MessageType, UserId};
use crate::services::user_directory::UserDirectory;
use crate::store::{ConversationStore, MessageStore};

/// One entry in a user's conversation list: the conversation, who the other
/// party is, the newest message, and how many messages await the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub conversation: Conversation,
    pub other_participant: UserId,
    pub last_message: Option<ChatMessage>,
    pub unread_count: i64,
}

pub struct ChatService {
    conversations: Arc<dyn ConversationStore>,
    messages: Arc<dyn MessageStore>,
    users: Arc<dyn UserDirectory>,
}

impl ChatService {
    pub fn new(
        conversations: Arc<dyn ConversationStore>,
        messages: Arc<dyn MessageStore>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            conversations,
            messages,
            users,
        }
    }

    /// Send a message from `sender` to `receiver`, creating their
    /// conversation on first contact.
    pub async fn send_message(
        &self,
        sender: &UserId,
        receiver: &UserId,
        content: &str,
        message_type: MessageType,
        metadata: Option<serde_json::Value>,
    ) -> AppResult<ChatMessage> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation(
                "message content cannot be empty".into(),
            ));
        }
        if !self.users.user_exists(receiver).await? {
            return Err(AppError::Validation(format!(
                "unknown receiver: {receiver}"
            )));
        }
        if sender == receiver {
            return Err(AppError::Validation(
                "cannot send a message to yourself".into(),
            ));
        }
        if message_type == MessageType::DateMark
            && !matches!(metadata, Some(serde_json::Value::Object(_)))
        {
            return Err(AppError::Validation(
                "datemark messages require a place payload".into(),
            ));
        }

        let conversation = self.conversations.get_or_create(sender, receiver).await?;
        let message = ChatMessage::new(
            conversation.id.clone(),
            sender.clone(),
            receiver.clone(),
            content.to_string(),
            message_type,
            metadata,
            Utc::now(),
        );
        let message = self.messages.upsert(message).await?;
        self.conversations
            .touch_last_message(&conversation.id, message.created_at)
            .await?;

        tracing::debug!(
            conversation_id = %conversation.id,
            message_id = %message.id,
            "message stored"
        );
        Ok(message)
    }

    /// Summaries of every conversation `user` takes part in, archived ones
    /// included, newest activity first.
    pub async fn list_conversations(&self, user: &UserId) -> AppResult<Vec<ConversationSummary>> {
        let conversations = self.conversations.list_by_participant(user, true).await?;
        let mut summaries = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let other = match conversation.other_participant(user) {
                Some(other) => other.clone(),
                // A record this user is not part of cannot come back from
                // list_by_participant; skip rather than fail the whole list.
                None => continue,
            };
            let last_message = self
                .messages
                .list_by_conversation(&conversation.id, 0, Some(1))
                .await?
                .into_iter()
                .next();
            let unread_count = self.messages.count_unread(&conversation.id, user).await?;
            summaries.push(ConversationSummary {
                conversation,
                other_participant: other,
                last_message,
                unread_count,
            });
        }
        Ok(summaries)
    }

    /// Page through a conversation's messages, most recent first. Unknown
    /// conversations yield an empty page; a caller who is not a participant
    /// of an existing conversation is rejected.
    pub async fn list_messages(
        &self,
        conversation_id: &ConversationId,
        caller: &UserId,
        skip: i64,
        take: Option<i64>,
    ) -> AppResult<Vec<ChatMessage>> {
        match self.conversations.get_by_id(conversation_id).await? {
            Some(conversation) => {
                if !conversation.has_participant(caller) {
                    return Err(AppError::Forbidden);
                }
                self.messages
                    .list_by_conversation(conversation_id, skip, take)
                    .await
            }
            None => Ok(Vec::new()),
        }
    }

    /// Mark every message addressed to `caller` in the conversation as read.
    /// Idempotent; a no-op for unknown conversations.
    pub async fn mark_as_read(
        &self,
        conversation_id: &ConversationId,
        caller: &UserId,
    ) -> AppResult<()> {
        match self.conversations.get_by_id(conversation_id).await? {
            Some(conversation) => {
                if !conversation.has_participant(caller) {
                    return Err(AppError::Forbidden);
                }
                let updated = self
                    .messages
                    .mark_conversation_read(conversation_id, caller)
                    .await?;
                tracing::debug!(conversation_id = %conversation_id, updated, "marked read");
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Toggle the archive flag. The flag applies to both participants.
    pub async fn archive_conversation(
        &self,
        conversation_id: &ConversationId,
        caller: &UserId,
        archived: bool,
    ) -> AppResult<()> {
        let conversation = self
            .conversations
            .get_by_id(conversation_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if !conversation.has_participant(caller) {
            return Err(AppError::Forbidden);
        }
        self.conversations
            .set_archived(conversation_id, archived)
            .await?;
        Ok(())
    }

    /// Soft-delete a message. Only the sender may delete; deleting an
    /// already-deleted message is a no-op.
    pub async fn delete_message(&self, message_id: Uuid, caller: &UserId) -> AppResult<()> {
        let message = self
            .messages
            .get_by_id(message_id)
            .await?
            .ok_or(AppError::NotFound)?;
        if &message.sender_id != caller {
            return Err(AppError::Forbidden);
        }
        self.messages.soft_delete(message_id).await?;
        Ok(())
    }
}

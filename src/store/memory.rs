//! In-memory store implementations backing the integration tests and local
//! development. Each store guards one map with a single lock, which makes
//! get-or-create and the monotonic updates trivially atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{clamp_page, ConversationStore, MessageStore};
use crate::error::AppResult;
use crate::models::{ChatMessage, Conversation, ConversationId, UserId};

#[derive(Default)]
pub struct MemoryMessageStore {
    inner: RwLock<HashMap<Uuid, ChatMessage>>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn upsert(&self, message: ChatMessage) -> AppResult<ChatMessage> {
        let mut map = self.inner.write().await;
        map.insert(message.id, message.clone());
        Ok(message)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<ChatMessage>> {
        let map = self.inner.read().await;
        Ok(map.get(&id).cloned())
    }

    async fn list_by_conversation(
        &self,
        conversation_id: &ConversationId,
        skip: i64,
        take: Option<i64>,
    ) -> AppResult<Vec<ChatMessage>> {
        let take = clamp_page(take);
        let map = self.inner.read().await;
        let mut messages: Vec<ChatMessage> = map
            .values()
            .filter(|m| &m.conversation_id == conversation_id && !m.is_deleted)
            .cloned()
            .collect();
        // created_at desc, id desc as the deterministic tiebreak
        messages.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(messages
            .into_iter()
            .skip(skip.max(0) as usize)
            .take(take as usize)
            .collect())
    }

    async fn mark_conversation_read(
        &self,
        conversation_id: &ConversationId,
        reader: &UserId,
    ) -> AppResult<u64> {
        let mut map = self.inner.write().await;
        let mut updated = 0;
        for message in map.values_mut() {
            if &message.conversation_id == conversation_id
                && &message.receiver_id == reader
                && !message.is_read
            {
                message.is_read = true;
                message.updated_at = Utc::now();
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn count_unread(
        &self,
        conversation_id: &ConversationId,
        reader: &UserId,
    ) -> AppResult<i64> {
        let map = self.inner.read().await;
        Ok(map
            .values()
            .filter(|m| {
                &m.conversation_id == conversation_id
                    && &m.receiver_id == reader
                    && !m.is_read
                    && !m.is_deleted
            })
            .count() as i64)
    }

    async fn soft_delete(&self, id: Uuid) -> AppResult<bool> {
        let mut map = self.inner.write().await;
        match map.get_mut(&id) {
            Some(message) if !message.is_deleted => {
                message.is_deleted = true;
                message.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct MemoryConversationStore {
    inner: RwLock<HashMap<ConversationId, Conversation>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn get_or_create(&self, a: &UserId, b: &UserId) -> AppResult<Conversation> {
        let id = ConversationId::derive(a, b)?;
        // Write lock held across lookup and insert keeps concurrent callers
        // from racing a second record into existence.
        let mut map = self.inner.write().await;
        if let Some(existing) = map.get(&id) {
            return Ok(existing.clone());
        }
        let conversation = Conversation::with_parts(id.clone(), a.clone(), b.clone(), Utc::now());
        map.insert(id, conversation.clone());
        Ok(conversation)
    }

    async fn get_by_id(&self, id: &ConversationId) -> AppResult<Option<Conversation>> {
        let map = self.inner.read().await;
        Ok(map.get(id).cloned())
    }

    async fn list_by_participant(
        &self,
        user: &UserId,
        include_archived: bool,
    ) -> AppResult<Vec<Conversation>> {
        let map = self.inner.read().await;
        let mut conversations: Vec<Conversation> = map
            .values()
            .filter(|c| c.has_participant(user) && (include_archived || !c.is_archived))
            .cloned()
            .collect();
        // last activity first; conversations with no messages yet sort last
        conversations.sort_by(|a, b| {
            b.last_message_at
                .cmp(&a.last_message_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(conversations)
    }

    async fn touch_last_message(&self, id: &ConversationId, at: DateTime<Utc>) -> AppResult<()> {
        let mut map = self.inner.write().await;
        if let Some(conversation) = map.get_mut(id) {
            if conversation.last_message_at.map_or(true, |cur| at > cur) {
                conversation.last_message_at = Some(at);
                conversation.updated_at = at;
            }
        }
        Ok(())
    }

    async fn set_archived(&self, id: &ConversationId, archived: bool) -> AppResult<bool> {
        let mut map = self.inner.write().await;
        match map.get_mut(id) {
            Some(conversation) => {
                conversation.is_archived = archived;
                conversation.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

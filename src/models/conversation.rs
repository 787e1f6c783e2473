use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AppError;

/// Opaque profile identifier. Profile ids are issued by the profile store and
/// are treated as plain strings here, never parsed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Deterministic, order-independent identifier for a two-party conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Derive the canonical id for a participant pair: the two ids are sorted
    /// lexicographically and composed as `conv_<lower>_<higher>`, so the
    /// result is identical regardless of argument order.
    pub fn derive(a: &UserId, b: &UserId) -> Result<Self, AppError> {
        if a.as_str().trim().is_empty() || b.as_str().trim().is_empty() {
            return Err(AppError::Validation(
                "participant id cannot be empty".into(),
            ));
        }
        if a == b {
            return Err(AppError::Validation(
                "cannot open a conversation with yourself".into(),
            ));
        }
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Ok(Self(format!("conv_{}_{}", low.as_str(), high.as_str())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ConversationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The persistent pairing of exactly two users through which messages flow.
/// Created lazily on first send, mutated on every send and on archive toggle,
/// never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    /// Stored sorted so the pair compares as a set.
    pub participants: [UserId; 2],
    /// Timestamp of the most recent send; `None` until the first message.
    pub last_message_at: Option<DateTime<Utc>>,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Build a fresh record for an already-derived id. The id must have been
    /// derived from the same pair.
    pub fn with_parts(id: ConversationId, a: UserId, b: UserId, now: DateTime<Utc>) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self {
            id,
            participants: [low, high],
            last_message_at: None,
            is_archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_participant(&self, user: &UserId) -> bool {
        self.participants.iter().any(|p| p == user)
    }

    /// The counterpart of `user` in this conversation, or `None` when `user`
    /// is not a participant.
    pub fn other_participant(&self, user: &UserId) -> Option<&UserId> {
        if !self.has_participant(user) {
            return None;
        }
        self.participants.iter().find(|p| *p != user)
    }
}

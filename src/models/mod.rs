pub mod conversation;
pub mod message;

pub use conversation::{Conversation, ConversationId, UserId};
pub use message::{ChatMessage, MessageType};

pub mod chat_service;
pub mod user_directory;

pub use chat_service::{ChatService, ConversationSummary};
pub use user_directory::{PgUserDirectory, StaticUserDirectory, UserDirectory};

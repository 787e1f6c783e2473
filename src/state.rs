use crate::{config::Config, services::chat_service::ChatService};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub config: Arc<Config>,
}

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::middleware::guards::User;
use crate::models::{ChatMessage, ConversationId};
use crate::services::chat_service::ConversationSummary;
use crate::state::AppState;

/// GET /api/v1/conversations — summaries for the caller, newest first.
pub async fn list_conversations(
    State(state): State<AppState>,
    user: User,
) -> Result<Json<Vec<ConversationSummary>>, crate::error::AppError> {
    let summaries = state.chat.list_conversations(&user.id).await?;
    Ok(Json(summaries))
}

#[derive(Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub skip: i64,
    pub take: Option<i64>,
}

/// GET /api/v1/conversations/:id/messages?skip&take
pub async fn list_messages(
    State(state): State<AppState>,
    user: User,
    Path(id): Path<String>,
    Query(page): Query<PageParams>,
) -> Result<Json<Vec<ChatMessage>>, crate::error::AppError> {
    let conversation_id = ConversationId::from(id);
    let messages = state
        .chat
        .list_messages(&conversation_id, &user.id, page.skip, page.take)
        .await?;
    Ok(Json(messages))
}

/// POST /api/v1/conversations/:id/read
pub async fn mark_as_read(
    State(state): State<AppState>,
    user: User,
    Path(id): Path<String>,
) -> Result<StatusCode, crate::error::AppError> {
    let conversation_id = ConversationId::from(id);
    state.chat.mark_as_read(&conversation_id, &user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct ArchiveRequest {
    pub archived: bool,
}

/// POST /api/v1/conversations/:id/archive
pub async fn archive_conversation(
    State(state): State<AppState>,
    user: User,
    Path(id): Path<String>,
    Json(body): Json<ArchiveRequest>,
) -> Result<StatusCode, crate::error::AppError> {
    let conversation_id = ConversationId::from(id);
    state
        .chat
        .archive_conversation(&conversation_id, &user.id, body.archived)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

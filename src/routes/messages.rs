use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::guards::User;
use crate::models::{ChatMessage, MessageType, UserId};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub receiver_id: String,
    pub content: String,
    #[serde(default)]
    pub message_type: MessageType,
    pub metadata: Option<serde_json::Value>,
}

/// POST /api/v1/messages — sender comes from the auth context.
pub async fn send_message(
    State(state): State<AppState>,
    user: User,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<ChatMessage>), crate::error::AppError> {
    let receiver = UserId::new(body.receiver_id);
    let message = state
        .chat
        .send_message(
            &user.id,
            &receiver,
            &body.content,
            body.message_type,
            body.metadata,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// DELETE /api/v1/messages/:id — sender-only soft delete.
pub async fn delete_message(
    State(state): State<AppState>,
    user: User,
    Path(message_id): Path<Uuid>,
) -> Result<StatusCode, crate::error::AppError> {
    state.chat.delete_message(message_id, &user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

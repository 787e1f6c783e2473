use crate::state::AppState;
use axum::middleware;
use axum::{
    routing::{delete, get, post},
    Router,
};

pub mod conversations;
use conversations::{archive_conversation, list_conversations, list_messages, mark_as_read};
pub mod messages;
use messages::{delete_message, send_message};

pub fn build_router(state: AppState) -> Router {
    // Service introspection endpoints (no API version prefix, no auth)
    let introspection = Router::new().route("/health", get(|| async { "OK" }));

    // API v1 endpoints (all business logic routes with /api/v1 prefix)
    let api_v1 = Router::new()
        .route("/messages", post(send_message))
        .route("/messages/:id", delete(delete_message))
        .route("/conversations", get(list_conversations))
        .route("/conversations/:id/messages", get(list_messages))
        .route("/conversations/:id/read", post(mark_as_read))
        .route("/conversations/:id/archive", post(archive_conversation))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::auth::auth_middleware,
        ));

    let router = introspection.merge(Router::new().nest("/api/v1", api_v1));

    crate::middleware::with_defaults(router).with_state(state)
}

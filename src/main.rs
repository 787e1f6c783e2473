use std::sync::Arc;

use chat_service::{
    config, db, error, logging, routes,
    services::{chat_service::ChatService, user_directory::PgUserDirectory},
    state::AppState,
    store::postgres::{PgConversationStore, PgMessageStore},
};

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    logging::init_tracing();
    let cfg = Arc::new(config::Config::from_env()?);

    // Initialize DB pool
    let pool = db::init_pool(&cfg.database_url)
        .await
        .map_err(|e| error::AppError::StartServer(format!("db: {e}")))?;

    // Run embedded migrations (idempotent). Treat failures as fatal - the
    // schema must be in sync before serving traffic.
    db::run_migrations(&pool)
        .await
        .map_err(|e| error::AppError::StartServer(format!("database migrations failed: {e}")))?;

    let conversations = Arc::new(PgConversationStore::new(pool.clone()));
    let messages = Arc::new(PgMessageStore::new(pool.clone()));
    let users = Arc::new(PgUserDirectory::new(pool));

    let chat = Arc::new(ChatService::new(conversations, messages, users));
    let state = AppState {
        chat,
        config: cfg.clone(),
    };

    let bind_addr = format!("0.0.0.0:{}", cfg.port);
    tracing::info!(%bind_addr, "starting chat-service");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| error::AppError::StartServer(e.to_string()))?;
    axum::serve(listener, routes::build_router(state))
        .await
        .map_err(|e| error::AppError::StartServer(e.to_string()))?;

    Ok(())
}

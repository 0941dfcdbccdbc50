use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod db;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod openai_client;
pub mod services;

/// Shared application state: the connection pool and the optional
/// completion-service client, injected into handlers via `Extension`.
pub struct AppState {
    pub db_pool: sqlx::SqlitePool,
    pub ai_client: Option<openai_client::OpenAiClient>,
}

/// Build the full application router around the given state.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(handlers::ui::ui_routes())
        .merge(handlers::auth::auth_routes())
        .merge(handlers::chat::chat_routes())
        .merge(handlers::feedback::feedback_routes())
        .layer(axum::middleware::from_fn(
            middleware::logging::request_logging_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}

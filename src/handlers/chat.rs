// src/handlers/chat.rs
use crate::handlers::ui::{escape_html, page, NAV};
use crate::middleware::auth::session_auth;
use crate::models::auth::CurrentUser;
use crate::models::chat::{ChatForm, ChatRecord};
use crate::openai_client::FALLBACK_RESPONSES;
use crate::AppState;
use axum::{
    extract::{Extension, Form},
    http::StatusCode,
    response::Html,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use std::sync::Arc;

pub fn chat_routes() -> Router {
    Router::new()
        .route("/chat", get(chat_page).post(chat))
        .route("/api/chat/history", get(get_chat_history))
        .layer(axum::middleware::from_fn(session_auth))
}

fn chat_view(user: &CurrentUser, exchange: Option<(&str, &str)>) -> Html<String> {
    let mut body = format!(
        "{NAV}<p>Ask Citizen AI anything, {}.</p>",
        escape_html(&user.full_name)
    );
    if let Some((question, reply)) = exchange {
        body.push_str(&format!(
            "<p><strong>You:</strong> {}</p><p><strong>Citizen AI:</strong> {}</p>",
            escape_html(question),
            escape_html(reply)
        ));
    }
    body.push_str(
        r#"<form method="post" action="/chat">
<p><textarea name="message" rows="3" cols="60" required></textarea></p>
<p><button type="submit">Send</button></p>
</form>"#,
    );
    page("Chat", &body)
}

async fn chat_page(Extension(user): Extension<CurrentUser>) -> Html<String> {
    chat_view(&user, None)
}

async fn chat(
    Extension(state): Extension<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Form(form): Form<ChatForm>,
) -> Result<Html<String>, (StatusCode, String)> {
    // Any failure of the external call collapses into the fallback reply;
    // the page never shows a raw error.
    let reply = match &state.ai_client {
        Some(client) => match client.generate_response(&form.message).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Completion call failed, using fallback: {}", e);
                format!("{} (Error: {})", FALLBACK_RESPONSES[0], e)
            }
        },
        None => format!(
            "{} (Error: completion service not configured)",
            FALLBACK_RESPONSES[0]
        ),
    };

    sqlx::query(
        "INSERT INTO chat_history (user_id, user_message, ai_response, timestamp)
         VALUES (?, ?, ?, ?)",
    )
    .bind(user.user_id)
    .bind(&form.message)
    .bind(&reply)
    .bind(Utc::now())
    .execute(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Database error saving chat: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    })?;

    Ok(chat_view(&user, Some((&form.message, &reply))))
}

/// Recent exchanges for the logged-in user, most recent first.
async fn get_chat_history(
    Extension(state): Extension<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<ChatRecord>>, (StatusCode, String)> {
    let history = sqlx::query_as::<_, ChatRecord>(
        "SELECT * FROM chat_history WHERE user_id = ? ORDER BY timestamp DESC LIMIT 10",
    )
    .bind(user.user_id)
    .fetch_all(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Database error loading chat history: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    })?;

    Ok(Json(history))
}

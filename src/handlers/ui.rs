// src/handlers/ui.rs
use crate::middleware::auth::{session_auth, session_token_from_headers};
use crate::models::auth::CurrentUser;
use crate::models::chat::ChatRecord;
use crate::services::sessions;
use crate::AppState;
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

pub fn ui_routes() -> Router {
    let protected = Router::new()
        .route("/dashboard", get(dashboard))
        .layer(axum::middleware::from_fn(session_auth));

    Router::new()
        .route("/", get(home))
        .route("/api/status", get(api_status))
        .merge(protected)
}

/// Links shown on every authenticated page.
pub(crate) const NAV: &str = r#"<nav><a href="/dashboard">Dashboard</a> <a href="/chat">Chat</a> <a href="/feedback">Feedback</a> <a href="/logout">Logout</a></nav>"#;

/// Minimal page shell shared by the server-rendered views.
pub(crate) fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html><html><head><title>{title} - Citizen AI</title>
<style>body {{ font-family: Arial; max-width: 600px; margin: 60px auto; }}
.error {{ color: #b00020; }} .success {{ color: #1b5e20; }}
nav a {{ margin-right: 1rem; }}</style>
</head><body>
<h1>{title}</h1>
{body}
</body></html>"#
    ))
}

/// Escape user-provided text before embedding it in a page.
pub(crate) fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Human-readable relative timestamp for dashboard listings.
pub(crate) fn format_relative_time(timestamp: &chrono::DateTime<chrono::Utc>) -> String {
    let now = chrono::Utc::now();
    let duration = now.signed_duration_since(*timestamp);

    if duration.num_seconds() < 60 {
        "just now".to_string()
    } else if duration.num_minutes() < 60 {
        let mins = duration.num_minutes();
        if mins == 1 {
            "1 minute ago".to_string()
        } else {
            format!("{} minutes ago", mins)
        }
    } else if duration.num_hours() < 24 {
        let hours = duration.num_hours();
        if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", hours)
        }
    } else if duration.num_days() < 30 {
        let days = duration.num_days();
        if days == 1 {
            "1 day ago".to_string()
        } else {
            format!("{} days ago", days)
        }
    } else {
        timestamp.format("%B %d, %Y").to_string()
    }
}

/// Landing page; authenticated visitors go straight to the dashboard.
async fn home(headers: HeaderMap, Extension(state): Extension<Arc<AppState>>) -> Response {
    if let Some(token) = session_token_from_headers(&headers) {
        if let Ok(Some(_user)) = sessions::verify(&state.db_pool, &token).await {
            return Redirect::to("/dashboard").into_response();
        }
    }

    page(
        "Welcome",
        r#"<p>Citizen AI answers questions about government schemes and services, and listens to your feedback.</p>
<p><a href="/login">Login</a> or <a href="/register">Register</a></p>"#,
    )
    .into_response()
}

async fn dashboard(
    Extension(state): Extension<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Html<String>, (StatusCode, String)> {
    let history = sqlx::query_as::<_, ChatRecord>(
        "SELECT * FROM chat_history WHERE user_id = ? ORDER BY timestamp DESC LIMIT 5",
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

    let mut body = format!(
        "{NAV}<p>Hello, {}.</p><h2>Recent conversations</h2>",
        escape_html(&user.full_name)
    );
    if history.is_empty() {
        body.push_str(r#"<p>No conversations yet. <a href="/chat">Start one</a>.</p>"#);
    } else {
        body.push_str("<ul>");
        for record in &history {
            body.push_str(&format!(
                "<li><strong>You:</strong> {}<br><strong>Citizen AI:</strong> {}<br><small>{}</small></li>",
                escape_html(&record.user_message),
                escape_html(&record.ai_response),
                format_relative_time(&record.timestamp),
            ));
        }
        body.push_str("</ul>");
    }

    Ok(page("Dashboard", &body))
}

/// Health probe: storage reachability plus completion-service configuration.
async fn api_status(Extension(state): Extension<Arc<AppState>>) -> Json<serde_json::Value> {
    use serde_json::json;

    let db_status = match sqlx::query("SELECT 1").fetch_one(&state.db_pool).await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };
    let ai_status = if state.ai_client.is_some() {
        "configured"
    } else {
        "not_configured"
    };

    Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "database": db_status,
            "completion_service": ai_status,
        }
    }))
}

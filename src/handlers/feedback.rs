// src/handlers/feedback.rs
use crate::handlers::ui::{escape_html, page, NAV};
use crate::middleware::auth::session_auth;
use crate::models::auth::CurrentUser;
use crate::models::feedback::{FeedbackForm, SentimentLabel};
use crate::services::sentiment;
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

pub fn feedback_routes() -> Router {
    Router::new()
        .route("/feedback", get(feedback_page).post(feedback))
        .route("/api/feedback/stats", get(get_sentiment_stats))
        .layer(axum::middleware::from_fn(session_auth))
}

fn feedback_view(user: &CurrentUser, result: Option<SentimentLabel>) -> Html<String> {
    let mut body = format!(
        "{NAV}<p>Tell us about your experience, {}.</p>",
        escape_html(&user.full_name)
    );
    if let Some(label) = result {
        body.push_str(&format!(
            r#"<p class="success">Thank you! Recorded sentiment: {label}</p>"#
        ));
    }
    body.push_str(
        r#"<form method="post" action="/feedback">
<p><textarea name="feedback" rows="3" cols="60" required></textarea></p>
<p><button type="submit">Submit feedback</button></p>
</form>"#,
    );
    page("Feedback", &body)
}

async fn feedback_page(Extension(user): Extension<CurrentUser>) -> Html<String> {
    feedback_view(&user, None)
}

async fn feedback(
    Extension(state): Extension<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Form(form): Form<FeedbackForm>,
) -> Result<Html<String>, (StatusCode, String)> {
    let (label, confidence) = sentiment::analyse(&form.feedback);

    sqlx::query(
        "INSERT INTO sentiment_analysis (user_id, feedback_text, sentiment, confidence, timestamp)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(user.user_id)
    .bind(&form.feedback)
    .bind(label.as_str())
    .bind(confidence)
    .bind(Utc::now())
    .execute(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Database error saving feedback: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    })?;

    tracing::info!(
        user_id = user.user_id,
        sentiment = label.as_str(),
        confidence,
        "feedback recorded"
    );

    Ok(feedback_view(&user, Some(label)))
}

/// Feedback counts grouped by sentiment label.
async fn get_sentiment_stats(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT sentiment, COUNT(*) FROM sentiment_analysis GROUP BY sentiment",
    )
    .fetch_all(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Database error loading sentiment stats: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    })?;

    let stats: serde_json::Map<String, serde_json::Value> = rows
        .into_iter()
        .map(|(sentiment, count)| (sentiment, serde_json::Value::from(count)))
        .collect();

    Ok(Json(serde_json::Value::Object(stats)))
}

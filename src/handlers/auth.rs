// src/handlers/auth.rs
use crate::handlers::ui::{escape_html, page};
use crate::middleware::auth::SESSION_COOKIE;
use crate::models::auth::{LoginForm, RegisterForm};
use crate::services::accounts::{self, AccountError};
use crate::services::sessions::SESSION_TTL_DAYS;
use crate::AppState;
use axum::{
    extract::{Extension, Form, Query},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn auth_routes() -> Router {
    Router::new()
        .route("/register", get(register_page).post(register))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
}

fn register_form(error: Option<&str>) -> Html<String> {
    let error_html = error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape_html(e)))
        .unwrap_or_default();
    page(
        "Register",
        &format!(
            r#"{error_html}<form method="post" action="/register">
<p><input name="username" placeholder="Username" required></p>
<p><input name="email" type="email" placeholder="Email" required></p>
<p><input name="password" type="password" placeholder="Password" required></p>
<p><input name="full_name" placeholder="Full name" required></p>
<p><button type="submit">Register</button></p>
</form>
<p>Already registered? <a href="/login">Login</a></p>"#
        ),
    )
}

fn login_form(message: Option<&str>, error: Option<&str>) -> Html<String> {
    let message_html = message
        .map(|m| format!(r#"<p class="success">{}</p>"#, escape_html(m)))
        .unwrap_or_default();
    let error_html = error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape_html(e)))
        .unwrap_or_default();
    page(
        "Login",
        &format!(
            r#"{message_html}{error_html}<form method="post" action="/login">
<p><input name="username" placeholder="Username or email" required></p>
<p><input name="password" type="password" placeholder="Password" required></p>
<p><button type="submit">Login</button></p>
</form>
<p>New here? <a href="/register">Register</a></p>"#
        ),
    )
}

async fn register_page() -> Html<String> {
    register_form(None)
}

async fn register(
    Extension(state): Extension<Arc<AppState>>,
    Form(form): Form<RegisterForm>,
) -> Response {
    match accounts::register_user(&state.db_pool, &form).await {
        Ok(user_id) => {
            tracing::info!(user_id, username = %form.username, "new user registered");
            Redirect::to("/login?message=Registered").into_response()
        }
        Err(AccountError::Database(e)) => {
            tracing::error!("Database error during registration: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
        // Validation and conflict errors render inline on the form
        Err(e) => register_form(Some(&e.to_string())).into_response(),
    }
}

#[derive(Deserialize)]
struct LoginPageQuery {
    message: Option<String>,
}

async fn login_page(Query(query): Query<LoginPageQuery>) -> Html<String> {
    login_form(query.message.as_deref(), None)
}

async fn login(
    Extension(state): Extension<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Response {
    match accounts::login_user(&state.db_pool, &form.username, &form.password).await {
        Ok(session) => {
            let cookie = format!(
                "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
                SESSION_COOKIE,
                session.session_token,
                chrono::Duration::days(SESSION_TTL_DAYS).num_seconds(),
            );
            ([(header::SET_COOKIE, cookie)], Redirect::to("/dashboard")).into_response()
        }
        Err(AccountError::Database(e)) => {
            tracing::error!("Database error during login: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
        // Never reveal whether the identifier or the password was wrong
        Err(e) => login_form(None, Some(&e.to_string())).into_response(),
    }
}

async fn logout() -> impl IntoResponse {
    // Clears the client cookie only; the stored session row stays active
    // until its natural expiry.
    let cookie = format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE);
    ([(header::SET_COOKIE, cookie)], Redirect::to("/"))
}

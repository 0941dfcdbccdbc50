use crate::services::sessions;
use crate::AppState;
use axum::{
    extract::{Extension, Request},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

/// Name of the HTTP-only cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session_token";

/// Pull the session token out of a Cookie header, if present.
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie_header.split(';').find_map(|part| {
        part.trim()
            .strip_prefix(SESSION_COOKIE)
            .and_then(|rest| rest.strip_prefix('='))
            .map(|token| token.to_string())
    })
}

/// Middleware guarding the authenticated pages. Resolves the session cookie,
/// stashes the `CurrentUser` in request extensions, and redirects anonymous
/// or expired sessions to the login form.
pub async fn session_auth(
    Extension(state): Extension<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = match session_token_from_headers(request.headers()) {
        Some(token) => token,
        None => return Err(Redirect::to("/login").into_response()),
    };

    let user = match sessions::verify(&state.db_pool, &token).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(Redirect::to("/login").into_response()),
        Err(e) => {
            tracing::error!("Database error verifying session: {}", e);
            return Err(
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response(),
            );
        }
    };

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

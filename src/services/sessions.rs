//! Session manager: opaque bearer tokens stored in the sessions table.

use crate::models::auth::CurrentUser;
use base64::prelude::*;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sqlx::SqlitePool;

pub const SESSION_TTL_DAYS: i64 = 7;
const TOKEN_BYTES: usize = 32;

/// URL-safe random token with 32 bytes of entropy.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

/// Store a fresh session for the user and return its token. A user may hold
/// any number of concurrent sessions.
pub async fn issue(pool: &SqlitePool, user_id: i64) -> Result<String, sqlx::Error> {
    let token = generate_token();
    let now = Utc::now();
    let expires_at = now + Duration::days(SESSION_TTL_DAYS);

    sqlx::query(
        "INSERT INTO sessions (user_id, session_token, created_at, expires_at)
         VALUES (?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(&token)
    .bind(now)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(token)
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    user_id: i64,
    username: String,
    full_name: String,
    expires_at: DateTime<Utc>,
}

/// Resolve a token to its user. Unknown tokens, inactive sessions, inactive
/// users, and expired sessions all resolve to `None`. Expiry is checked here
/// at verification time; nothing sweeps expired rows.
pub async fn verify(pool: &SqlitePool, token: &str) -> Result<Option<CurrentUser>, sqlx::Error> {
    let row = sqlx::query_as::<_, SessionRow>(
        "SELECT s.user_id, u.username, u.full_name, s.expires_at
         FROM sessions s JOIN users u ON s.user_id = u.id
         WHERE s.session_token = ? AND s.is_active = 1 AND u.is_active = 1",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(row
        .filter(|session| session.expires_at > Utc::now())
        .map(|session| CurrentUser {
            user_id: session.user_id,
            username: session.username,
            full_name: session.full_name,
        }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_url_safe_and_unique() {
        let a = generate_token();
        let b = generate_token();
        // 32 bytes, base64 without padding
        assert_eq!(a.len(), 43);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(a, b);
    }
}

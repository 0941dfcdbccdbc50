use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Authenticated identity resolved from a session cookie. Inserted into
/// request extensions by the auth middleware.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CurrentUser {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
}

/// Result of a successful login: the freshly issued session token plus the
/// identity fields the pages need.
#[derive(Debug, Serialize)]
pub struct LoginSession {
    pub session_token: String,
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
}

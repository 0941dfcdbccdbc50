//! Credential store: user registration, password hashing, login.

use crate::models::auth::{LoginSession, RegisterForm, User};
use crate::services::sessions;
use chrono::Utc;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use sqlx::SqlitePool;
use thiserror::Error;

const PBKDF2_ITERATIONS: u32 = 100_000;
const SALT_BYTES: usize = 16;
const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Password must be at least 8 characters")]
    PasswordTooShort,
    #[error("Username exists")]
    UsernameTaken,
    #[error("Email exists")]
    EmailTaken,
    #[error("Registration failed")]
    RegistrationFailed,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Derive the stored digest for a password and hex-encoded salt. The salt
/// string's bytes (not the decoded bytes) feed PBKDF2.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut derived = [0u8; 32];
    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        salt.as_bytes(),
        PBKDF2_ITERATIONS,
        &mut derived,
    );
    hex::encode(derived)
}

fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Create a new user. Uniqueness of username and email is enforced by the
/// store's UNIQUE constraints; concurrent registrations race there and the
/// loser gets a conflict error.
pub async fn register_user(pool: &SqlitePool, form: &RegisterForm) -> Result<i64, AccountError> {
    if form.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AccountError::PasswordTooShort);
    }

    let salt = generate_salt();
    let password_hash = hash_password(&form.password, &salt);

    let result = sqlx::query(
        "INSERT INTO users (username, email, password_hash, salt, full_name, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&form.username)
    .bind(&form.email)
    .bind(&password_hash)
    .bind(&salt)
    .bind(&form.full_name)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(map_registration_error)?;

    Ok(result.last_insert_rowid())
}

fn map_registration_error(e: sqlx::Error) -> AccountError {
    if let sqlx::Error::Database(db_err) = &e {
        if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation) {
            let message = db_err.message();
            if message.contains("users.username") {
                return AccountError::UsernameTaken;
            }
            if message.contains("users.email") {
                return AccountError::EmailTaken;
            }
            return AccountError::RegistrationFailed;
        }
    }
    AccountError::Database(e)
}

/// Authenticate by username or email. Missing user, inactive user, and hash
/// mismatch are indistinguishable to the caller. Success issues a fresh
/// session and updates `last_login`.
pub async fn login_user(
    pool: &SqlitePool,
    identifier: &str,
    password: &str,
) -> Result<LoginSession, AccountError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ? OR email = ?")
        .bind(identifier)
        .bind(identifier)
        .fetch_optional(pool)
        .await?;

    let user = match user {
        Some(user) if user.is_active => user,
        _ => return Err(AccountError::InvalidCredentials),
    };

    let input_hash = hash_password(password, &user.salt);
    if input_hash != user.password_hash {
        return Err(AccountError::InvalidCredentials);
    }

    let session_token = sessions::issue(pool, user.id).await?;

    sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(user.id)
        .execute(pool)
        .await?;

    tracing::info!(user_id = user.id, username = %user.username, "user logged in");

    Ok(LoginSession {
        session_token,
        user_id: user.id,
        username: user.username,
        full_name: user.full_name,
    })
}

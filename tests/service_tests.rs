//! Service-level tests for the credential store and session manager,
//! running against in-memory SQLite databases.

use chrono::{Duration, Utc};
use citizen_ai::models::auth::RegisterForm;
use citizen_ai::services::accounts::{self, AccountError};
use citizen_ai::services::sessions;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicU32, Ordering};

/// Counter for unique test database URIs
static TEST_DB_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Each test gets its own in-memory database with migrations applied.
async fn setup_test_db() -> SqlitePool {
    let db_num = TEST_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let db_url = format!("sqlite:file:svc_testdb{}?mode=memory&cache=shared", db_num);

    let pool = SqlitePool::connect(&db_url).await.unwrap();
    sqlx::migrate!().run(&pool).await.unwrap();

    pool
}

fn alice() -> RegisterForm {
    RegisterForm {
        username: "alice".to_string(),
        email: "alice@x.com".to_string(),
        password: "password123".to_string(),
        full_name: "Alice A".to_string(),
    }
}

#[tokio::test]
async fn register_rejects_short_password() {
    let pool = setup_test_db().await;

    let form = RegisterForm {
        password: "short12".to_string(), // 7 chars
        ..alice()
    };
    let result = accounts::register_user(&pool, &form).await;
    assert!(matches!(result, Err(AccountError::PasswordTooShort)));

    // Nothing was written
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 0);
}

#[tokio::test]
async fn register_rejects_duplicate_username() {
    let pool = setup_test_db().await;

    accounts::register_user(&pool, &alice()).await.unwrap();

    let form = RegisterForm {
        email: "other@x.com".to_string(),
        ..alice()
    };
    let result = accounts::register_user(&pool, &form).await;
    assert!(matches!(result, Err(AccountError::UsernameTaken)));
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let pool = setup_test_db().await;

    accounts::register_user(&pool, &alice()).await.unwrap();

    let form = RegisterForm {
        username: "alice2".to_string(),
        ..alice()
    };
    let result = accounts::register_user(&pool, &form).await;
    assert!(matches!(result, Err(AccountError::EmailTaken)));
}

#[tokio::test]
async fn login_accepts_username_or_email() {
    let pool = setup_test_db().await;
    let user_id = accounts::register_user(&pool, &alice()).await.unwrap();

    let by_username = accounts::login_user(&pool, "alice", "password123")
        .await
        .unwrap();
    assert_eq!(by_username.user_id, user_id);
    assert_eq!(by_username.username, "alice");
    assert_eq!(by_username.full_name, "Alice A");

    let by_email = accounts::login_user(&pool, "alice@x.com", "password123")
        .await
        .unwrap();
    assert_eq!(by_email.user_id, user_id);

    // Two logins leave two concurrent valid sessions
    let first = sessions::verify(&pool, &by_username.session_token)
        .await
        .unwrap();
    let second = sessions::verify(&pool, &by_email.session_token)
        .await
        .unwrap();
    assert_eq!(first.unwrap().user_id, user_id);
    assert_eq!(second.unwrap().user_id, user_id);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let pool = setup_test_db().await;
    accounts::register_user(&pool, &alice()).await.unwrap();

    let wrong_password = accounts::login_user(&pool, "alice", "password124").await;
    assert!(matches!(
        wrong_password,
        Err(AccountError::InvalidCredentials)
    ));

    let unknown_user = accounts::login_user(&pool, "bob", "password123").await;
    assert!(matches!(unknown_user, Err(AccountError::InvalidCredentials)));
}

#[tokio::test]
async fn login_rejects_deactivated_user() {
    let pool = setup_test_db().await;
    accounts::register_user(&pool, &alice()).await.unwrap();

    sqlx::query("UPDATE users SET is_active = 0 WHERE username = 'alice'")
        .execute(&pool)
        .await
        .unwrap();

    let result = accounts::login_user(&pool, "alice", "password123").await;
    assert!(matches!(result, Err(AccountError::InvalidCredentials)));
}

#[tokio::test]
async fn login_updates_last_login() {
    let pool = setup_test_db().await;
    accounts::register_user(&pool, &alice()).await.unwrap();

    let before: (Option<String>,) = sqlx::query_as("SELECT last_login FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(before.0.is_none());

    accounts::login_user(&pool, "alice", "password123")
        .await
        .unwrap();

    let after: (Option<String>,) = sqlx::query_as("SELECT last_login FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(after.0.is_some());
}

#[tokio::test]
async fn passwords_are_not_stored_in_plaintext() {
    let pool = setup_test_db().await;
    accounts::register_user(&pool, &alice()).await.unwrap();

    let (hash, salt): (String, String) = sqlx::query_as("SELECT password_hash, salt FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_ne!(hash, "password123");
    assert!(!hash.contains("password123"));
    assert_eq!(salt.len(), 32); // 16 random bytes, hex-encoded
    assert_eq!(hash, accounts::hash_password("password123", &salt));
}

#[tokio::test]
async fn issued_session_verifies_to_same_user() {
    let pool = setup_test_db().await;
    let user_id = accounts::register_user(&pool, &alice()).await.unwrap();

    let token = sessions::issue(&pool, user_id).await.unwrap();
    let user = sessions::verify(&pool, &token).await.unwrap().unwrap();

    assert_eq!(user.user_id, user_id);
    assert_eq!(user.username, "alice");
    assert_eq!(user.full_name, "Alice A");
}

#[tokio::test]
async fn verify_rejects_unknown_token() {
    let pool = setup_test_db().await;
    accounts::register_user(&pool, &alice()).await.unwrap();

    let result = sessions::verify(&pool, "not-a-real-token").await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn verify_rejects_expired_session() {
    let pool = setup_test_db().await;
    let user_id = accounts::register_user(&pool, &alice()).await.unwrap();
    let token = sessions::issue(&pool, user_id).await.unwrap();

    sqlx::query("UPDATE sessions SET expires_at = ? WHERE session_token = ?")
        .bind(Utc::now() - Duration::days(1))
        .bind(&token)
        .execute(&pool)
        .await
        .unwrap();

    let result = sessions::verify(&pool, &token).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn verify_rejects_session_of_deactivated_user() {
    let pool = setup_test_db().await;
    let user_id = accounts::register_user(&pool, &alice()).await.unwrap();
    let token = sessions::issue(&pool, user_id).await.unwrap();

    sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
        .bind(user_id)
        .execute(&pool)
        .await
        .unwrap();

    let result = sessions::verify(&pool, &token).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn session_expiry_is_seven_days_out() {
    let pool = setup_test_db().await;
    let user_id = accounts::register_user(&pool, &alice()).await.unwrap();
    let token = sessions::issue(&pool, user_id).await.unwrap();

    let (expires_at,): (chrono::DateTime<Utc>,) =
        sqlx::query_as("SELECT expires_at FROM sessions WHERE session_token = ?")
            .bind(&token)
            .fetch_one(&pool)
            .await
            .unwrap();

    let expected = Utc::now() + Duration::days(7);
    let drift = (expires_at - expected).num_seconds().abs();
    assert!(drift < 60, "expiry drifted {drift}s from the 7-day window");
}

// src/models/chat.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One stored chat exchange. Rows are immutable once written.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct ChatRecord {
    pub id: i64,
    pub user_id: i64,
    pub user_message: String,
    pub ai_response: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    pub message: String,
}

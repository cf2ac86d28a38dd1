//! User notifications

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: i32,
    pub user_id: i32,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Message queued by a workflow, written once its transaction committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub user_id: i32,
    pub message: String,
}

impl Notice {
    pub fn new(user_id: i32, message: impl Into<String>) -> Self {
        Self {
            user_id,
            message: message.into(),
        }
    }
}

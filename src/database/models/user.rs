use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub tos_accepted_at: Option<DateTime<Utc>>,
    pub tos_version_accepted: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn needs_tos_update(&self, current_version: &str) -> bool {
        self.tos_version_accepted.as_deref() != Some(current_version)
    }
}

/// Fields required to insert a new account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub tos_version: String,
}

/// Profile fields to change; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub email: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none()
    }
}

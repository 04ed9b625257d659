//! Storage models for users.

use crate::types::UserId;
use chrono::{DateTime, Utc};

/// Storage request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    /// Trimmed, lower-cased email
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

/// Stored user row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

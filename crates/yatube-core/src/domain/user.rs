use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered author. Posts, comments and follows all hang off a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID and join timestamp.
    pub fn new(username: impl Into<String>, email: impl Into<String>, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            password_hash,
            date_joined: Utc::now(),
        }
    }
}

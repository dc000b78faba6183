use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reply to a post. Author and parent post are fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created: DateTime<Utc>,
}

impl Comment {
    pub fn new(post_id: Uuid, author_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            author_id,
            text: text.into(),
            created: Utc::now(),
        }
    }
}

/// A comment with its author's username resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentItem {
    pub comment: Comment,
    pub author: String,
}

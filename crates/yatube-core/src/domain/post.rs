use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Group;

/// Post entity - a single authored text entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
    pub text: String,
    /// Reference to an uploaded image, e.g. `posts/small.gif`.
    pub image: Option<String>,
    pub pub_date: DateTime<Utc>,
}

impl Post {
    /// Create a new post stamped with the current time.
    pub fn new(author_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            group_id: None,
            text: text.into(),
            image: None,
            pub_date: Utc::now(),
        }
    }

    pub fn in_group(mut self, group_id: Uuid) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }
}

/// A post together with what a feed page shows next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub post: Post,
    pub author: String,
    pub group: Option<Group>,
}

//! Data Transfer Objects - the rendered pages and submitted forms.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Field name to error messages, empty when the form is valid.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupView {
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// A post as shown in a feed or on its own page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostView {
    pub id: Uuid,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author: String,
    pub group: Option<GroupView>,
    pub image: Option<String>,
}

/// One page of posts plus the navigation around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageView {
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub has_previous: bool,
    pub has_next: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_page_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_number: Option<u64>,
    pub posts: Vec<PostView>,
}

/// Index and follow feeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedView {
    pub title: String,
    pub page_obj: PageView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupPageView {
    pub group: GroupView,
    pub page_obj: PageView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileView {
    pub author: String,
    pub post_count: u64,
    pub following: bool,
    pub page_obj: PageView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: Uuid,
    pub author: String,
    pub text: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetailView {
    pub post: PostView,
    pub author_post_count: u64,
    pub comments: Vec<CommentView>,
    /// Only offered to signed-in viewers.
    pub can_comment: bool,
    pub can_edit: bool,
}

/// A group the post form lets the author pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupChoice {
    pub id: Uuid,
    pub title: String,
}

/// Create/edit post form, either blank, bound to a post, or bound to a
/// rejected submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostFormView {
    pub is_edit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<Uuid>,
    pub text: String,
    pub group: String,
    pub image: String,
    pub groups: Vec<GroupChoice>,
    pub errors: FieldErrors,
}

/// Signup form submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login form submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

/// Signup or login form re-rendered after a rejected submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthFormView {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    pub errors: FieldErrors,
}

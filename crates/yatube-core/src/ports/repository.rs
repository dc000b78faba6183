use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Comment, Follow, Group, Post, User};
use crate::error::RepoError;
use crate::feed::FeedFilter;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Store a new entity.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity. Fails with `NotFound` if it is gone.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID, applying the relation's cascade rules.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError>;
}

#[async_trait]
pub trait GroupRepository: BaseRepository<Group, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Group>, RepoError>;

    /// Every group, ordered by title.
    async fn list(&self) -> Result<Vec<Group>, RepoError>;
}

/// Post repository. Feeds are always ordered newest first.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    async fn count_feed(&self, filter: &FeedFilter) -> Result<u64, RepoError>;

    async fn fetch_feed(
        &self,
        filter: &FeedFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError>;
}

#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments on a post, oldest first.
    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError>;
}

#[async_trait]
pub trait FollowRepository: BaseRepository<Follow, Uuid> {
    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError>;

    /// Remove the `user_id -> author_id` edge if present. Returns rows removed.
    async fn delete_pair(&self, user_id: Uuid, author_id: Uuid) -> Result<u64, RepoError>;
}

/// The full set of repositories a request handler can reach.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub follows: Arc<dyn FollowRepository>,
}

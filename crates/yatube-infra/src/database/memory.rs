//! In-memory store - storage when no database is configured, and the test
//! backend for everything above the repository ports.
//!
//! One store implements every repository so that relation rules hold across
//! tables the same way the SQL schema enforces them: unique usernames, slugs
//! and follow pairs, foreign keys on insert, `CASCADE` and `SET NULL` on
//! delete.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use yatube_core::domain::{Comment, Follow, Group, Post, User};
use yatube_core::error::RepoError;
use yatube_core::feed::{FeedFilter, newest_first};
use yatube_core::ports::{
    BaseRepository, CommentRepository, FollowRepository, GroupRepository, PostRepository,
    Repositories, UserRepository,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    groups: HashMap<Uuid, Group>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
    follows: HashMap<Uuid, Follow>,
}

impl Tables {
    fn check_post_refs(&self, post: &Post) -> Result<(), RepoError> {
        if !self.users.contains_key(&post.author_id) {
            return Err(RepoError::Constraint("posts.author_id".into()));
        }
        if let Some(group_id) = post.group_id {
            if !self.groups.contains_key(&group_id) {
                return Err(RepoError::Constraint("posts.group_id".into()));
            }
        }
        Ok(())
    }

    fn feed(&self, filter: &FeedFilter) -> Vec<&Post> {
        let followed: Vec<Uuid> = match filter {
            FeedFilter::FollowedBy(user_id) => self
                .follows
                .values()
                .filter(|f| f.user_id == *user_id)
                .map(|f| f.author_id)
                .collect(),
            _ => Vec::new(),
        };

        let mut posts: Vec<&Post> = self
            .posts
            .values()
            .filter(|p| filter.matches(p, &followed))
            .collect();
        posts.sort_by(|a, b| newest_first(a, b));
        posts
    }

    fn remove_post(&mut self, post_id: Uuid) -> bool {
        let removed = self.posts.remove(&post_id).is_some();
        if removed {
            self.comments.retain(|_, c| c.post_id != post_id);
        }
        removed
    }
}

/// Shared in-memory tables behind every repository port.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The repository bundle, all backed by this store.
    pub fn repositories(&self) -> Repositories {
        let store = Arc::new(self.clone());
        Repositories {
            users: store.clone(),
            groups: store.clone(),
            posts: store.clone(),
            comments: store.clone(),
            follows: store,
        }
    }

    pub async fn follow_count(&self) -> usize {
        self.tables.read().await.follows.len()
    }

    pub async fn post_count(&self) -> usize {
        self.tables.read().await.posts.len()
    }

    pub async fn comment_count(&self) -> usize {
        self.tables.read().await.comments.len()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.id) {
            return Err(RepoError::Constraint("users.id".into()));
        }
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(RepoError::Constraint("users.username".into()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user.id) {
            return Err(RepoError::NotFound);
        }
        if tables
            .users
            .values()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(RepoError::Constraint("users.username".into()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }

        let authored: Vec<Uuid> = tables
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in authored {
            tables.remove_post(post_id);
        }
        tables.comments.retain(|_, c| c.author_id != id);
        tables
            .follows
            .retain(|_, f| f.user_id != id && f.author_id != id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BaseRepository<Group, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, RepoError> {
        Ok(self.tables.read().await.groups.get(&id).cloned())
    }

    async fn insert(&self, group: Group) -> Result<Group, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.groups.contains_key(&group.id) {
            return Err(RepoError::Constraint("groups.id".into()));
        }
        if tables.groups.values().any(|g| g.slug == group.slug) {
            return Err(RepoError::Constraint("groups.slug".into()));
        }
        tables.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn update(&self, group: Group) -> Result<Group, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.groups.contains_key(&group.id) {
            return Err(RepoError::NotFound);
        }
        if tables
            .groups
            .values()
            .any(|g| g.id != group.id && g.slug == group.slug)
        {
            return Err(RepoError::Constraint("groups.slug".into()));
        }
        tables.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.groups.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        for post in tables.posts.values_mut() {
            if post.group_id == Some(id) {
                post.group_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl GroupRepository for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.groups.values().find(|g| g.slug == slug).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Group>, RepoError> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.groups.get(id))
            .cloned()
            .collect())
    }

    async fn list(&self) -> Result<Vec<Group>, RepoError> {
        let tables = self.tables.read().await;
        let mut groups: Vec<Group> = tables.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.posts.contains_key(&post.id) {
            return Err(RepoError::Constraint("posts.id".into()));
        }
        tables.check_post_refs(&post)?;
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post.id) {
            return Err(RepoError::NotFound);
        }
        tables.check_post_refs(&post)?;
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.remove_post(id) {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn count_feed(&self, filter: &FeedFilter) -> Result<u64, RepoError> {
        Ok(self.tables.read().await.feed(filter).len() as u64)
    }

    async fn fetch_feed(
        &self,
        filter: &FeedFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .feed(filter)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn insert(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.comments.contains_key(&comment.id) {
            return Err(RepoError::Constraint("comments.id".into()));
        }
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(RepoError::Constraint("comments.post_id".into()));
        }
        if !tables.users.contains_key(&comment.author_id) {
            return Err(RepoError::Constraint("comments.author_id".into()));
        }
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn update(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        match tables.comments.get_mut(&comment.id) {
            Some(existing) => {
                *existing = comment.clone();
                Ok(comment)
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables
            .comments
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        Ok(comments)
    }
}

#[async_trait]
impl BaseRepository<Follow, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Follow>, RepoError> {
        Ok(self.tables.read().await.follows.get(&id).cloned())
    }

    async fn insert(&self, follow: Follow) -> Result<Follow, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.follows.contains_key(&follow.id) {
            return Err(RepoError::Constraint("follows.id".into()));
        }
        if !tables.users.contains_key(&follow.user_id)
            || !tables.users.contains_key(&follow.author_id)
        {
            return Err(RepoError::Constraint("follows.user_id/author_id".into()));
        }
        if tables
            .follows
            .values()
            .any(|f| f.user_id == follow.user_id && f.author_id == follow.author_id)
        {
            return Err(RepoError::Constraint("follows (user_id, author_id)".into()));
        }
        tables.follows.insert(follow.id, follow.clone());
        Ok(follow)
    }

    async fn update(&self, follow: Follow) -> Result<Follow, RepoError> {
        let mut tables = self.tables.write().await;
        match tables.follows.get_mut(&follow.id) {
            Some(existing) => {
                *existing = follow.clone();
                Ok(follow)
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables
            .follows
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl FollowRepository for InMemoryStore {
    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .values()
            .any(|f| f.user_id == user_id && f.author_id == author_id))
    }

    async fn delete_pair(&self, user_id: Uuid, author_id: Uuid) -> Result<u64, RepoError> {
        let mut tables = self.tables.write().await;
        let before = tables.follows.len();
        tables
            .follows
            .retain(|_, f| !(f.user_id == user_id && f.author_id == author_id));
        Ok((before - tables.follows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{TimeDelta, Utc};
    use yatube_core::FeedBuilder;
    use yatube_core::error::DomainError;

    struct Fixture {
        store: InMemoryStore,
        repos: Repositories,
        feeds: FeedBuilder,
    }

    fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let repos = store.repositories();
        let feeds = FeedBuilder::new(repos.clone());
        Fixture {
            store,
            repos,
            feeds,
        }
    }

    impl Fixture {
        async fn user(&self, username: &str) -> User {
            let user = User::new(username, format!("{username}@example.com"), "hash".into());
            self.repos.users.insert(user).await.unwrap()
        }

        async fn group(&self, title: &str, slug: &str) -> Group {
            let group = Group::new(title, Some(slug), "description").unwrap();
            self.repos.groups.insert(group).await.unwrap()
        }

        /// Posts `count` entries one minute apart, newest last.
        async fn posts(&self, author: &User, group: Option<&Group>, count: usize) -> Vec<Post> {
            let start = Utc::now() - TimeDelta::hours(1);
            let mut created = Vec::new();
            for i in 0..count {
                let mut post = Post::new(author.id, format!("Текст {i}"));
                post.pub_date = start + TimeDelta::minutes(i as i64);
                post.group_id = group.map(|g| g.id);
                created.push(self.repos.posts.insert(post).await.unwrap());
            }
            created
        }
    }

    #[tokio::test]
    async fn test_index_pages_newest_first() {
        let fx = fixture();
        let author = fx.user("auth").await;
        let posts = fx.posts(&author, None, 13).await;

        let first = fx.feeds.index(None).await.unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(first.count, 13);
        assert_eq!(first.items[0].post.id, posts[12].id);
        assert_eq!(first.items[0].author, "auth");

        let second = fx.feeds.index(Some("2")).await.unwrap();
        assert_eq!(second.len(), 3);
        assert_eq!(second.items[2].post.id, posts[0].id);

        let beyond = fx.feeds.index(Some("7")).await.unwrap();
        assert_eq!(beyond.number, 2);
        assert_eq!(beyond.items, second.items);
    }

    #[tokio::test]
    async fn test_index_page_number_resolves_against_feed_size() {
        let fx = fixture();
        let author = fx.user("auth").await;
        fx.posts(&author, None, 13).await;

        assert_eq!(fx.feeds.index_page_number(None).await.unwrap(), 1);
        assert_eq!(fx.feeds.index_page_number(Some("junk")).await.unwrap(), 1);
        assert_eq!(fx.feeds.index_page_number(Some("2")).await.unwrap(), 2);
        assert_eq!(fx.feeds.index_page_number(Some("500")).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_empty_index_has_empty_first_page() {
        let fx = fixture();
        let page = fx.feeds.index(Some("1")).await.unwrap();
        assert!(page.is_empty());
        assert_eq!(page.num_pages, 1);
    }

    #[tokio::test]
    async fn test_group_feed_only_has_group_posts() {
        let fx = fixture();
        let author = fx.user("auth").await;
        let cats = fx.group("Cats", "cats").await;
        let dogs = fx.group("Dogs", "dogs").await;
        fx.posts(&author, Some(&cats), 2).await;
        let dog_posts = fx.posts(&author, Some(&dogs), 1).await;

        let feed = fx.feeds.group("dogs", None).await.unwrap();
        assert_eq!(feed.group.id, dogs.id);
        assert_eq!(feed.page.count, 1);
        assert_eq!(feed.page.items[0].post.id, dog_posts[0].id);
        assert_eq!(feed.page.items[0].group.as_ref().unwrap().slug, "dogs");
    }

    #[tokio::test]
    async fn test_unknown_slug_is_not_found() {
        let fx = fixture();
        let err = fx.feeds.group("missing", None).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity_type: "Group", .. }));
    }

    #[tokio::test]
    async fn test_deleting_group_keeps_posts_without_group() {
        let fx = fixture();
        let author = fx.user("auth").await;
        let group = fx.group("Тестовая группа", "test-slug").await;
        let post = fx.posts(&author, Some(&group), 1).await.remove(0);

        let feed = fx.feeds.group("test-slug", None).await.unwrap();
        assert_eq!(feed.page.items[0].post.id, post.id);

        fx.repos.groups.delete(group.id).await.unwrap();

        let kept = fx.repos.posts.find_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(kept.group_id, None);
        assert_eq!(fx.store.post_count().await, 1);
    }

    #[tokio::test]
    async fn test_deleting_author_cascades() {
        let fx = fixture();
        let author = fx.user("auth").await;
        let reader = fx.user("reader").await;
        let post = fx.posts(&author, None, 1).await.remove(0);
        fx.repos
            .comments
            .insert(Comment::new(post.id, reader.id, "nice"))
            .await
            .unwrap();
        fx.repos
            .follows
            .insert(Follow::new(reader.id, author.id))
            .await
            .unwrap();

        fx.repos.users.delete(author.id).await.unwrap();

        assert_eq!(fx.store.post_count().await, 0);
        assert_eq!(fx.store.comment_count().await, 0);
        assert_eq!(fx.store.follow_count().await, 0);
    }

    #[tokio::test]
    async fn test_deleting_post_removes_its_comments() {
        let fx = fixture();
        let author = fx.user("auth").await;
        let post = fx.posts(&author, None, 1).await.remove(0);
        fx.repos
            .comments
            .insert(Comment::new(post.id, author.id, "first"))
            .await
            .unwrap();

        fx.repos.posts.delete(post.id).await.unwrap();

        assert!(fx.repos.comments.find_by_post(post.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_profile_reports_count_and_following() {
        let fx = fixture();
        let author = fx.user("auth").await;
        let reader = fx.user("reader").await;
        fx.posts(&author, None, 12).await;

        let anonymous = fx.feeds.profile("auth", None, None).await.unwrap();
        assert_eq!(anonymous.post_count, 12);
        assert!(!anonymous.following);

        fx.repos
            .follows
            .insert(Follow::new(reader.id, author.id))
            .await
            .unwrap();
        let seen_by_reader = fx.feeds.profile("auth", Some(reader.id), None).await.unwrap();
        assert!(seen_by_reader.following);

        let own = fx.feeds.profile("auth", Some(author.id), Some("2")).await.unwrap();
        assert!(!own.following);
        assert_eq!(own.page.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_username_is_not_found() {
        let fx = fixture();
        assert!(matches!(
            fx.feeds.profile("ghost", None, None).await,
            Err(DomainError::NotFound { entity_type: "User", .. })
        ));
    }

    #[tokio::test]
    async fn test_follow_feed_only_followed_authors() {
        let fx = fixture();
        let followed = fx.user("followed").await;
        let other = fx.user("other").await;
        let reader = fx.user("reader").await;
        let wanted = fx.posts(&followed, None, 2).await;
        fx.posts(&other, None, 3).await;

        let before = fx.feeds.follow(reader.id, None).await.unwrap();
        assert!(before.is_empty());

        fx.repos
            .follows
            .insert(Follow::new(reader.id, followed.id))
            .await
            .unwrap();
        let after = fx.feeds.follow(reader.id, None).await.unwrap();
        let ids: Vec<Uuid> = after.items.iter().map(|i| i.post.id).collect();
        assert_eq!(ids, vec![wanted[1].id, wanted[0].id]);
    }

    #[tokio::test]
    async fn test_duplicate_follow_violates_constraint() {
        let fx = fixture();
        let author = fx.user("auth").await;
        let reader = fx.user("reader").await;
        fx.repos
            .follows
            .insert(Follow::new(reader.id, author.id))
            .await
            .unwrap();

        let err = fx
            .repos
            .follows
            .insert(Follow::new(reader.id, author.id))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Constraint(_)));
        assert_eq!(fx.store.follow_count().await, 1);
    }

    #[tokio::test]
    async fn test_delete_missing_pair_is_noop() {
        let fx = fixture();
        let author = fx.user("auth").await;
        let reader = fx.user("reader").await;
        assert_eq!(fx.repos.follows.delete_pair(reader.id, author.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_post_detail_lists_comments_in_order() {
        let fx = fixture();
        let author = fx.user("auth").await;
        let reader = fx.user("reader").await;
        let posts = fx.posts(&author, None, 3).await;

        let mut first = Comment::new(posts[0].id, reader.id, "first");
        first.created = Utc::now() - TimeDelta::minutes(5);
        fx.repos.comments.insert(first).await.unwrap();
        fx.repos
            .comments
            .insert(Comment::new(posts[0].id, author.id, "second"))
            .await
            .unwrap();

        let detail = fx.feeds.post_detail(posts[0].id).await.unwrap();
        assert_eq!(detail.author_post_count, 3);
        let texts: Vec<&str> = detail
            .comments
            .iter()
            .map(|c| c.comment.text.as_str())
            .collect();
        assert_eq!(texts, ["first", "second"]);
        assert_eq!(detail.comments[0].author, "reader");
    }

    #[tokio::test]
    async fn test_duplicate_slug_and_username_rejected() {
        let fx = fixture();
        fx.user("auth").await;
        fx.group("Cats", "cats").await;

        let dup_user = User::new("auth", "other@example.com", "hash".into());
        assert!(matches!(
            fx.repos.users.insert(dup_user).await,
            Err(RepoError::Constraint(_))
        ));

        let dup_group = Group::new("More cats", Some("cats"), "").unwrap();
        assert!(matches!(
            fx.repos.groups.insert(dup_group).await,
            Err(RepoError::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn test_post_requires_existing_author() {
        let fx = fixture();
        let orphan = Post::new(Uuid::new_v4(), "who wrote this");
        assert!(matches!(
            fx.repos.posts.insert(orphan).await,
            Err(RepoError::Constraint(_))
        ));
    }
}

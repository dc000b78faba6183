//! Feed composition: which posts each page shows, and in what order.

use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::{CommentItem, FeedItem, Group, Post, User};
use crate::error::DomainError;
use crate::pagination::{POSTS_PER_PAGE, Page, Paginator};
use crate::ports::Repositories;

/// Which posts a feed is made of. Every feed is ordered newest first, ties
/// broken by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFilter {
    All,
    Group(Uuid),
    Author(Uuid),
    /// Posts by any author the given user follows.
    FollowedBy(Uuid),
}

impl FeedFilter {
    pub fn matches(&self, post: &Post, followed: &[Uuid]) -> bool {
        match self {
            FeedFilter::All => true,
            FeedFilter::Group(group_id) => post.group_id == Some(*group_id),
            FeedFilter::Author(author_id) => post.author_id == *author_id,
            FeedFilter::FollowedBy(_) => followed.contains(&post.author_id),
        }
    }
}

/// Feed order: newest first, then by id so pages never overlap.
pub fn newest_first(a: &Post, b: &Post) -> std::cmp::Ordering {
    b.pub_date.cmp(&a.pub_date).then_with(|| b.id.cmp(&a.id))
}

#[derive(Debug, Clone)]
pub struct GroupFeed {
    pub group: Group,
    pub page: Page<FeedItem>,
}

#[derive(Debug, Clone)]
pub struct ProfileFeed {
    pub author: User,
    pub post_count: u64,
    /// Whether the viewer already follows this author. Always false for
    /// anonymous viewers and for the author looking at their own profile.
    pub following: bool,
    pub page: Page<FeedItem>,
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub item: FeedItem,
    pub author_post_count: u64,
    pub comments: Vec<CommentItem>,
}

/// Resolves path parameters, builds the matching filter and loads one page.
#[derive(Clone)]
pub struct FeedBuilder {
    repos: Repositories,
    per_page: u64,
}

impl FeedBuilder {
    pub fn new(repos: Repositories) -> Self {
        Self {
            repos,
            per_page: POSTS_PER_PAGE,
        }
    }

    /// Resolve a raw `?page=` value against the current size of the index
    /// feed.
    pub async fn index_page_number(&self, page: Option<&str>) -> Result<u64, DomainError> {
        let count = self.repos.posts.count_feed(&FeedFilter::All).await?;
        Ok(Paginator::new(count, self.per_page).page_number(page))
    }

    /// All posts.
    pub async fn index(&self, page: Option<&str>) -> Result<Page<FeedItem>, DomainError> {
        self.paginate(FeedFilter::All, page).await
    }

    /// Posts of the group addressed by `slug`.
    pub async fn group(&self, slug: &str, page: Option<&str>) -> Result<GroupFeed, DomainError> {
        let group = self
            .repos
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("Group", slug))?;

        let page = self.paginate(FeedFilter::Group(group.id), page).await?;
        Ok(GroupFeed { group, page })
    }

    /// Posts of the author named `username`, as seen by `viewer`.
    pub async fn profile(
        &self,
        username: &str,
        viewer: Option<Uuid>,
        page: Option<&str>,
    ) -> Result<ProfileFeed, DomainError> {
        let author = self.find_author(username).await?;

        let following = match viewer {
            Some(viewer) if viewer != author.id => {
                self.repos.follows.exists(viewer, author.id).await?
            }
            _ => false,
        };

        let page = self.paginate(FeedFilter::Author(author.id), page).await?;
        Ok(ProfileFeed {
            post_count: page.count,
            author,
            following,
            page,
        })
    }

    /// Posts by the authors `viewer` follows.
    pub async fn follow(
        &self,
        viewer: Uuid,
        page: Option<&str>,
    ) -> Result<Page<FeedItem>, DomainError> {
        self.paginate(FeedFilter::FollowedBy(viewer), page).await
    }

    /// A single post with its comments and its author's post count.
    pub async fn post_detail(&self, post_id: Uuid) -> Result<PostDetail, DomainError> {
        let post = self
            .repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", post_id))?;

        let author_post_count = self
            .repos
            .posts
            .count_feed(&FeedFilter::Author(post.author_id))
            .await?;

        let comments = self.repos.comments.find_by_post(post.id).await?;
        let commenter_ids: Vec<Uuid> = comments.iter().map(|c| c.author_id).collect();
        let names = self.usernames(&commenter_ids).await?;
        let comments = comments
            .into_iter()
            .map(|comment| CommentItem {
                author: names.get(&comment.author_id).cloned().unwrap_or_default(),
                comment,
            })
            .collect();

        let item = self
            .hydrate(vec![post])
            .await?
            .pop()
            .ok_or_else(|| DomainError::not_found("Post", post_id))?;

        Ok(PostDetail {
            item,
            author_post_count,
            comments,
        })
    }

    /// Look up a user by username, as a not-found condition when missing.
    pub async fn find_author(&self, username: &str) -> Result<User, DomainError> {
        self.repos
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("User", username))
    }

    async fn paginate(
        &self,
        filter: FeedFilter,
        page: Option<&str>,
    ) -> Result<Page<FeedItem>, DomainError> {
        let count = self.repos.posts.count_feed(&filter).await?;
        let paginator = Paginator::new(count, self.per_page);
        let number = paginator.page_number(page);
        let (offset, limit) = paginator.bounds(number);

        let posts = if limit == 0 {
            Vec::new()
        } else {
            self.repos.posts.fetch_feed(&filter, offset, limit).await?
        };

        let items = self.hydrate(posts).await?;
        Ok(paginator.page(number, items))
    }

    /// Attach author names and groups to a batch of posts.
    async fn hydrate(&self, posts: Vec<Post>) -> Result<Vec<FeedItem>, DomainError> {
        let author_ids: Vec<Uuid> = posts.iter().map(|p| p.author_id).collect();
        let names = self.usernames(&author_ids).await?;

        let mut group_ids: Vec<Uuid> = posts.iter().filter_map(|p| p.group_id).collect();
        group_ids.sort_unstable();
        group_ids.dedup();
        let groups: HashMap<Uuid, Group> = if group_ids.is_empty() {
            HashMap::new()
        } else {
            self.repos
                .groups
                .find_by_ids(&group_ids)
                .await?
                .into_iter()
                .map(|g| (g.id, g))
                .collect()
        };

        Ok(posts
            .into_iter()
            .map(|post| FeedItem {
                author: names.get(&post.author_id).cloned().unwrap_or_default(),
                group: post.group_id.and_then(|id| groups.get(&id).cloned()),
                post,
            })
            .collect())
    }

    async fn usernames(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, DomainError> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        Ok(self
            .repos
            .users
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect())
    }
}

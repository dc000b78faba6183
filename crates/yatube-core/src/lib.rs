//! # Yatube Core
//!
//! The domain layer of Yatube: entities, repository and service ports, and the
//! pure logic that composes feeds, paginates them and caches rendered pages.
//! Nothing in here knows about HTTP or a concrete database.

pub mod domain;
pub mod error;
pub mod feed;
pub mod forms;
pub mod page_cache;
pub mod pagination;
pub mod ports;
pub mod slug;

pub use error::DomainError;
pub use feed::{FeedBuilder, FeedFilter};
pub use page_cache::PageCache;
pub use pagination::{POSTS_PER_PAGE, Page, Paginator};

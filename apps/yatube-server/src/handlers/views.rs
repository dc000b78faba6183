//! Turning feeds and forms into the documents the handlers send.

use actix_web::HttpResponse;
use actix_web::http::header::{self, ContentType};

use yatube_core::Page;
use yatube_core::domain::{CommentItem, FeedItem, Group};
use yatube_core::forms::FormErrors;
use yatube_shared::dto::{CommentView, FieldErrors, GroupChoice, GroupView, PageView, PostView};

pub fn group_view(group: Group) -> GroupView {
    GroupView {
        title: group.title,
        slug: group.slug,
        description: group.description,
    }
}

pub fn group_choice(group: &Group) -> GroupChoice {
    GroupChoice {
        id: group.id,
        title: group.title.clone(),
    }
}

pub fn post_view(item: FeedItem) -> PostView {
    PostView {
        id: item.post.id,
        text: item.post.text,
        pub_date: item.post.pub_date,
        author: item.author,
        group: item.group.map(group_view),
        image: item.post.image,
    }
}

pub fn comment_view(item: CommentItem) -> CommentView {
    CommentView {
        id: item.comment.id,
        author: item.author,
        text: item.comment.text,
        created: item.comment.created,
    }
}

pub fn page_view(page: Page<FeedItem>) -> PageView {
    let page = page.map(post_view);
    PageView {
        number: page.number,
        num_pages: page.num_pages,
        count: page.count,
        has_previous: page.has_previous(),
        has_next: page.has_next(),
        previous_page_number: page.previous_page_number(),
        next_page_number: page.next_page_number(),
        posts: page.items,
    }
}

pub fn field_errors(errors: &FormErrors) -> FieldErrors {
    errors
        .iter()
        .map(|(field, messages)| (field.to_string(), messages.to_vec()))
        .collect()
}

/// A page that was already serialized, e.g. served from the page cache.
pub fn rendered(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(body)
}

/// `302 Found` to `location`.
pub fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{username}/")
}

pub fn post_url(post_id: impl std::fmt::Display) -> String {
    format!("/posts/{post_id}/")
}

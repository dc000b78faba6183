//! Feed pages, post detail and the post/comment forms.

use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

use yatube_core::PageCache;
use yatube_core::domain::{Comment, Group, Post};
use yatube_core::forms::{CommentInput, FormErrors, PostInput};
use yatube_shared::dto::{FeedView, GroupPageView, PostDetailView, PostFormView, ProfileView};

use super::views::{
    comment_view, field_errors, group_choice, group_view, page_view, post_url, post_view,
    profile_url, redirect, rendered,
};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// The raw `?page=` value. A malformed query string counts as no page.
pub fn page_param(req: &HttpRequest) -> Option<String> {
    web::Query::<PageQuery>::from_query(req.query_string())
        .ok()
        .and_then(|q| q.into_inner().page)
}

/// GET /
///
/// Served through the page cache: within its lifetime every viewer gets the
/// same bytes.
pub async fn index(state: web::Data<AppState>, req: HttpRequest) -> AppResult<HttpResponse> {
    let number = state
        .feeds
        .index_page_number(page_param(&req).as_deref())
        .await?;
    let key = PageCache::key(req.path(), number);
    let (feeds, page) = (&state.feeds, number.to_string());

    let body = state
        .page_cache
        .get_or_render(&key, move || async move {
            let page = feeds.index(Some(page.as_str())).await?;
            let view = FeedView {
                title: "Последние обновления на сайте".to_string(),
                page_obj: page_view(page),
            };
            Ok::<_, AppError>(serde_json::to_string(&view)?)
        })
        .await?;

    Ok(rendered(body))
}

/// GET /group/{slug}/
pub async fn group_posts(
    state: web::Data<AppState>,
    slug: web::Path<String>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let feed = state.feeds.group(&slug, page_param(&req).as_deref()).await?;

    Ok(HttpResponse::Ok().json(GroupPageView {
        group: group_view(feed.group),
        page_obj: page_view(feed.page),
    }))
}

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    username: web::Path<String>,
    identity: OptionalIdentity,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let viewer = identity.0.map(|i| i.user_id);
    let feed = state
        .feeds
        .profile(&username, viewer, page_param(&req).as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(ProfileView {
        author: feed.author.username,
        post_count: feed.post_count,
        following: feed.following,
        page_obj: page_view(feed.page),
    }))
}

/// GET /posts/{id}/
pub async fn post_detail(
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let detail = state.feeds.post_detail(*post_id).await?;
    let can_edit = identity
        .0
        .as_ref()
        .is_some_and(|i| detail.item.post.is_authored_by(i.user_id));

    Ok(HttpResponse::Ok().json(PostDetailView {
        can_comment: identity.0.is_some(),
        can_edit,
        author_post_count: detail.author_post_count,
        comments: detail.comments.into_iter().map(comment_view).collect(),
        post: post_view(detail.item),
    }))
}

fn post_form(
    post_id: Option<Uuid>,
    input: PostInput,
    groups: &[Group],
    errors: &FormErrors,
) -> HttpResponse {
    HttpResponse::Ok().json(PostFormView {
        is_edit: post_id.is_some(),
        post_id,
        text: input.text,
        group: input.group,
        image: input.image,
        groups: groups.iter().map(group_choice).collect(),
        errors: field_errors(errors),
    })
}

/// A missing or unreadable form body binds as an empty form, which then fails
/// validation like any other incomplete submission.
fn form_or_default<T: Default>(form: Option<web::Form<T>>) -> T {
    form.map(web::Form::into_inner).unwrap_or_default()
}

/// Form values bound to an existing post.
fn bound_input(post: &Post) -> PostInput {
    PostInput {
        text: post.text.clone(),
        group: post.group_id.map(|id| id.to_string()).unwrap_or_default(),
        image: post.image.clone().unwrap_or_default(),
    }
}

/// GET /create/
pub async fn post_create_form(
    state: web::Data<AppState>,
    _identity: Identity,
) -> AppResult<HttpResponse> {
    let groups = state.repos.groups.list().await?;
    Ok(post_form(None, PostInput::default(), &groups, &FormErrors::default()))
}

/// POST /create/
pub async fn post_create(
    state: web::Data<AppState>,
    identity: Identity,
    form: Option<web::Form<PostInput>>,
) -> AppResult<HttpResponse> {
    let input = form_or_default(form);
    let groups = state.repos.groups.list().await?;

    let cleaned = match input.validate(&groups) {
        Ok(cleaned) => cleaned,
        Err(errors) => {
            tracing::debug!(user = %identity.username, "Post form rejected");
            return Ok(post_form(None, input, &groups, &errors));
        }
    };

    let mut post = Post::new(identity.user_id, cleaned.text);
    post.group_id = cleaned.group_id;
    post.image = cleaned.image;
    let post = state.repos.posts.insert(post).await?;

    tracing::info!(post_id = %post.id, author = %identity.username, "Post created");
    Ok(redirect(profile_url(&identity.username)))
}

/// The post behind `post_id`, provided `identity` wrote it. `Err` carries the
/// response to send instead: a redirect back to the post for anyone else.
async fn authored_post(
    state: &AppState,
    post_id: Uuid,
    identity: &Identity,
) -> AppResult<Result<Post, HttpResponse>> {
    let post = state
        .repos
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;

    if !post.is_authored_by(identity.user_id) {
        tracing::debug!(post_id = %post_id, user = %identity.username, "Edit by non-author refused");
        return Ok(Err(redirect(post_url(post_id))));
    }

    Ok(Ok(post))
}

/// GET /posts/{id}/edit/
pub async fn post_edit_form(
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let post = match authored_post(&state, *post_id, &identity).await? {
        Ok(post) => post,
        Err(response) => return Ok(response),
    };

    let groups = state.repos.groups.list().await?;
    Ok(post_form(
        Some(post.id),
        bound_input(&post),
        &groups,
        &FormErrors::default(),
    ))
}

/// POST /posts/{id}/edit/
///
/// A blank image field keeps the current image.
pub async fn post_edit(
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
    identity: Identity,
    form: Option<web::Form<PostInput>>,
) -> AppResult<HttpResponse> {
    let mut post = match authored_post(&state, *post_id, &identity).await? {
        Ok(post) => post,
        Err(response) => return Ok(response),
    };

    let input = form_or_default(form);
    let groups = state.repos.groups.list().await?;
    let cleaned = match input.validate(&groups) {
        Ok(cleaned) => cleaned,
        Err(errors) => return Ok(post_form(Some(post.id), input, &groups, &errors)),
    };

    post.text = cleaned.text;
    post.group_id = cleaned.group_id;
    if cleaned.image.is_some() {
        post.image = cleaned.image;
    }
    let post = state.repos.posts.update(post).await?;

    tracing::info!(post_id = %post.id, "Post updated");
    Ok(redirect(post_url(post.id)))
}

/// POST /posts/{id}/comment/
///
/// Always ends on the post page; an empty comment is dropped.
pub async fn add_comment(
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
    identity: Identity,
    form: Option<web::Form<CommentInput>>,
) -> AppResult<HttpResponse> {
    let post_id = post_id.into_inner();
    let post = state
        .repos
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;

    match form_or_default(form).validate() {
        Ok(text) => {
            let comment = Comment::new(post.id, identity.user_id, text);
            state.repos.comments.insert(comment).await?;
            tracing::debug!(post_id = %post.id, author = %identity.username, "Comment added");
        }
        Err(errors) => {
            tracing::debug!(post_id = %post.id, errors = ?errors, "Empty comment dropped");
        }
    }

    Ok(redirect(post_url(post.id)))
}

//! Following authors and the feed of followed authors.

use actix_web::{HttpRequest, HttpResponse, web};

use yatube_core::domain::Follow;
use yatube_core::error::RepoError;
use yatube_shared::dto::FeedView;

use super::posts::page_param;
use super::views::{page_view, profile_url, redirect};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /follow/
pub async fn follow_index(
    state: web::Data<AppState>,
    identity: Identity,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let page = state
        .feeds
        .follow(identity.user_id, page_param(&req).as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(FeedView {
        title: "Избранные авторы".to_string(),
        page_obj: page_view(page),
    }))
}

/// GET /profile/{username}/follow/
///
/// Idempotent: following yourself or an author you already follow changes
/// nothing.
pub async fn profile_follow(
    state: web::Data<AppState>,
    username: web::Path<String>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let author = state.feeds.find_author(&username).await?;

    if author.id != identity.user_id
        && !state.repos.follows.exists(identity.user_id, author.id).await?
    {
        match state
            .repos
            .follows
            .insert(Follow::new(identity.user_id, author.id))
            .await
        {
            Ok(_) => {
                tracing::info!(follower = %identity.username, author = %author.username, "Followed")
            }
            // A concurrent request won the race on the unique pair.
            Err(RepoError::Constraint(_)) => {
                tracing::debug!(follower = %identity.username, author = %author.username, "Already following")
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(redirect(profile_url(&author.username)))
}

/// GET /profile/{username}/unfollow/
pub async fn profile_unfollow(
    state: web::Data<AppState>,
    username: web::Path<String>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let author = state.feeds.find_author(&username).await?;

    let removed = state
        .repos
        .follows
        .delete_pair(identity.user_id, author.id)
        .await?;
    tracing::debug!(follower = %identity.username, author = %author.username, removed, "Unfollow");

    Ok(redirect(profile_url(&author.username)))
}

//! HTTP handlers and route configuration.

mod auth;
mod follow;
mod health;
mod posts;
mod views;


use actix_web::error::InternalError;
use actix_web::{HttpResponse, web};

use yatube_shared::ErrorResponse;

use crate::middleware::auth::LoginRequired;

/// Unparseable path parameters (e.g. a post id that is not a UUID) address
/// nothing, so they answer 404 like any other unknown object.
fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, req| {
        let body = ErrorResponse::not_found(err.to_string()).with_instance(req.path());
        InternalError::from_response(err, HttpResponse::NotFound().json(body)).into()
    })
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(path_config())
        .route("/health", web::get().to(health::health_check))
        // Public pages
        .route("/", web::get().to(posts::index))
        .route("/group/{slug}/", web::get().to(posts::group_posts))
        .route("/profile/{username}/", web::get().to(posts::profile))
        .route("/posts/{id}/", web::get().to(posts::post_detail))
        // Pages behind login
        .service(
            web::resource("/create/")
                .wrap(LoginRequired)
                .route(web::get().to(posts::post_create_form))
                .route(web::post().to(posts::post_create)),
        )
        .service(
            web::resource("/posts/{id}/edit/")
                .wrap(LoginRequired)
                .route(web::get().to(posts::post_edit_form))
                .route(web::post().to(posts::post_edit)),
        )
        .service(
            web::resource("/posts/{id}/comment/")
                .wrap(LoginRequired)
                .route(web::post().to(posts::add_comment)),
        )
        .service(
            web::resource("/follow/")
                .wrap(LoginRequired)
                .route(web::get().to(follow::follow_index)),
        )
        .service(
            web::resource("/profile/{username}/follow/")
                .wrap(LoginRequired)
                .route(web::get().to(follow::profile_follow)),
        )
        .service(
            web::resource("/profile/{username}/unfollow/")
                .wrap(LoginRequired)
                .route(web::get().to(follow::profile_unfollow)),
        )
        // Sessions
        .service(
            web::scope("/auth")
                .service(
                    web::resource("/signup/")
                        .route(web::get().to(auth::signup_form))
                        .route(web::post().to(auth::signup)),
                )
                .service(
                    web::resource("/login/")
                        .route(web::get().to(auth::login_form))
                        .route(web::post().to(auth::login)),
                )
                .route("/logout/", web::get().to(auth::logout)),
        );
}

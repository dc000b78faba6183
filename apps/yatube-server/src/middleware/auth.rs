//! Session extractors and the login guard.
//!
//! The session token travels in the `sessionid` cookie; an
//! `Authorization: Bearer` header is accepted as well.

use std::future::{Ready, ready};
use std::rc::Rc;

use actix_web::body::EitherBody;
use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::{StatusCode, header};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, HttpResponse, web};
use futures::future::LocalBoxFuture;
use url::form_urlencoded;
use uuid::Uuid;

use yatube_core::error::RepoError;
use yatube_core::ports::AuthError;
use yatube_shared::ErrorResponse;

use crate::state::AppState;

/// Name of the cookie holding the session token.
pub const SESSION_COOKIE: &str = "sessionid";

/// Where anonymous visitors of protected pages are sent.
pub const LOGIN_URL: &str = "/auth/login/";

/// Authenticated user identity extractor.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
}

/// Why a request could not be tied to a signed-in user.
#[derive(Debug)]
pub enum AuthenticationError {
    /// No usable session: missing, expired or forged token, or a token whose
    /// user no longer exists. Treated as an anonymous visitor.
    Session(AuthError),
    /// The user store could not be reached.
    Store(RepoError),
}

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthenticationError::Session(err) => write!(f, "{}", err),
            AuthenticationError::Store(err) => write!(f, "{}", err),
        }
    }
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthenticationError::Session(AuthError::HashingError(_))
            | AuthenticationError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthenticationError::Session(_) => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AuthenticationError::Session(AuthError::TokenExpired) => {
                ErrorResponse::new(401, "Session Expired")
                    .with_detail("Your session has expired. Please log in again.")
            }
            AuthenticationError::Session(AuthError::InvalidToken(msg)) => {
                ErrorResponse::new(401, "Invalid Session").with_detail(msg.clone())
            }
            AuthenticationError::Session(AuthError::MissingAuth | AuthError::InvalidCredentials) => {
                ErrorResponse::new(401, "Authentication Required")
            }
            AuthenticationError::Session(AuthError::HashingError(_))
            | AuthenticationError::Store(_) => ErrorResponse::internal_error(),
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

fn session_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

/// Resolve the session carried by a request to a user that still exists.
pub async fn authenticate(req: &HttpRequest) -> Result<Identity, AuthenticationError> {
    let known = req.extensions().get::<Identity>().cloned();
    if let Some(identity) = known {
        return Ok(identity);
    }

    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        tracing::error!("AppState not found in app data");
        return Err(AuthenticationError::Session(AuthError::InvalidToken(
            "Server configuration error".to_string(),
        )));
    };

    let token = session_token(req).ok_or(AuthenticationError::Session(AuthError::MissingAuth))?;
    let claims = state
        .tokens
        .validate_token(&token)
        .map_err(AuthenticationError::Session)?;

    let user = state
        .repos
        .users
        .find_by_id(claims.user_id)
        .await
        .map_err(AuthenticationError::Store)?
        .ok_or_else(|| {
            tracing::debug!(user_id = %claims.user_id, "Session user no longer exists");
            AuthenticationError::Session(AuthError::InvalidToken(
                "Session user no longer exists".to_string(),
            ))
        })?;

    Ok(Identity {
        user_id: user.id,
        username: user.username,
    })
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { authenticate(&req).await })
    }
}

/// Optional identity extractor - doesn't fail if not authenticated.
pub struct OptionalIdentity(pub Option<Identity>);

impl FromRequest for OptionalIdentity {
    type Error = AuthenticationError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            match authenticate(&req).await {
                Ok(identity) => Ok(OptionalIdentity(Some(identity))),
                Err(AuthenticationError::Session(_)) => Ok(OptionalIdentity(None)),
                Err(err) => Err(err),
            }
        })
    }
}

/// Login page URL that returns to `target` (path and query) afterwards.
pub fn login_redirect_url(target: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("next", target)
        .finish();
    format!("{LOGIN_URL}?{query}")
}

/// Guard for pages that need a signed-in user.
///
/// Anonymous requests, including sessions whose user has been deleted, are
/// answered with a redirect to the login page; for authenticated ones the
/// `Identity` is stored in the request extensions so the handler's extractor
/// does not resolve the session again.
pub struct LoginRequired;

impl<S, B> Transform<S, ServiceRequest> for LoginRequired
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = LoginRequiredService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LoginRequiredService {
            service: Rc::new(service),
        }))
    }
}

pub struct LoginRequiredService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for LoginRequiredService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let outcome = authenticate(req.request()).await;
            match outcome {
                Ok(identity) => {
                    req.extensions_mut().insert(identity);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(AuthenticationError::Session(err)) => {
                    tracing::debug!(path = %req.path(), reason = %err, "Login required");

                    let target = req
                        .uri()
                        .path_and_query()
                        .map_or(req.path(), |pq| pq.as_str());
                    let response = HttpResponse::Found()
                        .insert_header((header::LOCATION, login_redirect_url(target)))
                        .finish();
                    let (http_req, _payload) = req.into_parts();

                    Ok(ServiceResponse::new(http_req, response).map_into_right_body())
                }
                Err(err) => Err(err.into()),
            }
        })
    }
}

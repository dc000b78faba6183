//! Signup, login and logout.

use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::http::header;
use actix_web::{HttpResponse, web};

use yatube_core::domain::User;
use yatube_core::error::RepoError;
use yatube_core::forms::{FormErrors, REQUIRED};
use yatube_shared::dto::{AuthFormView, LoginRequest, SignupRequest};

use super::views::field_errors;
use crate::middleware::auth::SESSION_COOKIE;
use crate::middleware::error::AppResult;
use crate::state::AppState;

const USERNAME_MAX_LEN: usize = 150;
const PASSWORD_MIN_LEN: usize = 8;
const BAD_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

#[derive(Debug, serde::Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

fn auth_form(username: String, next: Option<String>, errors: &FormErrors) -> HttpResponse {
    HttpResponse::Ok().json(AuthFormView {
        username,
        next,
        errors: field_errors(errors),
    })
}

fn session_cookie(token: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(max_age_secs))
        .finish()
}

fn redirect_with(location: &str, cookie: Cookie<'_>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .cookie(cookie)
        .finish()
}

/// Only same-site paths are followed after login.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/",
    }
}

fn validate_signup(req: &SignupRequest) -> FormErrors {
    let mut errors = FormErrors::default();

    let username = req.username.trim();
    if username.is_empty() {
        errors.add("username", REQUIRED);
    } else if username.chars().count() > USERNAME_MAX_LEN
        || !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@.+-_".contains(c))
    {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }

    let email = req.email.trim();
    if !email.is_empty() && !email.contains('@') {
        errors.add("email", "Enter a valid email address.");
    }

    if req.password.is_empty() {
        errors.add("password", REQUIRED);
    } else if req.password.chars().count() < PASSWORD_MIN_LEN {
        errors.add(
            "password",
            format!("This password is too short. It must contain at least {PASSWORD_MIN_LEN} characters."),
        );
    } else if req.password.chars().all(|c| c.is_ascii_digit()) {
        errors.add("password", "This password is entirely numeric.");
    }

    errors
}

/// GET /auth/signup/
pub async fn signup_form() -> HttpResponse {
    auth_form(String::new(), None, &FormErrors::default())
}

/// POST /auth/signup/
pub async fn signup(
    state: web::Data<AppState>,
    form: web::Form<SignupRequest>,
) -> AppResult<HttpResponse> {
    let req = form.into_inner();
    let mut errors = validate_signup(&req);
    let username = req.username.trim().to_string();

    if errors.is_empty() && state.repos.users.find_by_username(&username).await?.is_some() {
        errors.add("username", "A user with that username already exists.");
    }
    if !errors.is_empty() {
        return Ok(auth_form(username, None, &errors));
    }

    let password_hash = state.passwords.hash(&req.password)?;
    let user = User::new(username.clone(), req.email.trim(), password_hash);
    let user = match state.repos.users.insert(user).await {
        Ok(user) => user,
        Err(RepoError::Constraint(_)) => {
            errors.add("username", "A user with that username already exists.");
            return Ok(auth_form(username, None, &errors));
        }
        Err(e) => return Err(e.into()),
    };

    let token = state.tokens.generate_token(user.id, &user.username)?;
    tracing::info!(user_id = %user.id, username = %user.username, "User signed up");

    Ok(redirect_with(
        "/",
        session_cookie(token, state.tokens.expiration_seconds()),
    ))
}

/// GET /auth/login/
pub async fn login_form(query: web::Query<NextQuery>) -> HttpResponse {
    auth_form(String::new(), query.into_inner().next, &FormErrors::default())
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    form: web::Form<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = form.into_inner();
    let username = req.username.trim().to_string();

    let user = match state.repos.users.find_by_username(&username).await? {
        Some(user) if state.passwords.verify(&req.password, &user.password_hash)? => user,
        _ => {
            tracing::debug!(username = %username, "Login refused");
            let mut errors = FormErrors::default();
            errors.add("__all__", BAD_LOGIN);
            return Ok(auth_form(username, req.next, &errors));
        }
    };

    let token = state.tokens.generate_token(user.id, &user.username)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(redirect_with(
        safe_next(req.next.as_deref()),
        session_cookie(token, state.tokens.expiration_seconds()),
    ))
}

/// GET /auth/logout/
pub async fn logout() -> HttpResponse {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();
    redirect_with("/", cookie)
}

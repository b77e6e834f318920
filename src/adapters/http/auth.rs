use axum::http::{HeaderMap, header::AUTHORIZATION};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::jwt,
    use_cases::Actor,
};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
/// Readable by the browser; also keys the per-email rate limit bucket.
pub const USER_EMAIL_COOKIE: &str = "user_email";

/// Resolve the caller from a Bearer header, falling back to the access-token cookie.
pub fn current_actor(headers: &HeaderMap, jar: &CookieJar, app_state: &AppState) -> AppResult<Actor> {
    let token = bearer_token(headers)
        .map(str::to_owned)
        .or_else(|| jar.get(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_owned()))
        .ok_or(AppError::InvalidCredentials)?;

    let claims = jwt::verify(&token, &app_state.config.jwt_secret)?;
    Ok(Actor {
        id: claims.user_id()?,
        role: claims.role,
    })
}

pub fn require_admin(headers: &HeaderMap, jar: &CookieJar, app_state: &AppState) -> AppResult<Actor> {
    let actor = current_actor(headers, jar, app_state)?;
    actor.ensure_admin()?;
    Ok(actor)
}

pub fn require_fighter(headers: &HeaderMap, jar: &CookieJar, app_state: &AppState) -> AppResult<Actor> {
    let actor = current_actor(headers, jar, app_state)?;
    actor.ensure_fighter()?;
    Ok(actor)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Attach session cookies for a freshly issued token.
pub fn with_session_cookies(
    jar: CookieJar,
    token: String,
    email: String,
    max_age: time::Duration,
    secure: bool,
) -> CookieJar {
    let access = Cookie::build((ACCESS_TOKEN_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .build();
    let email = Cookie::build((USER_EMAIL_COOKIE, email))
        .http_only(false)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .build();
    jar.add(access).add(email)
}

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{post, put},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    adapters::http::{
        app_state::AppState,
        auth::{ACCESS_TOKEN_COOKIE, USER_EMAIL_COOKIE, with_session_cookies},
    },
    app_error::AppResult,
    use_cases::auth::{RegisterFighter, Session},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/logout", post(logout))
        .route("/forgot-password", post(forgot_password))
        .route("/verify-reset-code", post(verify_reset_code))
        .route("/reset-password", put(reset_password))
}

#[derive(Deserialize)]
struct LoginPayload {
    email: String,
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterPayload {
    name: String,
    email: String,
    password: String,
    phone: Option<String>,
    date_of_birth: Option<NaiveDate>,
    address: Option<String>,
    emergency_contact: Option<String>,
}

#[derive(Deserialize)]
struct ForgotPasswordPayload {
    email: String,
}

#[derive(Deserialize)]
struct VerifyResetCodePayload {
    email: String,
    code: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordPayload {
    email: String,
    code: String,
    #[serde(alias = "password")]
    new_password: String,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

fn session_response(app_state: &AppState, jar: CookieJar, session: Session) -> (CookieJar, Json<Session>) {
    let jar = with_session_cookies(
        jar,
        session.token.clone(),
        session.user.email.clone(),
        app_state.auth_use_cases.token_ttl(),
        app_state.config.secure_cookies(),
    );
    (jar, Json(session))
}

async fn login(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginPayload>,
) -> AppResult<impl IntoResponse> {
    let session = app_state
        .auth_use_cases
        .login(&payload.email, &payload.password)
        .await?;
    Ok(session_response(&app_state, jar, session))
}

async fn register(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterPayload>,
) -> AppResult<impl IntoResponse> {
    let session = app_state
        .auth_use_cases
        .register_fighter(RegisterFighter {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            phone: payload.phone,
            date_of_birth: payload.date_of_birth,
            address: payload.address,
            emergency_contact: payload.emergency_contact,
        })
        .await?;
    Ok((StatusCode::CREATED, session_response(&app_state, jar, session)))
}

async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar
        .remove(Cookie::build(ACCESS_TOKEN_COOKIE).path("/"))
        .remove(Cookie::build(USER_EMAIL_COOKIE).path("/"));
    (StatusCode::NO_CONTENT, jar)
}

async fn forgot_password(
    State(app_state): State<AppState>,
    Json(payload): Json<ForgotPasswordPayload>,
) -> AppResult<impl IntoResponse> {
    app_state
        .password_reset_use_cases
        .request_reset(&payload.email)
        .await?;
    Ok(Json(MessageResponse {
        message: "Password reset code sent",
    }))
}

async fn verify_reset_code(
    State(app_state): State<AppState>,
    Json(payload): Json<VerifyResetCodePayload>,
) -> AppResult<impl IntoResponse> {
    app_state
        .password_reset_use_cases
        .verify_reset(&payload.email, &payload.code)
        .await?;
    Ok(Json(MessageResponse {
        message: "Reset code verified",
    }))
}

async fn reset_password(
    State(app_state): State<AppState>,
    Json(payload): Json<ResetPasswordPayload>,
) -> AppResult<impl IntoResponse> {
    app_state
        .password_reset_use_cases
        .reset_password(&payload.email, &payload.code, &payload.new_password)
        .await?;
    Ok(Json(MessageResponse {
        message: "Password has been reset",
    }))
}

use axum_extra::extract::cookie::CookieJar;
use service_core::{
    auth::TokenPair,
    axum::{
        extract::State,
        response::{IntoResponse, Redirect, Response},
        Json,
    },
    error::AppError,
    middleware::identity::REFRESH_TOKEN_COOKIE,
};

use super::with_token_cookies;
use crate::{
    dtos::auth::LoginRequest, services::ServiceError, utils::Password, utils::ValidatedJson,
    AppState,
};

/// Login with email and password; the pair is returned as JSON and cookies
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<TokenPair>), AppError> {
    let (_, pair) = state
        .sessions
        .login(&req.email, &Password::new(req.password))
        .await
        .map_err(|e| match e {
            ServiceError::UserNotFound => {
                AppError::Forbidden(anyhow::anyhow!("Invalid credentials"))
            }
            other => other.into(),
        })?;

    let jar = with_token_cookies(
        jar,
        &pair,
        state.sessions.access_ttl(),
        state.sessions.refresh_ttl(),
    );
    Ok((jar, Json(pair)))
}

/// Rotate the pair using the `refresh_token` cookie
pub async fn update_token(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let refresh_token = match jar.get(REFRESH_TOKEN_COOKIE) {
        Some(cookie) => cookie.value().to_string(),
        None => return Ok(Redirect::to("/login").into_response()),
    };

    let pair = state.sessions.refresh(&refresh_token).await?;

    let jar = with_token_cookies(
        jar,
        &pair,
        state.sessions.access_ttl(),
        state.sessions.refresh_ttl(),
    );
    Ok((jar, Json(pair)).into_response())
}

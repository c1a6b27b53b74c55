use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

use crate::{
    dtos::auth::{SignupRequest, SignupResponse},
    utils::ValidatedJson,
    AppState,
};

/// Register a user with role `user`
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.sessions.signup(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            id: user.id,
            message: "Successfully registered user".to_string(),
        }),
    ))
}

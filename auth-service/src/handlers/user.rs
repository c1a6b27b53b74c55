use service_core::{
    axum::{extract::State, Json},
    error::AppError,
    middleware::AuthIdentity,
};

use crate::{models::UserProfile, AppState};

/// Profile of the caller identified by the access token
pub async fn user_data(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
) -> Result<Json<UserProfile>, AppError> {
    let user = state.sessions.user_data(identity.id).await?;
    Ok(Json(user.into()))
}

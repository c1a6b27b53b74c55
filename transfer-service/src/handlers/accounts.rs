use axum::{extract::State, http::StatusCode, Json};
use service_core::{error::AppError, middleware::AuthIdentity};
use validator::Validate;

use crate::dtos::ledger::CreateAccountRequest;
use crate::models::Account;
use crate::startup::AppState;

/// Accounts owned by the caller, newest transfer attached to each.
pub async fn list_accounts(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
) -> Result<Json<Vec<Account>>, AppError> {
    let accounts = state.ledger.get_accounts(identity.id).await?;
    Ok(Json(accounts))
}

/// Opens an account. The submitted national ID has to be the caller's own.
pub async fn create_account(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<Account>), AppError> {
    request.validate()?;

    if identity.national_id.as_deref() != Some(request.national_id.as_str()) {
        tracing::warn!(user_id = identity.id, "National ID does not match caller");
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "national ID does not match the authenticated user"
        )));
    }

    let account = state
        .ledger
        .create_account(identity.id, &request.national_id)
        .await?;

    Ok((StatusCode::CREATED, Json(account)))
}

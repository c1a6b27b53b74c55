use axum::{extract::State, http::StatusCode, Json};
use service_core::{error::AppError, middleware::AuthIdentity};

use crate::dtos::ledger::{IncrementRequest, TransferRequest};
use crate::models::{Account, Transaction};
use crate::startup::AppState;

pub async fn transaction(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Json(request): Json<TransferRequest>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    let transaction = state
        .ledger
        .transfer(
            identity.id,
            request.sender_id,
            request.receiver_id,
            request.amount,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// Tops up an account.
pub async fn increment(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    Json(request): Json<IncrementRequest>,
) -> Result<Json<Account>, AppError> {
    tracing::debug!(
        user_id = identity.id,
        account_id = request.account_id,
        "Deposit requested"
    );

    let account = state
        .ledger
        .deposit(request.account_id, request.amount)
        .await?;

    Ok(Json(account))
}

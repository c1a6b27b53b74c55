use service_core::error::AppError;
use std::time::Duration;
use thiserror::Error;

/// Minimum exclusive amount for deposits and transfers.
pub const MIN_OPERATION_AMOUNT: i64 = 150;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// Sender account is missing or belongs to someone else.
    #[error("invalid transaction sender")]
    Unauthorized,

    #[error("invalid transaction receiver")]
    SameAccount,

    #[error("amount must be higher than {}", MIN_OPERATION_AMOUNT)]
    InvalidAmount,

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("account {0} not found")]
    AccountNotFound(i64),

    #[error("no free account number after {0} attempts")]
    IdSpaceExhausted(u32),

    #[error("storage error: {0}")]
    Storage(anyhow::Error),

    #[error("ledger operation exceeded {0:?}")]
    Timeout(Duration),
}

impl LedgerError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::Unauthorized => "unauthorized",
            LedgerError::SameAccount => "same_account",
            LedgerError::InvalidAmount => "invalid_amount",
            LedgerError::InsufficientFunds => "insufficient_funds",
            LedgerError::AccountNotFound(_) => "not_found",
            LedgerError::IdSpaceExhausted(_) => "id_exhausted",
            LedgerError::Storage(_) => "storage",
            LedgerError::Timeout(_) => "timeout",
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Storage(anyhow::Error::new(err))
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Unauthorized => {
                AppError::Forbidden(anyhow::anyhow!("invalid transaction sender"))
            }
            LedgerError::SameAccount
            | LedgerError::InvalidAmount
            | LedgerError::InsufficientFunds => AppError::BadRequest(anyhow::anyhow!(err)),
            LedgerError::AccountNotFound(_) => AppError::NotFound(anyhow::anyhow!(err)),
            LedgerError::IdSpaceExhausted(_) => AppError::InternalError(anyhow::anyhow!(err)),
            LedgerError::Storage(e) => AppError::DatabaseError(e),
            LedgerError::Timeout(_) => AppError::Timeout(anyhow::anyhow!(err)),
        }
    }
}

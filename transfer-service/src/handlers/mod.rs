//! HTTP handlers for transfer-service.

mod accounts;
mod health;
mod transfers;

pub use accounts::{create_account, list_accounts};
pub use health::{health_check, metrics_handler, readiness_check};
pub use transfers::{increment, transaction};

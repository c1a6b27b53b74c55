//! Domain models for transfer-service.

mod account;
mod transaction;

pub use account::{Account, AccountRow, ACCOUNT_ID_MAX, ACCOUNT_ID_MIN};
pub use transaction::Transaction;

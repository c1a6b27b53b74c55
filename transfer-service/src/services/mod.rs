//! Services for transfer-service.

mod database;
pub mod error;
mod ledger;
mod memory;
pub mod metrics;

pub use database::{Database, LedgerStore};
pub use error::LedgerError;
pub use ledger::{random_account_id, AccountLedger, IdSource, MAX_ID_ATTEMPTS};
pub use memory::InMemoryLedgerStore;
pub use metrics::{get_metrics, init_metrics};

//! Account model for the transfer ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Transaction;

/// Account numbers are 16 decimal digits.
pub const ACCOUNT_ID_MIN: i64 = 1_000_000_000_000_000;
pub const ACCOUNT_ID_MAX: i64 = 9_999_999_999_999_999;

/// Ledger account as stored in the `accounts` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct AccountRow {
    pub id: i64,
    pub owner_id: i64,
    pub national_id: String,
    /// Current balance in minor units.
    pub amount: i64,
    pub registered: DateTime<Utc>,
}

impl AccountRow {
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.owner_id == user_id
    }
}

/// Account as returned to callers, annotated with its latest transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "ownerID")]
    pub owner_id: i64,
    #[serde(rename = "nationalID")]
    pub national_id: String,
    #[serde(rename = "amount")]
    pub balance: i64,
    pub registered: DateTime<Utc>,
    #[serde(rename = "lastTransaction")]
    pub last_transaction: Option<Transaction>,
}

impl Account {
    pub fn from_row(row: AccountRow, last_transaction: Option<Transaction>) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            national_id: row.national_id,
            balance: row.amount,
            registered: row.registered,
            last_transaction,
        }
    }
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self::from_row(row, None)
    }
}

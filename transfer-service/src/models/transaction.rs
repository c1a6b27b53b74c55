use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One completed transfer. Rows are only ever inserted, inside the same
/// storage transaction that moves the money.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "senderID")]
    pub sender_id: i64,
    #[serde(rename = "receiverID")]
    pub receiver_id: i64,
    pub amount: i64,
    pub date: DateTime<Utc>,
}

impl Transaction {
    pub fn involves(&self, account_id: i64) -> bool {
        self.sender_id == account_id || self.receiver_id == account_id
    }
}

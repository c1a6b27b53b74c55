//! In-memory ledger store for tests and single-node development.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::models::{Account, AccountRow, Transaction};
use crate::services::{LedgerError, LedgerStore};

#[derive(Default)]
struct LedgerTables {
    accounts: BTreeMap<i64, AccountRow>,
    transactions: Vec<Transaction>,
    next_transaction_id: i64,
}

impl LedgerTables {
    fn last_transaction(&self, account_id: i64) -> Option<Transaction> {
        self.transactions
            .iter()
            .filter(|t| t.involves(account_id))
            .max_by_key(|t| (t.date, t.id))
            .cloned()
    }
}

/// Every operation runs under one lock, which makes each deposit and
/// transfer a serializable unit.
#[derive(Default)]
pub struct InMemoryLedgerStore {
    tables: Mutex<LedgerTables>,
    latency: Option<Duration>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulated storage latency, applied to transfers after validation and
    /// before any write, while the lock is held.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Seeds an account with a given balance.
    pub async fn seed_account(&self, id: i64, owner_id: i64, national_id: &str, balance: i64) {
        let mut tables = self.tables.lock().await;
        tables.accounts.insert(
            id,
            AccountRow {
                id,
                owner_id,
                national_id: national_id.to_string(),
                amount: balance,
                registered: Utc::now(),
            },
        );
    }

    pub async fn balance(&self, id: i64) -> Option<i64> {
        self.tables.lock().await.accounts.get(&id).map(|a| a.amount)
    }

    pub async fn transactions(&self) -> Vec<Transaction> {
        self.tables.lock().await.transactions.clone()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn account_exists(&self, id: i64) -> Result<bool, LedgerError> {
        Ok(self.tables.lock().await.accounts.contains_key(&id))
    }

    async fn insert_account(
        &self,
        id: i64,
        owner_id: i64,
        national_id: &str,
    ) -> Result<Option<AccountRow>, LedgerError> {
        let mut tables = self.tables.lock().await;
        if tables.accounts.contains_key(&id) {
            return Ok(None);
        }

        let row = AccountRow {
            id,
            owner_id,
            national_id: national_id.to_string(),
            amount: 0,
            registered: Utc::now(),
        };
        tables.accounts.insert(id, row.clone());
        Ok(Some(row))
    }

    async fn find_account(&self, id: i64) -> Result<Option<AccountRow>, LedgerError> {
        Ok(self.tables.lock().await.accounts.get(&id).cloned())
    }

    async fn list_accounts(&self, owner_id: i64) -> Result<Vec<Account>, LedgerError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<&AccountRow> = tables
            .accounts
            .values()
            .filter(|a| a.owner_id == owner_id)
            .collect();
        rows.sort_by_key(|a| (a.registered, a.id));

        Ok(rows
            .into_iter()
            .map(|row| Account::from_row(row.clone(), tables.last_transaction(row.id)))
            .collect())
    }

    async fn deposit(&self, account_id: i64, amount: i64) -> Result<AccountRow, LedgerError> {
        let mut tables = self.tables.lock().await;
        let account = tables
            .accounts
            .get_mut(&account_id)
            .ok_or(LedgerError::AccountNotFound(account_id))?;

        account.amount = account
            .amount
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Storage(anyhow::anyhow!("balance overflow")))?;
        Ok(account.clone())
    }

    async fn transfer(
        &self,
        sender_id: i64,
        receiver_id: i64,
        amount: i64,
    ) -> Result<Transaction, LedgerError> {
        let mut tables = self.tables.lock().await;

        let sender_balance = tables
            .accounts
            .get(&sender_id)
            .map(|a| a.amount)
            .ok_or(LedgerError::AccountNotFound(sender_id))?;
        if sender_balance < amount {
            return Err(LedgerError::InsufficientFunds);
        }
        let receiver_balance = tables
            .accounts
            .get(&receiver_id)
            .map(|a| a.amount)
            .ok_or(LedgerError::AccountNotFound(receiver_id))?;
        let credited = receiver_balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Storage(anyhow::anyhow!("balance overflow")))?;

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(sender) = tables.accounts.get_mut(&sender_id) {
            sender.amount = sender_balance - amount;
        }
        if let Some(receiver) = tables.accounts.get_mut(&receiver_id) {
            receiver.amount = credited;
        }

        tables.next_transaction_id += 1;
        let transaction = Transaction {
            id: tables.next_transaction_id,
            sender_id,
            receiver_id,
            amount,
            date: Utc::now(),
        };
        tables.transactions.push(transaction.clone());

        Ok(transaction)
    }

    async fn health_check(&self) -> Result<(), LedgerError> {
        Ok(())
    }
}

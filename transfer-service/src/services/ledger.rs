//! Account ledger: account opening, top-ups and owner-checked transfers.

use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::{Account, Transaction, ACCOUNT_ID_MAX, ACCOUNT_ID_MIN};
use crate::services::error::MIN_OPERATION_AMOUNT;
use crate::services::metrics::{ACCOUNTS_CREATED, DEPOSITS_TOTAL, TRANSFERS_TOTAL};
use crate::services::{LedgerError, LedgerStore};

/// Upper bound on account number draws before giving up.
pub const MAX_ID_ATTEMPTS: u32 = 32;

/// Produces candidate account numbers.
pub type IdSource = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Uniform draw from the 16-digit account number range.
pub fn random_account_id() -> i64 {
    rand::thread_rng().gen_range(ACCOUNT_ID_MIN..=ACCOUNT_ID_MAX)
}

#[derive(Clone)]
pub struct AccountLedger {
    store: Arc<dyn LedgerStore>,
    id_source: IdSource,
    operation_timeout: Duration,
}

impl AccountLedger {
    pub fn new(store: Arc<dyn LedgerStore>, operation_timeout: Duration) -> Self {
        Self {
            store,
            id_source: Arc::new(random_account_id),
            operation_timeout,
        }
    }

    pub fn with_id_source(mut self, id_source: IdSource) -> Self {
        self.id_source = id_source;
        self
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Runs one storage call under the operation timeout. The call's future
    /// is dropped on expiry, which rolls back any open SQL transaction.
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, LedgerError>
    where
        F: Future<Output = Result<T, LedgerError>>,
    {
        match tokio::time::timeout(self.operation_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    operation = operation,
                    timeout_ms = self.operation_timeout.as_millis() as u64,
                    "Ledger operation timed out"
                );
                Err(LedgerError::Timeout(self.operation_timeout))
            }
        }
    }

    /// Opens a zero-balance account under a fresh random number.
    pub async fn create_account(
        &self,
        owner_id: i64,
        national_id: &str,
    ) -> Result<Account, LedgerError> {
        let result = self.create_account_inner(owner_id, national_id).await;
        record(&ACCOUNTS_CREATED, &result);
        result
    }

    async fn create_account_inner(
        &self,
        owner_id: i64,
        national_id: &str,
    ) -> Result<Account, LedgerError> {
        for attempt in 1..=MAX_ID_ATTEMPTS {
            let id = (self.id_source)();

            if self
                .bounded("account_exists", self.store.account_exists(id))
                .await?
            {
                debug!(attempt = attempt, "Account number collision");
                continue;
            }

            // A concurrent insert can still take the number between the check
            // and the insert; that counts as one more collision.
            let inserted = self
                .bounded(
                    "insert_account",
                    self.store.insert_account(id, owner_id, national_id),
                )
                .await?;

            if let Some(row) = inserted {
                info!(account_id = row.id, owner_id = owner_id, "Account created");
                return Ok(row.into());
            }
        }

        warn!(owner_id = owner_id, "Account number space exhausted");
        Err(LedgerError::IdSpaceExhausted(MAX_ID_ATTEMPTS))
    }

    /// Adds `amount` to an account. Amounts of 150 or less are rejected.
    pub async fn deposit(&self, account_id: i64, amount: i64) -> Result<Account, LedgerError> {
        let result = self.deposit_inner(account_id, amount).await;
        record(&DEPOSITS_TOTAL, &result);
        result
    }

    async fn deposit_inner(&self, account_id: i64, amount: i64) -> Result<Account, LedgerError> {
        if amount <= MIN_OPERATION_AMOUNT {
            return Err(LedgerError::InvalidAmount);
        }

        let row = self
            .bounded("deposit", self.store.deposit(account_id, amount))
            .await?;

        info!(account_id = account_id, amount = amount, "Deposit applied");
        Ok(row.into())
    }

    /// Moves `amount` from `sender_id` to `receiver_id` on behalf of
    /// `requester`, who must own the sender account.
    pub async fn transfer(
        &self,
        requester: i64,
        sender_id: i64,
        receiver_id: i64,
        amount: i64,
    ) -> Result<Transaction, LedgerError> {
        let result = self
            .transfer_inner(requester, sender_id, receiver_id, amount)
            .await;

        if let Err(e) = &result {
            warn!(
                requester = requester,
                sender_id = sender_id,
                receiver_id = receiver_id,
                error = %e,
                "Transfer rejected"
            );
        }
        record(&TRANSFERS_TOTAL, &result);
        result
    }

    async fn transfer_inner(
        &self,
        requester: i64,
        sender_id: i64,
        receiver_id: i64,
        amount: i64,
    ) -> Result<Transaction, LedgerError> {
        let sender = self
            .bounded("find_account", self.store.find_account(sender_id))
            .await?;
        if !sender.is_some_and(|account| account.is_owned_by(requester)) {
            return Err(LedgerError::Unauthorized);
        }

        if sender_id == receiver_id {
            return Err(LedgerError::SameAccount);
        }

        if amount <= MIN_OPERATION_AMOUNT {
            return Err(LedgerError::InvalidAmount);
        }

        let transaction = self
            .bounded(
                "transfer",
                self.store.transfer(sender_id, receiver_id, amount),
            )
            .await?;

        info!(
            transaction_id = transaction.id,
            sender_id = sender_id,
            receiver_id = receiver_id,
            amount = amount,
            "Transfer completed"
        );
        Ok(transaction)
    }

    pub async fn get_accounts(&self, owner_id: i64) -> Result<Vec<Account>, LedgerError> {
        self.bounded("list_accounts", self.store.list_accounts(owner_id))
            .await
    }

    pub async fn find_account(&self, id: i64) -> Result<Option<Account>, LedgerError> {
        let row = self
            .bounded("find_account", self.store.find_account(id))
            .await?;
        Ok(row.map(Account::from))
    }
}

fn record<T>(counter: &prometheus::CounterVec, result: &Result<T, LedgerError>) {
    let status = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    counter.with_label_values(&[status]).inc();
}

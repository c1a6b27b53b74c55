//! Database service for transfer-service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, Postgres};
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::models::{Account, AccountRow, Transaction};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::LedgerError;

/// Transactional storage behind the account ledger.
///
/// `deposit` and `transfer` are each one serializable unit: either every
/// write lands or none does.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn account_exists(&self, id: i64) -> Result<bool, LedgerError>;

    /// Inserts a zero-balance account. `Ok(None)` means the id is taken.
    async fn insert_account(
        &self,
        id: i64,
        owner_id: i64,
        national_id: &str,
    ) -> Result<Option<AccountRow>, LedgerError>;

    async fn find_account(&self, id: i64) -> Result<Option<AccountRow>, LedgerError>;

    /// Accounts of one owner, each with its most recent transaction.
    async fn list_accounts(&self, owner_id: i64) -> Result<Vec<Account>, LedgerError>;

    async fn deposit(&self, account_id: i64, amount: i64) -> Result<AccountRow, LedgerError>;

    /// Locks both accounts, checks funds and receiver, moves the money and
    /// appends the transaction record.
    async fn transfer(
        &self,
        sender_id: i64,
        receiver_id: i64,
        amount: i64,
    ) -> Result<Transaction, LedgerError>;

    async fn health_check(&self) -> Result<(), LedgerError>;
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "transfer-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, LedgerError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| LedgerError::Storage(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), LedgerError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| LedgerError::Storage(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    async fn lock_account(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<Option<AccountRow>, LedgerError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts WHERE id = $1 FOR UPDATE",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row)
    }

    async fn transfer_in_tx(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        sender_id: i64,
        receiver_id: i64,
        amount: i64,
    ) -> Result<Transaction, LedgerError> {
        // Row locks are always taken in ascending id order.
        let (first, second) = if sender_id < receiver_id {
            (sender_id, receiver_id)
        } else {
            (receiver_id, sender_id)
        };
        let first_row = Self::lock_account(tx, first).await?;
        let second_row = Self::lock_account(tx, second).await?;

        let (sender, receiver) = if first == sender_id {
            (first_row, second_row)
        } else {
            (second_row, first_row)
        };

        let sender = sender.ok_or(LedgerError::AccountNotFound(sender_id))?;
        if sender.amount < amount {
            return Err(LedgerError::InsufficientFunds);
        }
        if receiver.is_none() {
            return Err(LedgerError::AccountNotFound(receiver_id));
        }

        sqlx::query("UPDATE accounts SET amount = amount - $1 WHERE id = $2")
            .bind(amount)
            .bind(sender_id)
            .execute(&mut **tx)
            .await?;

        sqlx::query("UPDATE accounts SET amount = amount + $1 WHERE id = $2")
            .bind(amount)
            .bind(receiver_id)
            .execute(&mut **tx)
            .await?;

        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (sender_id, receiver_id, amount, date)
            VALUES ($1, $2, $3, $4)
            RETURNING id, sender_id, receiver_id, amount, date
            "#,
        )
        .bind(sender_id)
        .bind(receiver_id)
        .bind(amount)
        .bind(Utc::now())
        .fetch_one(&mut **tx)
        .await?;

        Ok(transaction)
    }
}

const ACCOUNT_COLUMNS: &str = "id, owner_id, national_id, amount, registered";

/// Account joined with its latest transaction, if any.
#[derive(FromRow)]
struct AccountWithLastTransaction {
    id: i64,
    owner_id: i64,
    national_id: String,
    amount: i64,
    registered: DateTime<Utc>,
    tx_id: Option<i64>,
    tx_sender_id: Option<i64>,
    tx_receiver_id: Option<i64>,
    tx_amount: Option<i64>,
    tx_date: Option<DateTime<Utc>>,
}

impl From<AccountWithLastTransaction> for Account {
    fn from(row: AccountWithLastTransaction) -> Self {
        let last_transaction = match (
            row.tx_id,
            row.tx_sender_id,
            row.tx_receiver_id,
            row.tx_amount,
            row.tx_date,
        ) {
            (Some(id), Some(sender_id), Some(receiver_id), Some(amount), Some(date)) => {
                Some(Transaction {
                    id,
                    sender_id,
                    receiver_id,
                    amount,
                    date,
                })
            }
            _ => None,
        };

        Account::from_row(
            AccountRow {
                id: row.id,
                owner_id: row.owner_id,
                national_id: row.national_id,
                amount: row.amount,
                registered: row.registered,
            },
            last_transaction,
        )
    }
}

#[async_trait]
impl LedgerStore for Database {
    #[instrument(skip(self))]
    async fn account_exists(&self, id: i64) -> Result<bool, LedgerError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["account_exists"])
            .start_timer();

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM accounts WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        timer.observe_duration();
        Ok(exists)
    }

    #[instrument(skip(self, national_id))]
    async fn insert_account(
        &self,
        id: i64,
        owner_id: i64,
        national_id: &str,
    ) -> Result<Option<AccountRow>, LedgerError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_account"])
            .start_timer();

        let result = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            INSERT INTO accounts (id, owner_id, national_id, amount, registered)
            VALUES ($1, $2, $3, 0, $4)
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .bind(owner_id)
        .bind(national_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        timer.observe_duration();

        match result {
            Ok(row) => Ok(Some(row)),
            Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
                warn!(account_id = id, "Account number already taken");
                Ok(None)
            }
            Err(e) => Err(LedgerError::Storage(anyhow::anyhow!(
                "Failed to create account: {}",
                e
            ))),
        }
    }

    #[instrument(skip(self))]
    async fn find_account(&self, id: i64) -> Result<Option<AccountRow>, LedgerError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_account"])
            .start_timer();

        let account = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts WHERE id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        timer.observe_duration();
        Ok(account)
    }

    #[instrument(skip(self))]
    async fn list_accounts(&self, owner_id: i64) -> Result<Vec<Account>, LedgerError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_accounts"])
            .start_timer();

        let rows = sqlx::query_as::<_, AccountWithLastTransaction>(
            r#"
            SELECT a.id, a.owner_id, a.national_id, a.amount, a.registered,
                   t.id AS tx_id, t.sender_id AS tx_sender_id, t.receiver_id AS tx_receiver_id,
                   t.amount AS tx_amount, t.date AS tx_date
            FROM accounts a
            LEFT JOIN LATERAL (
                SELECT id, sender_id, receiver_id, amount, date
                FROM transactions
                WHERE sender_id = a.id OR receiver_id = a.id
                ORDER BY date DESC, id DESC
                LIMIT 1
            ) t ON TRUE
            WHERE a.owner_id = $1
            ORDER BY a.registered, a.id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        timer.observe_duration();
        Ok(rows.into_iter().map(Account::from).collect())
    }

    #[instrument(skip(self))]
    async fn deposit(&self, account_id: i64, amount: i64) -> Result<AccountRow, LedgerError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["deposit"])
            .start_timer();

        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "UPDATE accounts SET amount = amount + $1 WHERE id = $2 RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(amount)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        timer.observe_duration();
        row.ok_or(LedgerError::AccountNotFound(account_id))
    }

    #[instrument(skip(self))]
    async fn transfer(
        &self,
        sender_id: i64,
        receiver_id: i64,
        amount: i64,
    ) -> Result<Transaction, LedgerError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["transfer"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            LedgerError::Storage(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let transaction = match Self::transfer_in_tx(&mut tx, sender_id, receiver_id, amount).await
        {
            Ok(transaction) => transaction,
            Err(e) => {
                tx.rollback().await.ok();
                return Err(e);
            }
        };

        tx.commit().await.map_err(|e| {
            LedgerError::Storage(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(
            transaction_id = transaction.id,
            sender_id = sender_id,
            receiver_id = receiver_id,
            "Transfer committed"
        );

        Ok(transaction)
    }

    async fn health_check(&self) -> Result<(), LedgerError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| LedgerError::Storage(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }
}

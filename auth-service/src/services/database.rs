//! User storage: Postgres in production, in-memory for tests.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, instrument};

use crate::models::{NewUser, User};
use crate::services::ServiceError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts the user with role `user`. A taken email is `UserAlreadyExists`.
    async fn create_user(&self, new_user: &NewUser) -> Result<User, ServiceError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, ServiceError>;

    async fn health_check(&self) -> Result<(), ServiceError>;
}

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "auth-service"))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, ServiceError> {
        info!(max_connections = max_connections, "Connecting to PostgreSQL");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .max_lifetime(Duration::from_secs(300))
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await
            .map_err(|e| ServiceError::Database(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), ServiceError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ServiceError::Database(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

const USER_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, national_id, phone, registered, role";

#[async_trait]
impl UserRepository for Database {
    #[instrument(skip(self, new_user))]
    async fn create_user(&self, new_user: &NewUser) -> Result<User, ServiceError> {
        let query = format!(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, national_id, phone, registered, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'user')
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(&new_user.national_id)
            .bind(&new_user.phone)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                    ServiceError::UserAlreadyExists
                }
                _ => ServiceError::Database(anyhow::anyhow!("Failed to create user: {}", e)),
            })?;

        info!(user_id = user.id, "User created");
        Ok(user)
    }

    #[instrument(skip(self, email))]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ServiceError::Database(anyhow::anyhow!(e)))
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, ServiceError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ServiceError::Database(anyhow::anyhow!(e)))
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                ServiceError::Database(anyhow::anyhow!("Database health check failed: {}", e))
            })?;
        Ok(())
    }
}

#[derive(Default)]
struct UserTable {
    next_id: i64,
    by_id: HashMap<i64, User>,
}

/// Mutex-guarded user table with the same uniqueness rules as Postgres.
#[derive(Default)]
pub struct InMemoryUserRepository {
    table: Mutex<UserTable>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, UserTable>, ServiceError> {
        self.table
            .lock()
            .map_err(|e| ServiceError::Database(anyhow::anyhow!("User table mutex poisoned: {}", e)))
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, new_user: &NewUser) -> Result<User, ServiceError> {
        let mut table = self.lock()?;

        if table.by_id.values().any(|u| u.email == new_user.email) {
            return Err(ServiceError::UserAlreadyExists);
        }

        table.next_id += 1;
        let user = User {
            id: table.next_id,
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            national_id: new_user.national_id.clone(),
            phone: new_user.phone.clone(),
            registered: Utc::now(),
            role_code: "user".to_string(),
        };
        table.by_id.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        Ok(self
            .lock()?
            .by_id
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, ServiceError> {
        Ok(self.lock()?.by_id.get(&id).cloned())
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}

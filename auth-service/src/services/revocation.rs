//! Single current refresh token per user, with expiry.

use async_trait::async_trait;
use dashmap::DashMap;
use redis::{aio::ConnectionManager, Client};
use std::time::Duration;
use subtle::ConstantTimeEq;
use tokio::time::Instant;

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Replaces whatever token the user had; the entry lives for `ttl`.
    async fn put(&self, user_id: i64, token: &str, ttl: Duration) -> Result<(), anyhow::Error>;

    async fn get(&self, user_id: i64) -> Result<Option<String>, anyhow::Error>;

    /// Whether `candidate` is exactly the stored token. Expired and never
    /// issued entries both answer `false`.
    async fn is_current(&self, user_id: i64, candidate: &str) -> Result<bool, anyhow::Error> {
        let current = self.get(user_id).await?;
        Ok(current
            .map(|token| bool::from(token.as_bytes().ct_eq(candidate.as_bytes())))
            .unwrap_or(false))
    }

    async fn health_check(&self) -> Result<(), anyhow::Error>;
}

fn refresh_key(user_id: i64) -> String {
    format!("refresh_token:user:{}", user_id)
}

#[derive(Clone)]
pub struct RedisRefreshStore {
    _client: Client,
    manager: ConnectionManager,
}

impl RedisRefreshStore {
    pub async fn new(config: &crate::config::RedisConfig) -> Result<Self, anyhow::Error> {
        tracing::info!("Connecting to Redis");
        let client = Client::open(config.url.clone())?;

        // Use ConnectionManager for automatic reconnection
        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!("Failed to get Redis connection manager: {}", e);
            anyhow::anyhow!("Failed to connect to Redis: {}", e)
        })?;

        tracing::info!("Successfully connected to Redis");

        Ok(Self {
            _client: client,
            manager,
        })
    }
}

#[async_trait]
impl RefreshTokenStore for RedisRefreshStore {
    async fn put(&self, user_id: i64, token: &str, ttl: Duration) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();

        redis::cmd("SET")
            .arg(refresh_key(user_id))
            .arg(token)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to store refresh token: {}", e))
    }

    async fn get(&self, user_id: i64) -> Result<Option<String>, anyhow::Error> {
        let mut conn = self.manager.clone();

        redis::cmd("GET")
            .arg(refresh_key(user_id))
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read refresh token: {}", e))
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Redis health check failed: {}", e))
    }
}

/// Process-local store for tests and single-node development. Expiry follows
/// the tokio clock, so paused-time tests can step past a TTL.
#[derive(Default)]
pub struct InMemoryRefreshStore {
    entries: DashMap<i64, (String, Instant)>,
}

impl InMemoryRefreshStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshStore {
    async fn put(&self, user_id: i64, token: &str, ttl: Duration) -> Result<(), anyhow::Error> {
        self.entries
            .insert(user_id, (token.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn get(&self, user_id: i64) -> Result<Option<String>, anyhow::Error> {
        let now = Instant::now();
        let expired = match self.entries.get(&user_id) {
            Some(entry) if entry.1 > now => return Ok(Some(entry.0.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove_if(&user_id, |_, (_, expires_at)| *expires_at <= now);
        }
        Ok(None)
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }
}

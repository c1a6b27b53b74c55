//! Configuration module for transfer-service.

use service_core::config::{self as core_config, TokenConfig};
use service_core::error::AppError;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct TransferConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub tokens: TokenConfig,
    /// Upper bound on every ledger storage call.
    pub operation_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl TransferConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let config = Self {
            common,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "transfer-service".to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| {
                    AppError::ConfigError(anyhow::anyhow!("DATABASE_URL is required"))
                })?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(25),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            },
            tokens: TokenConfig::from_env()?,
            operation_timeout: Duration::from_millis(parse_timeout_ms(
                env::var("LEDGER_OPERATION_TIMEOUT_MS").ok().as_deref(),
            )?),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.database.max_connections == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_MAX_CONNECTIONS must be positive"
            )));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_MIN_CONNECTIONS must not exceed DATABASE_MAX_CONNECTIONS"
            )));
        }

        if self.operation_timeout.is_zero() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "LEDGER_OPERATION_TIMEOUT_MS must be positive"
            )));
        }

        self.tokens.validate()
    }
}

fn parse_timeout_ms(raw: Option<&str>) -> Result<u64, AppError> {
    match raw {
        None => Ok(5000),
        Some(value) => value.parse().map_err(|e: std::num::ParseIntError| {
            AppError::ConfigError(anyhow::anyhow!("LEDGER_OPERATION_TIMEOUT_MS: {}", e))
        }),
    }
}

//! Configuration module for auth-service.

use service_core::config::{self as core_config, TokenConfig};
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub tokens: TokenConfig,
}

/// Deployment mode. In production every setting must be given explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Backing store for the refresh-token cache.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

/// Reads settings from the process environment, honouring the
/// production rule that defaults are not applied.
struct EnvReader {
    environment: Environment,
}

impl EnvReader {
    fn lookup(&self, key: &str, default: Option<&str>) -> Result<String, AppError> {
        match (env::var(key), default) {
            (Ok(value), _) => Ok(value),
            (Err(_), Some(default)) if self.environment == Environment::Dev => {
                Ok(default.to_string())
            }
            (Err(_), _) => Err(AppError::ConfigError(anyhow::anyhow!(
                "{} must be set ({:?} environment)",
                key,
                self.environment
            ))),
        }
    }

    fn number(&self, key: &str, default: &str) -> Result<u32, AppError> {
        self.lookup(key, Some(default))?
            .parse()
            .map_err(|e: std::num::ParseIntError| {
                AppError::ConfigError(anyhow::anyhow!("{}: {}", key, e))
            })
    }
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let environment = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "dev".to_string())
            .parse::<Environment>()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;
        let reader = EnvReader { environment };

        let config = AuthConfig {
            common,
            environment,
            service_name: reader.lookup("SERVICE_NAME", Some("auth-service"))?,
            service_version: reader
                .lookup("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")))?,
            log_level: reader.lookup("LOG_LEVEL", Some("info"))?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            database: DatabaseConfig {
                url: reader.lookup("DATABASE_URL", None)?,
                max_connections: reader.number("DATABASE_MAX_CONNECTIONS", "25")?,
            },
            redis: RedisConfig {
                url: reader.lookup("REDIS_URL", None)?,
            },
            tokens: TokenConfig::from_env()?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "port must be non-zero"
            )));
        }

        if self.database.max_connections == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_MAX_CONNECTIONS must be positive"
            )));
        }

        self.tokens.validate()
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "prod" | "production" => Ok(Environment::Prod),
            other => Err(format!("unknown environment {:?}", other)),
        }
    }
}

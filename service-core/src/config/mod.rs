use crate::error::AppError;
use config::{Config as Cfg, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "configuration".to_string());

        let config = Cfg::builder()
            .add_source(File::with_name(&config_path).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

/// Signing secrets and lifetimes for the access/refresh token pair.
///
/// Both services load the same values: the auth service signs with them and
/// the transfer service verifies access tokens with `access_secret`.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: SecretString,
    pub refresh_secret: SecretString,
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
}

impl TokenConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let config = Self {
            access_secret: SecretString::new(required_env("ACCESS_TOKEN_SECRET")?),
            refresh_secret: SecretString::new(required_env("REFRESH_TOKEN_SECRET")?),
            access_ttl_seconds: parse_env("ACCESS_TOKEN_TTL_SECONDS", 600)?,
            refresh_ttl_seconds: parse_env("REFRESH_TOKEN_TTL_SECONDS", 3600)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.access_secret.expose_secret().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "ACCESS_TOKEN_SECRET must not be empty"
            )));
        }

        if self.refresh_secret.expose_secret().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "REFRESH_TOKEN_SECRET must not be empty"
            )));
        }

        // Access tokens must never verify as refresh tokens.
        if self.access_secret.expose_secret() == self.refresh_secret.expose_secret() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ"
            )));
        }

        if self.access_ttl_seconds <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "ACCESS_TOKEN_TTL_SECONDS must be positive"
            )));
        }

        if self.refresh_ttl_seconds <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "REFRESH_TOKEN_TTL_SECONDS must be positive"
            )));
        }

        Ok(())
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_seconds as u64)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_seconds as u64)
    }
}

fn required_env(key: &str) -> Result<String, AppError> {
    env::var(key)
        .map_err(|_| AppError::ConfigError(anyhow::anyhow!("{} is required but not set", key)))
}

fn parse_env(key: &str, default: i64) -> Result<i64, AppError> {
    match env::var(key) {
        Ok(val) => val.parse().map_err(|e: std::num::ParseIntError| {
            AppError::ConfigError(anyhow::anyhow!("{}: {}", key, e))
        }),
        Err(_) => Ok(default),
    }
}

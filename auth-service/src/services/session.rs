//! Login, access validation and refresh-token rotation.

use once_cell::sync::Lazy;
use service_core::auth::{Identity, TokenError, TokenPair};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use validator::Validate;

use crate::dtos::auth::SignupRequest;
use crate::models::{NewUser, User};
use crate::services::{metrics, JwtService, RefreshTokenStore, ServiceError, UserRepository};
use crate::utils::{hash_password, verify_password, Password, PasswordHashString};

/// Hash checked against when the email is unknown, so both failure paths
/// cost one verification.
static DUMMY_HASH: Lazy<Option<PasswordHashString>> = Lazy::new(|| {
    hash_password(&Password::new("dummy-password-for-timing".to_string())).ok()
});

#[derive(Clone)]
pub struct SessionManager {
    users: Arc<dyn UserRepository>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    jwt: JwtService,
}

impl SessionManager {
    pub fn new(
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        jwt: JwtService,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            jwt,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.jwt.access_ttl()
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.jwt.refresh_ttl()
    }

    #[instrument(skip(self, req))]
    pub async fn signup(&self, req: SignupRequest) -> Result<User, ServiceError> {
        req.validate()
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        let password_hash = hash_password(&Password::new(req.password))
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!(e)))?;

        let user = self
            .users
            .create_user(&NewUser {
                email: req.email,
                password_hash: password_hash.into_string(),
                first_name: req.first_name,
                last_name: req.last_name,
                national_id: req.national_id,
                phone: req.phone,
            })
            .await?;

        tracing::info!(user_id = user.id, "User registered");
        Ok(user)
    }

    /// Checks the credentials. An unknown email and a wrong password both
    /// yield `UserNotFound`.
    #[instrument(skip(self, email, password))]
    pub async fn authenticate(
        &self,
        email: &str,
        password: &Password,
    ) -> Result<Identity, ServiceError> {
        let user = self.users.find_by_email(email).await?;

        let user = match user {
            Some(user) => user,
            None => {
                if let Some(dummy) = DUMMY_HASH.as_ref() {
                    let _ = verify_password(password, dummy);
                }
                tracing::warn!("Login rejected");
                metrics::record_rejection("login");
                return Err(ServiceError::UserNotFound);
            }
        };

        // An unusable stored hash is rejected like a wrong password.
        let matches = verify_password(
            password,
            &PasswordHashString::new(user.password_hash.clone()),
        )
        .unwrap_or_else(|e| {
            tracing::error!(user_id = user.id, error = %e, "Stored password hash is unusable");
            false
        });

        if !matches {
            tracing::warn!("Login rejected");
            metrics::record_rejection("login");
            return Err(ServiceError::UserNotFound);
        }

        user.identity().ok_or_else(|| {
            ServiceError::Internal(anyhow::anyhow!(
                "user {} has unknown role {:?}",
                user.id,
                user.role_code
            ))
        })
    }

    pub async fn login(
        &self,
        email: &str,
        password: &Password,
    ) -> Result<(Identity, TokenPair), ServiceError> {
        let identity = self.authenticate(email, password).await?;
        let pair = self.issue_token_pair(&identity).await?;

        tracing::info!(user_id = identity.id, "User logged in");
        metrics::record_issued("login");
        Ok((identity, pair))
    }

    /// Mints a new pair and makes its refresh token the only current one for
    /// the user. Nothing is returned unless both steps succeed.
    #[instrument(skip(self, identity), fields(user_id = identity.id))]
    pub async fn issue_token_pair(&self, identity: &Identity) -> Result<TokenPair, ServiceError> {
        let pair = self.jwt.generate_token_pair(identity).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign tokens");
            ServiceError::TokenCreation
        })?;

        self.refresh_tokens
            .put(identity.id, &pair.refresh_token, self.jwt.refresh_ttl())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to store refresh token");
                ServiceError::TokenCreation
            })?;

        Ok(pair)
    }

    pub fn validate_access(&self, token: &str) -> Result<Identity, ServiceError> {
        match self.jwt.validate_access_token(token) {
            Ok(claims) => Ok(claims.identity()),
            Err(TokenError::Expired) => Err(ServiceError::TokenExpired),
            Err(_) => {
                metrics::record_rejection("access");
                Err(ServiceError::InvalidToken)
            }
        }
    }

    /// Rotates the pair. The presented refresh token must be the one most
    /// recently issued for its user.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ServiceError> {
        let claims = match self.jwt.validate_refresh_token(refresh_token) {
            Ok(claims) => claims,
            Err(TokenError::Expired) => return Err(ServiceError::TokenExpired),
            Err(e) => {
                tracing::warn!(error = %e, "Refresh token rejected");
                metrics::record_rejection("refresh");
                return Err(ServiceError::InvalidToken);
            }
        };

        let current = self
            .refresh_tokens
            .is_current(claims.id, refresh_token)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to read refresh token");
                ServiceError::Cache(e)
            })?;

        if !current {
            tracing::warn!(user_id = claims.id, "Refresh token is not current");
            metrics::record_rejection("refresh");
            return Err(ServiceError::InvalidToken);
        }

        let pair = self.issue_token_pair(&claims.identity()).await?;

        tracing::info!(user_id = claims.id, "Refresh token rotated");
        metrics::record_issued("refresh");
        Ok(pair)
    }

    pub async fn user_data(&self, id: i64) -> Result<User, ServiceError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::UserNotFound)
    }
}

use service_core::auth::{Claims, Identity, TokenCodec, TokenError, TokenPair};
use service_core::config::TokenConfig;
use std::time::Duration;

/// Signs and verifies the access/refresh pair, each under its own secret.
#[derive(Clone)]
pub struct JwtService {
    access: TokenCodec,
    refresh: TokenCodec,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtService {
    pub fn new(config: &TokenConfig) -> Self {
        tracing::info!(
            access_ttl_seconds = config.access_ttl_seconds,
            refresh_ttl_seconds = config.refresh_ttl_seconds,
            "JWT service initialized with HS256 secrets"
        );

        Self {
            access: TokenCodec::new(&config.access_secret),
            refresh: TokenCodec::new(&config.refresh_secret),
            access_ttl: config.access_ttl(),
            refresh_ttl: config.refresh_ttl(),
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Generate both access and refresh tokens
    pub fn generate_token_pair(&self, identity: &Identity) -> Result<TokenPair, TokenError> {
        let access_token = self
            .access
            .encode(&Claims::for_identity(identity, self.access_ttl))?;
        let refresh_token = self
            .refresh
            .encode(&Claims::for_identity(identity, self.refresh_ttl))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    pub fn validate_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.access.decode(token)
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.refresh.decode(token)
    }

    /// Codec for services that only verify access tokens.
    pub fn access_codec(&self) -> TokenCodec {
        self.access.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use service_core::auth::Role;

    fn service() -> JwtService {
        JwtService::new(&TokenConfig {
            access_secret: SecretString::new("access-secret".to_string()),
            refresh_secret: SecretString::new("refresh-secret".to_string()),
            access_ttl_seconds: 600,
            refresh_ttl_seconds: 3600,
        })
    }

    fn identity() -> Identity {
        Identity {
            id: 3,
            role: Role::Admin,
            national_id: None,
        }
    }

    #[test]
    fn test_pair_tokens_only_verify_under_their_own_secret() {
        let jwt = service();
        let pair = jwt.generate_token_pair(&identity()).unwrap();

        assert!(jwt.validate_access_token(&pair.access_token).is_ok());
        assert!(jwt.validate_refresh_token(&pair.refresh_token).is_ok());
        assert_eq!(
            jwt.validate_access_token(&pair.refresh_token),
            Err(TokenError::Signature)
        );
        assert_eq!(
            jwt.validate_refresh_token(&pair.access_token),
            Err(TokenError::Signature)
        );
    }

    #[test]
    fn test_lifetimes_follow_config() {
        let jwt = service();
        let pair = jwt.generate_token_pair(&identity()).unwrap();

        let access = jwt.validate_access_token(&pair.access_token).unwrap();
        let refresh = jwt.validate_refresh_token(&pair.refresh_token).unwrap();

        assert_eq!(access.exp - access.iat, 600);
        assert_eq!(refresh.exp - refresh.iat, 3600);
        assert_eq!(access.identity(), identity());
    }
}

use thiserror::Error;

/// Why a token failed to encode or decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token signature or structure is invalid")]
    Signature,

    #[error("token claims are invalid: {0}")]
    Claim(String),

    #[error("token has expired")]
    Expired,

    #[error("failed to encode token: {0}")]
    Encoding(String),
}

/// Failure of the request-level access check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no credential supplied")]
    MissingCredential,

    #[error("authorization header is malformed")]
    MalformedHeader,

    #[error("credential has expired")]
    Expired,

    #[error("credential is invalid")]
    Invalid,
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::Expired,
            _ => AuthError::Invalid,
        }
    }
}

use chrono::Utc;
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashSet;

use super::{Claims, TokenError};

/// HS256 signer/verifier bound to one secret.
///
/// Access and refresh tokens each get their own codec so a token signed for
/// one audience never verifies under the other.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();

        // Expiry is checked by hand after the claim set has been parsed, so
        // that structural problems are never reported as expiry.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();

        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            validation,
        }
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let header = decode_header(token).map_err(|_| TokenError::Signature)?;
        if header.alg != Algorithm::HS256 {
            return Err(TokenError::Signature);
        }

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::Json(err) => TokenError::Claim(err.to_string()),
                ErrorKind::MissingRequiredClaim(claim) => {
                    TokenError::Claim(format!("missing claim {}", claim))
                }
                _ => TokenError::Signature,
            }
        })?;

        if data.claims.exp < Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}

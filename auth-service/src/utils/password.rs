use argon2::{
    password_hash::{self, rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

/// Plaintext credential as submitted by a user. Never printed.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(..)")
    }
}

/// PHC-format hash as stored in the `users.password_hash` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hashing(String),

    #[error("stored password hash is malformed: {0}")]
    CorruptHash(String),
}

fn hasher() -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default())
}

/// Salted Argon2id hash of `password`.
pub fn hash_password(password: &Password) -> Result<PasswordHashString, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    hasher()
        .hash_password(password.as_str().as_bytes(), &salt)
        .map(|hash| PasswordHashString::new(hash.to_string()))
        .map_err(|e| PasswordError::Hashing(e.to_string()))
}

/// `Ok(false)` on mismatch. Parameters are taken from the stored hash, so
/// hashes made with older settings still verify.
pub fn verify_password(
    password: &Password,
    stored: &PasswordHashString,
) -> Result<bool, PasswordError> {
    let parsed =
        PasswordHash::new(stored.as_str()).map_err(|e| PasswordError::CorruptHash(e.to_string()))?;

    match hasher().verify_password(password.as_str().as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::CorruptHash(e.to_string())),
    }
}

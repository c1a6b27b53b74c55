//! User accounts as stored in Postgres.

use chrono::{DateTime, Utc};
use serde::Serialize;
use service_core::auth::{Identity, Role};
use sqlx::FromRow;

/// User entity. `password_hash` is always an Argon2 PHC string.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
    pub phone: String,
    pub registered: DateTime<Utc>,
    #[sqlx(rename = "role")]
    pub role_code: String,
}

impl User {
    pub fn role(&self) -> Option<Role> {
        self.role_code.parse().ok()
    }

    /// Identity carried in tokens issued for this user.
    pub fn identity(&self) -> Option<Identity> {
        Some(Identity {
            id: self.id,
            role: self.role()?,
            national_id: Some(self.national_id.clone()),
        })
    }
}

/// Validated signup input with the password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub national_id: String,
    pub phone: String,
}

/// Profile returned to clients; never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserProfile {
    #[serde(rename = "ID")]
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(rename = "IIN")]
    pub national_id: String,
    pub phone: String,
    pub registered: DateTime<Utc>,
    pub role: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            national_id: user.national_id,
            phone: user.phone,
            registered: user.registered,
            role: user.role_code,
        }
    }
}

//! HTTP handlers for auth-service.

pub mod auth;
pub mod metrics;
pub mod user;

pub use auth::*;
pub use user::*;

//! Services layer for auth-service.

mod database;
pub mod error;
mod jwt;
pub mod metrics;
pub mod revocation;
mod session;

pub use database::{Database, InMemoryUserRepository, UserRepository};
pub use error::ServiceError;
pub use jwt::JwtService;
pub use revocation::{InMemoryRefreshStore, RedisRefreshStore, RefreshTokenStore};
pub use session::SessionManager;

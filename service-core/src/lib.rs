//! service-core: Shared infrastructure for the auth and transfer services.
pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;

pub use axum;
pub use axum_extra;
pub use secrecy;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tower;
pub use tower_http;
pub use tracing;
pub use validator;

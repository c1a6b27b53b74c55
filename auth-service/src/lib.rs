pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

use service_core::axum::{
    extract::State,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use service_core::auth::AuthError;
use service_core::error::AppError;
use service_core::middleware::{
    http_request_span, identity_middleware, request_id_middleware, security_headers_middleware,
    AccessVerifier, CredentialSource,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::services::{JwtService, RefreshTokenStore, SessionManager, UserRepository};

#[derive(Clone)]
pub struct AppState {
    pub service_name: String,
    pub service_version: String,
    pub sessions: SessionManager,
    pub users: Arc<dyn UserRepository>,
    pub refresh_tokens: Arc<dyn RefreshTokenStore>,
    pub verifier: Arc<AccessVerifier>,
}

impl AppState {
    pub fn new(
        service_name: &str,
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        jwt: JwtService,
    ) -> Self {
        let verifier = Arc::new(
            AccessVerifier::new(jwt.access_codec(), CredentialSource::BearerHeader)
                .with_rejection_hook(Arc::new(|_: &AuthError| {
                    services::metrics::record_rejection("access")
                })),
        );

        Self {
            service_name: service_name.to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            sessions: SessionManager::new(users.clone(), refresh_tokens.clone(), jwt),
            users,
            refresh_tokens,
            verifier,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/user-data", post(handlers::user_data))
        .layer(from_fn_with_state(
            state.verifier.clone(),
            identity_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route("/signup", post(handlers::signup))
        .route("/login", post(handlers::login))
        .route("/update-token", post(handlers::update_token))
        .merge(protected)
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(http_request_span))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
}

/// Service health check
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.users.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Database health check failed");
        AppError::from(e)
    })?;

    state.refresh_tokens.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Redis health check failed");
        AppError::CacheError(e)
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.service_name,
        "version": state.service_version,
        "checks": {
            "database": "up",
            "cache": "up"
        }
    })))
}

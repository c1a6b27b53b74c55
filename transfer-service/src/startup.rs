//! Application startup and lifecycle management.

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::auth::TokenCodec;
use service_core::error::AppError;
use service_core::middleware::{
    http_request_span, identity_middleware, request_id_middleware, security_headers_middleware,
    AccessVerifier, CredentialSource,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::TransferConfig;
use crate::handlers;
use crate::services::{init_metrics, AccountLedger, Database, LedgerStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service_name: String,
    pub service_version: String,
    pub ledger: AccountLedger,
    pub verifier: Arc<AccessVerifier>,
}

impl AppState {
    /// Access tokens are read from the `access_token` cookie.
    pub fn new(
        service_name: &str,
        store: Arc<dyn LedgerStore>,
        access_codec: TokenCodec,
        operation_timeout: Duration,
    ) -> Self {
        Self {
            service_name: service_name.to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            ledger: AccountLedger::new(store, operation_timeout),
            verifier: Arc::new(AccessVerifier::new(access_codec, CredentialSource::Cookie)),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/accounts",
            get(handlers::list_accounts).post(handlers::create_account),
        )
        .route("/transaction", post(handlers::transaction))
        .route("/increment", post(handlers::increment))
        .layer(from_fn_with_state(
            state.verifier.clone(),
            identity_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_handler))
        .merge(protected)
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(http_request_span))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Connects to Postgres, applies migrations and binds the HTTP port.
    pub async fn build(config: TransferConfig) -> Result<Self, AppError> {
        init_metrics();

        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            AppError::from(e)
        })?;

        db.run_migrations().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            AppError::from(e)
        })?;

        let state = AppState::new(
            &config.service_name,
            Arc::new(db),
            TokenCodec::new(&config.tokens.access_secret),
            config.operation_timeout,
        );

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until the listener fails or the task is dropped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!(port = self.port, "HTTP server listening");
        axum::serve(self.listener, build_router(self.state)).await
    }
}

//! Test helpers for auth-service integration tests.

#![allow(dead_code)]

use auth_service::{
    dtos::auth::SignupRequest,
    models::User,
    services::{InMemoryRefreshStore, InMemoryUserRepository, JwtService, SessionManager},
    AppState,
};
use secrecy::SecretString;
use service_core::config::TokenConfig;
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

pub const PASSWORD: &str = "correct-horse";

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,auth_service=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn token_config() -> TokenConfig {
    TokenConfig {
        access_secret: SecretString::new("test-access-secret".to_string()),
        refresh_secret: SecretString::new("test-refresh-secret".to_string()),
        access_ttl_seconds: 600,
        refresh_ttl_seconds: 3600,
    }
}

pub struct TestApp {
    pub state: AppState,
    pub users: Arc<InMemoryUserRepository>,
    pub refresh_tokens: Arc<InMemoryRefreshStore>,
    pub jwt: JwtService,
}

impl TestApp {
    pub fn sessions(&self) -> &SessionManager {
        &self.state.sessions
    }
}

/// App state backed by in-memory user and refresh-token stores.
pub fn spawn_app() -> TestApp {
    init_tracing();

    let users = Arc::new(InMemoryUserRepository::new());
    let refresh_tokens = Arc::new(InMemoryRefreshStore::new());
    let jwt = JwtService::new(&token_config());

    let state = AppState::new(
        "auth-service-test",
        users.clone(),
        refresh_tokens.clone(),
        jwt.clone(),
    );

    TestApp {
        state,
        users,
        refresh_tokens,
        jwt,
    }
}

pub fn signup_request(email: &str) -> SignupRequest {
    SignupRequest {
        email: email.to_string(),
        password: PASSWORD.to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        national_id: "901231123456".to_string(),
        phone: "77011234567".to_string(),
    }
}

pub async fn register(app: &TestApp, email: &str) -> User {
    app.sessions()
        .signup(signup_request(email))
        .await
        .expect("Failed to register test user")
}

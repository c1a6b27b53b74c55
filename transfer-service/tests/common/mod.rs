//! Common test utilities for transfer-service integration tests.

#![allow(dead_code)]

use secrecy::SecretString;
use service_core::auth::{Claims, Identity, Role, TokenCodec};
use std::sync::{Arc, Once};
use std::time::Duration;
use transfer_service::services::{AccountLedger, InMemoryLedgerStore};
use transfer_service::startup::AppState;

static INIT: Once = Once::new();

pub const ALICE: i64 = 1;
pub const BOB: i64 = 2;
pub const ALICE_ACCOUNT: i64 = 1_000_000_000_000_001;
pub const BOB_ACCOUNT: i64 = 1_000_000_000_000_002;
pub const ALICE_NATIONAL_ID: &str = "900101123456";

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,transfer_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn access_codec() -> TokenCodec {
    TokenCodec::new(&SecretString::new("test-access-secret".to_string()))
}

pub fn access_token(id: i64, national_id: Option<&str>) -> String {
    let identity = Identity {
        id,
        role: Role::User,
        national_id: national_id.map(str::to_string),
    };
    access_codec()
        .encode(&Claims::for_identity(&identity, Duration::from_secs(600)))
        .expect("Failed to sign test token")
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<InMemoryLedgerStore>,
}

impl TestApp {
    pub fn ledger(&self) -> &AccountLedger {
        &self.state.ledger
    }
}

pub fn spawn_app_with_store(store: InMemoryLedgerStore, operation_timeout: Duration) -> TestApp {
    init_tracing();

    let store = Arc::new(store);
    let state = AppState::new(
        "transfer-service-test",
        store.clone(),
        access_codec(),
        operation_timeout,
    );

    TestApp { state, store }
}

/// Two owners with one account each: Alice holds 1000, Bob holds nothing.
pub async fn spawn_app() -> TestApp {
    let app = spawn_app_with_store(InMemoryLedgerStore::new(), Duration::from_secs(5));
    app.store
        .seed_account(ALICE_ACCOUNT, ALICE, ALICE_NATIONAL_ID, 1000)
        .await;
    app.store
        .seed_account(BOB_ACCOUNT, BOB, "910202123456", 0)
        .await;
    app
}

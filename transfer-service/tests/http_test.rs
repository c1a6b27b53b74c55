//! Router-level tests driven through `tower::ServiceExt::oneshot`.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use chrono::Utc;
use common::{
    access_codec, access_token, spawn_app, ALICE, ALICE_ACCOUNT, ALICE_NATIONAL_ID, BOB,
    BOB_ACCOUNT,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use service_core::auth::{Claims, Identity, Role};
use service_core::middleware::identity::ACCESS_TOKEN_COOKIE;
use std::time::Duration;
use tower::ServiceExt;
use transfer_service::startup::build_router;

fn cookie(token: &str) -> String {
    format!("{}={}", ACCESS_TOKEN_COOKIE, token)
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie(token))
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie(token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn expired_token(id: i64) -> String {
    let identity = Identity {
        id,
        role: Role::User,
        national_id: None,
    };
    let mut claims = Claims::for_identity(&identity, Duration::from_secs(600));
    claims.iat = Utc::now().timestamp() - 1200;
    claims.exp = Utc::now().timestamp() - 600;
    access_codec().encode(&claims).unwrap()
}

#[tokio::test]
async fn missing_cookie_redirects_to_login() {
    let app = build_router(spawn_app().await.state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/accounts")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");
}

#[tokio::test]
async fn expired_token_redirects_to_refresh() {
    let app = build_router(spawn_app().await.state);

    let response = app
        .oneshot(get("/accounts", &expired_token(ALICE)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/update-token");
}

#[tokio::test]
async fn forged_token_redirects_to_login() {
    let app = build_router(spawn_app().await.state);

    let response = app
        .oneshot(get("/accounts", "not.a.token"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");
}

#[tokio::test]
async fn list_accounts_returns_only_own_accounts() {
    let app = build_router(spawn_app().await.state);

    let response = app
        .oneshot(get("/accounts", &access_token(ALICE, Some(ALICE_NATIONAL_ID))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let accounts = body.as_array().unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0]["ID"], ALICE_ACCOUNT);
    assert_eq!(accounts[0]["amount"], 1000);
    assert_eq!(accounts[0]["lastTransaction"], Value::Null);
}

#[tokio::test]
async fn create_account_requires_matching_national_id() {
    let app = build_router(spawn_app().await.state);
    let token = access_token(ALICE, Some(ALICE_NATIONAL_ID));

    let response = app
        .clone()
        .oneshot(post(
            "/accounts",
            &token,
            json!({"nationalID": "000000000000"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(post(
            "/accounts",
            &token,
            json!({"nationalID": ALICE_NATIONAL_ID}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["ownerID"], ALICE);
    assert_eq!(body["amount"], 0);
}

#[tokio::test]
async fn token_without_national_id_cannot_open_accounts() {
    let app = build_router(spawn_app().await.state);

    let response = app
        .oneshot(post(
            "/accounts",
            &access_token(ALICE, None),
            json!({"nationalID": ALICE_NATIONAL_ID}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn transaction_endpoint_moves_money() {
    let test = spawn_app().await;
    let app = build_router(test.state.clone());

    let response = app
        .oneshot(post(
            "/transaction",
            &access_token(ALICE, Some(ALICE_NATIONAL_ID)),
            json!({"senderID": ALICE_ACCOUNT, "receiverID": BOB_ACCOUNT, "amount": 200}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["senderID"], ALICE_ACCOUNT);
    assert_eq!(body["amount"], 200);
    assert_eq!(test.store.balance(BOB_ACCOUNT).await, Some(200));
}

#[tokio::test]
async fn transaction_rejections_map_to_statuses() {
    let test = spawn_app().await;
    let app = build_router(test.state.clone());

    let response = app
        .clone()
        .oneshot(post(
            "/transaction",
            &access_token(BOB, None),
            json!({"senderID": ALICE_ACCOUNT, "receiverID": BOB_ACCOUNT, "amount": 200}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(post(
            "/transaction",
            &access_token(ALICE, None),
            json!({"senderID": ALICE_ACCOUNT, "receiverID": BOB_ACCOUNT, "amount": 150}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "amount must be higher than 150");

    assert_eq!(test.store.balance(ALICE_ACCOUNT).await, Some(1000));
}

#[tokio::test]
async fn increment_tops_up_account() {
    let test = spawn_app().await;
    let app = build_router(test.state.clone());

    let response = app
        .oneshot(post(
            "/increment",
            &access_token(BOB, None),
            json!({"accountID": BOB_ACCOUNT, "amount": 500}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["amount"], 500);
    assert_eq!(test.store.balance(BOB_ACCOUNT).await, Some(500));
}

#[tokio::test]
async fn health_and_metrics_are_public() {
    let app = build_router(spawn_app().await.state);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

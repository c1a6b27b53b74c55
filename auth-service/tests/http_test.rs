//! Router-level tests driven through `tower::ServiceExt::oneshot`.

mod common;

use auth_service::build_router;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use common::{register, spawn_app, PASSWORD};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_cookies(response: &axum::response::Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

async fn login(app: &Router) -> Value {
    let response = app
        .clone()
        .oneshot(json_request(
            "/login",
            json!({"Email": "ada@example.com", "Password": PASSWORD}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[tokio::test]
async fn signup_creates_user() {
    let test = spawn_app();
    let app = build_router(test.state.clone());

    let response = app
        .clone()
        .oneshot(json_request(
            "/signup",
            json!({
                "Email": "ada@example.com",
                "Password": PASSWORD,
                "FirstName": "Ada",
                "LastName": "Lovelace",
                "IIN": "901231123456",
                "Phone": "77011234567"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let duplicate = app
        .oneshot(json_request(
            "/signup",
            json!({
                "Email": "ada@example.com",
                "Password": PASSWORD,
                "FirstName": "Ada",
                "LastName": "Lovelace",
                "IIN": "901231123456",
                "Phone": "77011234567"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn signup_validation_failure() {
    let test = spawn_app();
    let app = build_router(test.state.clone());

    let response = app
        .oneshot(json_request(
            "/signup",
            json!({
                "Email": "ada@example.com",
                "Password": "1234",
                "FirstName": "A",
                "LastName": "Lovelace",
                "IIN": "901231123456",
                "Phone": "77011234567"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn login_sets_cookies_and_returns_pair() {
    let test = spawn_app();
    register(&test, "ada@example.com").await;
    let app = build_router(test.state.clone());

    let response = app
        .oneshot(json_request(
            "/login",
            json!({"Email": "ada@example.com", "Password": PASSWORD}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("refresh_token=") && c.contains("HttpOnly")));
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("access_token=") && c.contains("HttpOnly")));

    let body = body_json(response).await;
    assert!(body["accessToken"].as_str().is_some());
    assert!(body["refreshToken"].as_str().is_some());
}

#[tokio::test]
async fn bad_credentials_are_forbidden() {
    let test = spawn_app();
    register(&test, "ada@example.com").await;
    let app = build_router(test.state.clone());

    let wrong = app
        .clone()
        .oneshot(json_request(
            "/login",
            json!({"Email": "ada@example.com", "Password": "nope-nope"}),
        ))
        .await
        .unwrap();
    let unknown = app
        .oneshot(json_request(
            "/login",
            json!({"Email": "nobody@example.com", "Password": PASSWORD}),
        ))
        .await
        .unwrap();

    assert_eq!(wrong.status(), StatusCode::FORBIDDEN);
    assert_eq!(unknown.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(wrong).await, body_json(unknown).await);
}

#[tokio::test]
async fn user_data_requires_bearer_token() {
    let test = spawn_app();
    register(&test, "ada@example.com").await;
    let app = build_router(test.state.clone());
    let tokens = login(&app).await;

    let anonymous = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/user-data")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::SEE_OTHER);
    assert_eq!(anonymous.headers()[header::LOCATION], "/login");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/user-data")
                .header(
                    header::AUTHORIZATION,
                    format!("Bearer {}", tokens["accessToken"].as_str().unwrap()),
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let profile = body_json(response).await;
    assert_eq!(profile["Email"], "ada@example.com");
    assert_eq!(profile["IIN"], "901231123456");
    assert!(profile.get("PasswordHash").is_none());
}

#[tokio::test]
async fn update_token_rotates_pair() {
    let test = spawn_app();
    register(&test, "ada@example.com").await;
    let app = build_router(test.state.clone());
    let tokens = login(&app).await;
    let refresh = tokens["refreshToken"].as_str().unwrap().to_string();

    let refresh_request = |token: &str| {
        Request::builder()
            .method("POST")
            .uri("/update-token")
            .header(header::COOKIE, format!("refresh_token={}", token))
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(refresh_request(&refresh)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = body_json(response).await;
    assert_ne!(rotated["refreshToken"], tokens["refreshToken"]);

    let reuse = app.oneshot(refresh_request(&refresh)).await.unwrap();
    assert_eq!(reuse.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn update_token_without_cookie_redirects_to_login() {
    let test = spawn_app();
    let app = build_router(test.state.clone());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/update-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");
}

#[tokio::test]
async fn health_and_metrics() {
    let test = spawn_app();
    let app = build_router(test.state.clone());

    let health = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    assert!(health.headers().contains_key("x-request-id"));

    let metrics = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(metrics.status(), StatusCode::OK);
}

//! Shared test utilities
//!
//! Builds the application router over the in-memory store so the API
//! tests run without a database.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::util::ServiceExt;

use corebank::api::{build_router, AppState};
use corebank::notify::LogNotifier;
use corebank::store::MemoryStore;

/// Build the full router backed by a fresh in-memory store.
pub fn test_app() -> Router {
    build_router(AppState {
        store: Arc::new(MemoryStore::new()),
        notifier: Arc::new(LogNotifier),
    })
}

/// Send one request and decode the JSON body.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

/// Register an account and return `(account_id, account_no)`.
pub async fn register_account(app: &Router, username: &str) -> (i64, i64) {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/accounts",
        Some(serde_json::json!({
            "username": username,
            "first_name": "Test",
            "last_name": "User",
            "email": format!("{username}@example.com"),
            "account_type": "SAVINGS",
            "gender": "FEMALE",
            "birth_date": "1992-03-14",
            "street": "1 Main St",
            "city": "Springfield",
            "post_code": 12345,
            "country": "US"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {body}");

    (
        body["account_id"].as_i64().unwrap(),
        body["account_no"].as_i64().unwrap(),
    )
}

/// Deposit into an account, asserting success.
pub async fn deposit(app: &Router, account_id: i64, amount: &str) {
    let (status, body) = send(
        app,
        "POST",
        &format!("/api/v1/accounts/{account_id}/deposits"),
        Some(serde_json::json!({ "amount": amount })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "deposit failed: {body}");
}

/// Read an account's live balance.
pub async fn balance(app: &Router, account_id: i64) -> rust_decimal::Decimal {
    let (status, body) = send(app, "GET", &format!("/api/v1/accounts/{account_id}"), None).await;
    assert_eq!(status, StatusCode::OK, "account fetch failed: {body}");
    decimal(&body["balance"])
}

/// Decode a decimal that serializes as a JSON string.
pub fn decimal(value: &Value) -> rust_decimal::Decimal {
    value.as_str().unwrap().parse().unwrap()
}

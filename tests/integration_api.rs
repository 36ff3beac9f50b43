//! API Integration Tests
//!
//! Drive the full router end to end over the in-memory store.

use axum::http::StatusCode;
use rust_decimal_macros::dec;
use serde_json::json;
use tower::util::ServiceExt;

mod common;

use common::{balance, decimal, deposit, register_account, send, test_app};

#[tokio::test]
async fn test_health_check() {
    let app = test_app();

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .uri("/health")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_assigns_offset_account_number() {
    let app = test_app();

    let (account_id, account_no) = register_account(&app, "alice").await;
    assert_eq!(account_no, 10000 + account_id);

    let (second_id, second_no) = register_account(&app, "bob").await;
    assert_eq!(second_no, 10000 + second_id);
    assert_ne!(account_no, second_no);

    // The account starts with a zero balance.
    assert_eq!(balance(&app, account_id).await, dec!(0));
}

#[tokio::test]
async fn test_get_account_includes_address() {
    let app = test_app();
    let (account_id, _) = register_account(&app, "alice").await;

    let (status, body) = send(&app, "GET", &format!("/api/v1/accounts/{account_id}"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["account_type"], "SAVINGS");
    assert_eq!(body["address"]["city"], "Springfield");
    assert_eq!(body["address"]["post_code"], 12345);
}

#[tokio::test]
async fn test_get_unknown_account_is_404() {
    let app = test_app();

    let (status, body) = send(&app, "GET", "/api/v1/accounts/999", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "account_not_found");
}

#[tokio::test]
async fn test_deposit_and_withdraw_flow() {
    let app = test_app();
    let (account_id, _) = register_account(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/accounts/{account_id}/deposits"),
        Some(json!({ "amount": "1500.25" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["kind"], "DEPOSIT");
    assert_eq!(decimal(&body["balance_after"]), dec!(1500.25));

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/accounts/{account_id}/withdrawals"),
        Some(json!({ "amount": "500" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["kind"], "WITHDRAWAL");
    assert_eq!(decimal(&body["balance_after"]), dec!(1000.25));

    assert_eq!(balance(&app, account_id).await, dec!(1000.25));
}

#[tokio::test]
async fn test_deposit_below_minimum_is_field_labeled_400() {
    let app = test_app();
    let (account_id, _) = register_account(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/accounts/{account_id}/deposits"),
        Some(json!({ "amount": "50" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "validation_error");
    assert_eq!(body["field"], "amount");
    assert_eq!(balance(&app, account_id).await, dec!(0));
}

#[tokio::test]
async fn test_withdraw_above_cap_is_rejected() {
    let app = test_app();
    let (account_id, _) = register_account(&app, "alice").await;
    deposit(&app, account_id, "50000").await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/accounts/{account_id}/withdrawals"),
        Some(json!({ "amount": "20001" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "amount");
    assert_eq!(balance(&app, account_id).await, dec!(50000));
}

#[tokio::test]
async fn test_transfer_e2e() {
    let app = test_app();
    let (alice_id, _) = register_account(&app, "alice").await;
    let (bob_id, bob_no) = register_account(&app, "bob").await;
    deposit(&app, alice_id, "1000").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/transfers",
        Some(json!({
            "sender_account_id": alice_id,
            "receiver_account_no": bob_no,
            "amount": "250"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "completed");
    assert_eq!(decimal(&body["sender_balance"]), dec!(750));
    assert!(body["transfer_id"].is_string());

    assert_eq!(balance(&app, alice_id).await, dec!(750));
    assert_eq!(balance(&app, bob_id).await, dec!(250));
}

#[tokio::test]
async fn test_transfer_to_unknown_receiver_is_400() {
    let app = test_app();
    let (alice_id, _) = register_account(&app, "alice").await;
    deposit(&app, alice_id, "1000").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/transfers",
        Some(json!({
            "sender_account_id": alice_id,
            "receiver_account_no": 99999,
            "amount": "250"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "receiver_not_found");
    assert_eq!(body["field"], "receiver");
    assert_eq!(balance(&app, alice_id).await, dec!(1000));
}

#[tokio::test]
async fn test_loan_lifecycle() {
    let app = test_app();
    let (account_id, _) = register_account(&app, "alice").await;
    deposit(&app, account_id, "1000").await;

    // Request: no balance change yet.
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/accounts/{account_id}/loans"),
        Some(json!({ "amount": "5000" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["kind"], "LOAN");
    assert_eq!(body["loan_status"], "REQUESTED");
    let loan_id = body["id"].as_i64().unwrap();
    assert_eq!(balance(&app, account_id).await, dec!(1000));

    // Approve: credits the balance.
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/loans/{loan_id}/approve"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loan_status"], "APPROVED");
    assert_eq!(balance(&app, account_id).await, dec!(6000));

    // Pay: debits it back.
    let (status, body) = send(&app, "POST", &format!("/api/v1/loans/{loan_id}/pay"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "LOAN_PAID");
    assert_eq!(body["loan_status"], "PAID");
    assert_eq!(balance(&app, account_id).await, dec!(1000));

    // The loan list shows the settled loan.
    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/accounts/{account_id}/loans"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loans"].as_array().unwrap().len(), 1);
    assert_eq!(body["loans"][0]["loan_status"], "PAID");
}

#[tokio::test]
async fn test_fourth_approved_loan_is_422() {
    let app = test_app();
    let (account_id, _) = register_account(&app, "alice").await;

    for _ in 0..3 {
        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/accounts/{account_id}/loans"),
            Some(json!({ "amount": "1000" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let loan_id = body["id"].as_i64().unwrap();

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/v1/loans/{loan_id}/approve"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/accounts/{account_id}/loans"),
        Some(json!({ "amount": "1000" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_code"], "loan_limit_reached");
}

#[tokio::test]
async fn test_approve_twice_is_422() {
    let app = test_app();
    let (account_id, _) = register_account(&app, "alice").await;

    let (_, body) = send(
        &app,
        "POST",
        &format!("/api/v1/accounts/{account_id}/loans"),
        Some(json!({ "amount": "1000" })),
    )
    .await;
    let loan_id = body["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/loans/{loan_id}/approve"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/loans/{loan_id}/approve"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_code"], "loan_already_approved");
}

#[tokio::test]
async fn test_bankruptcy_gate_blocks_withdrawals() {
    let app = test_app();
    let (account_id, _) = register_account(&app, "alice").await;
    deposit(&app, account_id, "5000").await;

    let (status, body) = send(
        &app,
        "PATCH",
        "/api/v1/admin/bank",
        Some(json!({ "is_bankrupt": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_bankrupt"], true);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/accounts/{account_id}/withdrawals"),
        Some(json!({ "amount": "500" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "amount");

    // Deposits still work while bankrupt.
    deposit(&app, account_id, "100").await;

    let (status, _) = send(
        &app,
        "PATCH",
        "/api/v1/admin/bank",
        Some(json!({ "is_bankrupt": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/accounts/{account_id}/withdrawals"),
        Some(json!({ "amount": "500" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_transaction_report() {
    let app = test_app();
    let (account_id, _) = register_account(&app, "alice").await;
    deposit(&app, account_id, "800").await;
    deposit(&app, account_id, "200").await;

    // Without a range the total is the live balance.
    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/accounts/{account_id}/transactions"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transactions"].as_array().unwrap().len(), 2);
    assert_eq!(decimal(&body["total"]), dec!(1000));

    // With today's range the total sums the amounts in range.
    let today = chrono::Utc::now().date_naive();
    let (status, body) = send(
        &app,
        "GET",
        &format!(
            "/api/v1/accounts/{account_id}/transactions?start_date={today}&end_date={today}"
        ),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["total"]), dec!(1000));

    // A half-open range is rejected.
    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/accounts/{account_id}/transactions?start_date={today}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "invalid_request");
}

#[tokio::test]
async fn test_duplicate_username_is_rejected() {
    let app = test_app();
    register_account(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/accounts",
        Some(json!({
            "username": "alice",
            "first_name": "Other",
            "last_name": "Person",
            "email": "other@example.com",
            "account_type": "CURRENT",
            "gender": "MALE",
            "birth_date": "1985-01-01",
            "street": "2 Side St",
            "city": "Springfield",
            "post_code": 12345,
            "country": "US"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "username");
}

//! API Routes
//!
//! HTTP endpoint definitions.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{AccountType, Gender, LoanStatus, Transaction, TransactionKind};
use crate::error::AppError;
use crate::handlers::{
    DepositCommand, DepositHandler, LoanHandler, LoanRequestCommand, RegisterCommand,
    RegisterHandler, ReportHandler, ReportQuery, TransferCommand, TransferHandler,
    WithdrawCommand, WithdrawHandler,
};
use crate::notify::Notifier;
use crate::store::LedgerStore;

/// Shared application state: the persistence boundary and the
/// notification channel.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub notifier: Arc<dyn Notifier>,
}

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub account_type: AccountType,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    pub street: String,
    pub city: String,
    pub post_code: i32,
    pub country: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub account_id: i64,
    pub account_no: i64,
    pub username: String,
    pub account_type: AccountType,
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct AddressResponse {
    pub street: String,
    pub city: String,
    pub post_code: i32,
    pub country: String,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: i64,
    pub account_no: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub account_type: AccountType,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    pub initial_deposit_date: NaiveDate,
    pub balance: Decimal,
    pub address: AddressResponse,
}

#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    /// Amount as string for precise decimal handling
    pub amount: String,
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: i64,
    pub account_id: i64,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub kind: TransactionKind,
    pub timestamp: DateTime<Utc>,
    pub loan_status: Option<LoanStatus>,
}

impl From<Transaction> for TransactionResponse {
    fn from(txn: Transaction) -> Self {
        let loan_status = txn.loan_status();
        Self {
            id: txn.id,
            account_id: txn.account_id,
            amount: txn.amount,
            balance_after: txn.balance_after,
            kind: txn.kind,
            timestamp: txn.timestamp,
            loan_status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoanListResponse {
    pub account_id: i64,
    pub loans: Vec<TransactionResponse>,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub sender_account_id: i64,
    pub receiver_account_no: i64,
    pub amount: String,
}

#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub transfer_id: Uuid,
    pub sender_account_id: i64,
    pub receiver_account_no: i64,
    pub amount: Decimal,
    pub sender_balance: Decimal,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ReportParams {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub account_id: i64,
    pub transactions: Vec<TransactionResponse>,
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct BankStateResponse {
    pub is_bankrupt: bool,
}

#[derive(Debug, Deserialize)]
pub struct BankStateUpdate {
    pub is_bankrupt: bool,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        // Accounts
        .route("/accounts", post(register))
        .route("/accounts/:account_id", get(get_account))
        // Cash operations
        .route("/accounts/:account_id/deposits", post(deposit))
        .route("/accounts/:account_id/withdrawals", post(withdraw))
        // Loans
        .route("/accounts/:account_id/loans", post(request_loan))
        .route("/accounts/:account_id/loans", get(list_loans))
        .route("/loans/:loan_id/approve", post(approve_loan))
        .route("/loans/:loan_id/pay", post(pay_loan))
        // Transfers
        .route("/transfers", post(transfer))
        // Reporting
        .route("/accounts/:account_id/transactions", get(get_transactions))
        // Admin
        .route("/admin/bank", get(get_bank_state))
        .route("/admin/bank", patch(set_bank_state))
}

// =========================================================================
// POST /accounts
// =========================================================================

/// Register a user with a bank account and address
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let handler = RegisterHandler::new(state.store);

    let result = handler
        .execute(RegisterCommand {
            username: request.username,
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            account_type: request.account_type,
            gender: request.gender,
            birth_date: request.birth_date,
            street: request.street,
            city: request.city,
            post_code: request.post_code,
            country: request.country,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            account_id: result.account.id,
            account_no: result.account.account_no,
            username: result.account.owner.username,
            account_type: result.account.account_type,
            balance: result.account.balance.value(),
        }),
    ))
}

// =========================================================================
// GET /accounts/:account_id
// =========================================================================

/// Get an account with its address
async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = state.store.account(account_id).await?;
    let address = state.store.address(account_id).await?;

    Ok(Json(AccountResponse {
        id: account.id,
        account_no: account.account_no,
        username: account.owner.username,
        first_name: account.owner.first_name,
        last_name: account.owner.last_name,
        email: account.owner.email,
        account_type: account.account_type,
        gender: account.gender,
        birth_date: account.birth_date,
        initial_deposit_date: account.initial_deposit_date,
        balance: account.balance.value(),
        address: AddressResponse {
            street: address.street,
            city: address.city,
            post_code: address.post_code,
            country: address.country,
        },
    }))
}

// =========================================================================
// POST /accounts/:account_id/deposits
// =========================================================================

/// Deposit money into an account
async fn deposit(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
    Json(request): Json<AmountRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), AppError> {
    let handler = DepositHandler::new(state.store, state.notifier);

    let transaction = handler
        .execute(DepositCommand::new(account_id, request.amount))
        .await?;

    Ok((StatusCode::CREATED, Json(transaction.into())))
}

// =========================================================================
// POST /accounts/:account_id/withdrawals
// =========================================================================

/// Withdraw money from an account
async fn withdraw(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
    Json(request): Json<AmountRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), AppError> {
    let handler = WithdrawHandler::new(state.store, state.notifier);

    let transaction = handler
        .execute(WithdrawCommand::new(account_id, request.amount))
        .await?;

    Ok((StatusCode::CREATED, Json(transaction.into())))
}

// =========================================================================
// POST /accounts/:account_id/loans
// =========================================================================

/// Submit a loan request
async fn request_loan(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
    Json(request): Json<AmountRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), AppError> {
    let handler = LoanHandler::new(state.store, state.notifier);

    let loan = handler
        .request(LoanRequestCommand::new(account_id, request.amount))
        .await?;

    Ok((StatusCode::CREATED, Json(loan.into())))
}

// =========================================================================
// GET /accounts/:account_id/loans
// =========================================================================

/// List the loans of one account
async fn list_loans(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
) -> Result<Json<LoanListResponse>, AppError> {
    let handler = LoanHandler::new(state.store, state.notifier);

    let loans = handler.list(account_id).await?;

    Ok(Json(LoanListResponse {
        account_id,
        loans: loans.into_iter().map(Into::into).collect(),
    }))
}

// =========================================================================
// POST /loans/:loan_id/approve
// =========================================================================

/// Approve a pending loan (privileged)
async fn approve_loan(
    State(state): State<AppState>,
    Path(loan_id): Path<i64>,
) -> Result<Json<TransactionResponse>, AppError> {
    let handler = LoanHandler::new(state.store, state.notifier);

    let loan = handler.approve(loan_id).await?;

    Ok(Json(loan.into()))
}

// =========================================================================
// POST /loans/:loan_id/pay
// =========================================================================

/// Pay off an approved loan
async fn pay_loan(
    State(state): State<AppState>,
    Path(loan_id): Path<i64>,
) -> Result<Json<TransactionResponse>, AppError> {
    let handler = LoanHandler::new(state.store, state.notifier);

    let loan = handler.pay(loan_id).await?;

    Ok(Json(loan.into()))
}

// =========================================================================
// POST /transfers
// =========================================================================

/// Transfer money between accounts
async fn transfer(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<(StatusCode, Json<TransferResponse>), AppError> {
    let handler = TransferHandler::new(state.store, state.notifier);

    let result = handler
        .execute(TransferCommand::new(
            request.sender_account_id,
            request.receiver_account_no,
            request.amount,
        ))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TransferResponse {
            transfer_id: result.transfer_id,
            sender_account_id: result.sender_account_id,
            receiver_account_no: result.receiver_account_no,
            amount: result.amount,
            sender_balance: result.sender_balance,
            status: result.status,
        }),
    ))
}

// =========================================================================
// GET /accounts/:account_id/transactions
// =========================================================================

/// Get the transaction report, optionally restricted to an inclusive
/// date range
async fn get_transactions(
    State(state): State<AppState>,
    Path(account_id): Path<i64>,
    Query(params): Query<ReportParams>,
) -> Result<Json<ReportResponse>, AppError> {
    let handler = ReportHandler::new(state.store);

    let result = handler
        .execute(ReportQuery {
            account_id,
            start_date: params.start_date,
            end_date: params.end_date,
        })
        .await?;

    Ok(Json(ReportResponse {
        account_id: result.account_id,
        transactions: result.transactions.into_iter().map(Into::into).collect(),
        total: result.total,
    }))
}

// =========================================================================
// GET /admin/bank, PATCH /admin/bank
// =========================================================================

/// Read the bank-wide state
async fn get_bank_state(
    State(state): State<AppState>,
) -> Result<Json<BankStateResponse>, AppError> {
    let bank = state.store.bank().await?;

    Ok(Json(BankStateResponse {
        is_bankrupt: bank.is_bankrupt,
    }))
}

/// Flip the bankruptcy flag (privileged)
async fn set_bank_state(
    State(state): State<AppState>,
    Json(request): Json<BankStateUpdate>,
) -> Result<Json<BankStateResponse>, AppError> {
    let bank = state.store.set_bankrupt(request.is_bankrupt).await?;

    tracing::warn!(is_bankrupt = bank.is_bankrupt, "bank state changed");

    Ok(Json(BankStateResponse {
        is_bankrupt: bank.is_bankrupt,
    }))
}

//! Command definitions
//!
//! Commands represent intentions to change the system state; results are
//! what the handlers report back on success.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Account, AccountType, Address, Gender, Transaction};

/// Command to register a user with a bank account and address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterCommand {
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

/// Command to deposit money into an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositCommand {
    pub account_id: i64,
    /// Amount as string for precise decimal handling
    pub amount: String,
}

impl DepositCommand {
    pub fn new(account_id: i64, amount: String) -> Self {
        Self { account_id, amount }
    }
}

/// Command to withdraw money from an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawCommand {
    pub account_id: i64,
    pub amount: String,
}

impl WithdrawCommand {
    pub fn new(account_id: i64, amount: String) -> Self {
        Self { account_id, amount }
    }
}

/// Command to request a loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanRequestCommand {
    pub account_id: i64,
    pub amount: String,
}

impl LoanRequestCommand {
    pub fn new(account_id: i64, amount: String) -> Self {
        Self { account_id, amount }
    }
}

/// Command to transfer money to another account, addressed by its public
/// account number
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferCommand {
    pub sender_account_id: i64,
    pub receiver_account_no: i64,
    pub amount: String,
}

impl TransferCommand {
    pub fn new(sender_account_id: i64, receiver_account_no: i64, amount: String) -> Self {
        Self {
            sender_account_id,
            receiver_account_no,
            amount,
        }
    }
}

/// Query for the transaction report. Both dates must be given together;
/// without a range the report totals the live balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportQuery {
    pub account_id: i64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Result of a successful registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResult {
    pub account: Account,
    pub address: Address,
}

/// Result of a successful transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResult {
    pub transfer_id: Uuid,
    pub sender_account_id: i64,
    pub receiver_account_no: i64,
    pub amount: Decimal,
    pub sender_balance: Decimal,
    pub status: String,
}

/// Result of the transaction report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResult {
    pub account_id: i64,
    pub transactions: Vec<Transaction>,
    /// Sum of amounts in range, or the live balance when no range given
    pub total: Decimal,
}

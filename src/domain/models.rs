//! Core records
//!
//! Accounts, addresses, ledger transactions and transfer records.
//! Transactions form an append-only ledger: rows are created once and only
//! the loan lifecycle fields may transition afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Balance;

/// Offset added to the account id to form the public account number.
pub const ACCOUNT_NO_BASE: i64 = 10000;

/// Compute the public account number for an account id.
///
/// Account numbers are assigned deterministically at creation and are
/// unique because ids are unique.
pub fn account_no_for(account_id: i64) -> i64 {
    ACCOUNT_NO_BASE + account_id
}

/// Bank account category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Savings,
    Current,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Savings => "SAVINGS",
            Self::Current => "CURRENT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SAVINGS" => Some(Self::Savings),
            "CURRENT" => Some(Self::Current),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MALE" => Some(Self::Male),
            "FEMALE" => Some(Self::Female),
            _ => None,
        }
    }
}

/// Identity of the account owner, also the notification recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// A bank account with its mutable balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    /// Public account number, `ACCOUNT_NO_BASE + id`, globally unique.
    pub account_no: i64,
    pub owner: Owner,
    pub account_type: AccountType,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    pub initial_deposit_date: NaiveDate,
    pub balance: Balance,
}

/// Postal address, one per account, created at registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub account_id: i64,
    pub street: String,
    pub city: String,
    pub post_code: i32,
    pub country: String,
}

/// Kind of a balance-affecting ledger event.
///
/// Transfers intentionally have no kind here: a transfer mutates two
/// balances and is captured by a [`TransferRecord`], not by ledger rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Loan,
    LoanPaid,
}

impl TransactionKind {
    /// Stable numeric code used by the persistence layer.
    pub fn code(&self) -> i16 {
        match self {
            Self::Deposit => 1,
            Self::Withdrawal => 2,
            Self::Loan => 3,
            Self::LoanPaid => 4,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::Deposit),
            2 => Some(Self::Withdrawal),
            3 => Some(Self::Loan),
            4 => Some(Self::LoanPaid),
            _ => None,
        }
    }
}

/// Lifecycle state of a loan transaction.
///
/// `Requested` and `Paid` are terminal with respect to payoff; only an
/// `Approved` loan can be paid off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Requested,
    Approved,
    Paid,
}

/// One row of the append-only ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub account_id: i64,
    /// Amount as entered; the kind carries the direction.
    pub amount: Decimal,
    /// Account balance captured immediately after this transaction was
    /// applied. A point-in-time snapshot, never recomputed.
    pub balance_after: Decimal,
    pub kind: TransactionKind,
    pub timestamp: DateTime<Utc>,
    /// Set once by the privileged approval step; counted by the loan cap.
    pub loan_approve: bool,
    /// Set once by payoff. Kept separate from `loan_approve` so the two
    /// flags' semantics stay independently observable.
    pub loan_settled: bool,
}

impl Transaction {
    /// Derive the loan lifecycle state; `None` for non-loan rows.
    pub fn loan_status(&self) -> Option<LoanStatus> {
        match self.kind {
            TransactionKind::Loan if !self.loan_approve => Some(LoanStatus::Requested),
            TransactionKind::Loan if !self.loan_settled => Some(LoanStatus::Approved),
            TransactionKind::Loan => Some(LoanStatus::Paid),
            TransactionKind::LoanPaid => Some(LoanStatus::Paid),
            _ => None,
        }
    }
}

/// Record of a transfer intent between two accounts.
///
/// The receiver is referenced by its public account number and resolved at
/// execution time; the record carries no timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRecord {
    pub id: Uuid,
    pub sender_account_id: i64,
    pub receiver_account_no: i64,
    pub amount: Decimal,
}

/// Bank-wide state shared by all operations, read-only from their
/// perspective and mutated only through the admin surface.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BankState {
    pub is_bankrupt: bool,
}

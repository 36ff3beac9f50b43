//! Ledger store
//!
//! Persistence boundary for accounts, addresses, transactions, transfer
//! records and the bank-wide state. Every balance mutation and the
//! transaction row recording it happen inside one atomic unit scoped to
//! the account(s) involved; the `balance_after` snapshot is captured
//! inside that unit so it can never desynchronize from the balance.
//! Validation runs inside the same unit, strictly before any mutation.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::{
    Account, AccountType, Address, Amount, BankState, DomainError, Gender, Transaction,
    TransferRecord,
};

/// Store-level errors: domain rejections or infrastructure failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Profile submitted at registration; account and address are created
/// together from it.
#[derive(Debug, Clone)]
pub struct NewProfile {
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

/// Result of a successful registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub account: Account,
    pub address: Address,
}

/// Inclusive calendar-date range, day granularity.
#[derive(Debug, Clone, Copy)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Transactions for one account plus the report total: the sum of
/// amounts in range, or the live balance when no range was given.
#[derive(Debug, Clone)]
pub struct LedgerReport {
    pub transactions: Vec<Transaction>,
    pub total: Decimal,
}

/// Both sides of a completed transfer, with post-transfer balances.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub record: TransferRecord,
    pub sender: Account,
    pub receiver: Account,
}

/// Persistence operations for the banking core.
///
/// Implementations must make each mutating method atomic: the rules run
/// against the state they will mutate, the balance update and the ledger
/// append commit together, and a transfer's two legs either both succeed
/// or neither does.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Create account + address from one profile. The account number is
    /// assigned deterministically from the new account id.
    async fn register(&self, profile: NewProfile) -> StoreResult<Registration>;

    async fn account(&self, account_id: i64) -> StoreResult<Account>;

    async fn account_by_no(&self, account_no: i64) -> StoreResult<Option<Account>>;

    async fn address(&self, account_id: i64) -> StoreResult<Address>;

    /// Validate, credit the balance and append a DEPOSIT row.
    async fn deposit(&self, account_id: i64, amount: &Amount) -> StoreResult<Transaction>;

    /// Validate (including the bankruptcy gate), debit the balance and
    /// append a WITHDRAWAL row.
    async fn withdraw(&self, account_id: i64, amount: &Amount) -> StoreResult<Transaction>;

    /// Enforce the approved-loan cap, then append an unapproved LOAN row.
    /// No balance change happens at request time.
    async fn request_loan(&self, account_id: i64, amount: &Amount) -> StoreResult<Transaction>;

    /// Privileged step: credit the amount to the balance and mark the
    /// loan approved, refreshing its snapshot to the post-credit balance.
    async fn approve_loan(&self, loan_id: i64) -> StoreResult<Transaction>;

    /// Pay off an approved loan: debit the balance and transition the
    /// row to LOAN_PAID with the post-debit snapshot.
    async fn pay_loan(&self, loan_id: i64) -> StoreResult<Transaction>;

    /// Debit sender, resolve receiver by account number, credit receiver,
    /// and append the transfer record, all in one atomic unit.
    async fn transfer(
        &self,
        sender_account_id: i64,
        receiver_account_no: i64,
        amount: &Amount,
    ) -> StoreResult<TransferOutcome>;

    /// Transactions for one account ordered by timestamp ascending,
    /// optionally restricted to an inclusive date range.
    async fn transactions(
        &self,
        account_id: i64,
        range: Option<DateRange>,
    ) -> StoreResult<LedgerReport>;

    /// Loan transactions (kind LOAN) for one account.
    async fn loans(&self, account_id: i64) -> StoreResult<Vec<Transaction>>;

    async fn bank(&self) -> StoreResult<BankState>;

    async fn set_bankrupt(&self, is_bankrupt: bool) -> StoreResult<BankState>;
}

//! Domain module
//!
//! Pure domain types and the transaction rules engine. Nothing in here
//! touches the web or persistence layers.

mod amount;
mod error;
mod models;
pub mod rules;

pub use amount::{Amount, AmountError, Balance};
pub use error::DomainError;
pub use models::{
    account_no_for, Account, AccountType, Address, BankState, Gender, LoanStatus, Owner,
    Transaction, TransactionKind, TransferRecord, ACCOUNT_NO_BASE,
};

//! Operation handlers
//!
//! Each handler sequences one caller-facing operation: validate, mutate
//! the balance, record the ledger row (the store makes those three one
//! atomic unit), then dispatch a notification. A notification problem
//! never fails an operation that has already committed.

mod commands;
mod deposit_handler;
mod loan_handler;
mod register_handler;
mod report_handler;
mod transfer_handler;
mod withdraw_handler;


pub use commands::*;
pub use deposit_handler::DepositHandler;
pub use loan_handler::LoanHandler;
pub use register_handler::RegisterHandler;
pub use report_handler::ReportHandler;
pub use transfer_handler::TransferHandler;
pub use withdraw_handler::WithdrawHandler;

use crate::domain::{Amount, DomainError};
use crate::error::AppError;

/// Parse a caller-supplied amount string, labeling failures as
/// validation errors on the amount field.
pub(crate) fn parse_amount(raw: &str) -> Result<Amount, AppError> {
    raw.parse()
        .map_err(|e: crate::domain::AmountError| {
            AppError::Domain(DomainError::validation("amount", e.to_string()))
        })
}

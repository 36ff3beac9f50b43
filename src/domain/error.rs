//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

/// Business rule violations and domain invariant failures.
///
/// These are independent of the web/persistence layers. Validation errors
/// carry the offending field so the caller can label its form input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// A policy bound or format check failed for one input field
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Insufficient balance for a debit operation
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
    },

    /// Account not found by id
    #[error("Account not found: {0}")]
    AccountNotFound(i64),

    /// Transfer receiver account number did not resolve
    #[error("Account not found for account number {0}")]
    ReceiverNotFound(i64),

    /// Loan transaction not found by id
    #[error("Loan not found: {0}")]
    LoanNotFound(i64),

    /// The account already has the maximum number of approved loans
    #[error("You have crossed the loan limit ({count} approved loans)")]
    LoanLimitReached { count: i64 },

    /// Payoff attempted on a loan that is not in the approved state
    #[error("Loan {0} is not approved for payoff")]
    LoanNotApproved(i64),

    /// Approval attempted on a loan that is not in the requested state
    #[error("Loan {0} is already approved")]
    LoanAlreadyApproved(i64),
}

impl DomainError {
    /// Create a field-labeled validation error
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create an insufficient balance error
    pub fn insufficient_balance(required: Decimal, available: Decimal) -> Self {
        Self::InsufficientBalance {
            required,
            available,
        }
    }

    /// Check if this is a client error (caller's input at fault)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::InsufficientBalance { .. }
                | Self::ReceiverNotFound(_)
                | Self::LoanLimitReached { .. }
                | Self::LoanNotApproved(_)
                | Self::LoanAlreadyApproved(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_carries_field() {
        let err = DomainError::validation("amount", "You need to deposit at least 100 $");
        assert!(err.is_client_error());
        match err {
            DomainError::Validation { field, .. } => assert_eq!(field, "amount"),
            _ => panic!("expected validation error"),
        }
    }

    #[test]
    fn test_insufficient_balance_error() {
        let err = DomainError::insufficient_balance(Decimal::new(100, 0), Decimal::new(50, 0));

        assert!(err.is_client_error());
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("50"));
    }

    #[test]
    fn test_not_found_is_not_client_error() {
        let err = DomainError::AccountNotFound(7);
        assert!(!err.is_client_error());
    }
}

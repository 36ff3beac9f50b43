//! Transaction rules engine
//!
//! One pure validation function per operation kind. Each is given the
//! requested amount and whatever account/bank state it needs, and either
//! accepts or rejects with a field-labeled error. Nothing here mutates
//! state; callers run these checks inside the same atomic unit that
//! performs the mutation so the state they saw cannot change underneath.

use rust_decimal::Decimal;

use super::{Amount, Balance, BankState, DomainError};

/// Minimum deposit per transaction (currency units)
pub const MIN_DEPOSIT: i64 = 100;

/// Minimum withdrawal per transaction
pub const MIN_WITHDRAWAL: i64 = 500;

/// Maximum withdrawal per transaction
pub const MAX_WITHDRAWAL: i64 = 20_000;

/// Maximum number of approved, outstanding loans per account
pub const MAX_ACTIVE_LOANS: i64 = 3;

/// Deposit policy: amounts below the minimum are rejected.
pub fn deposit_amount(amount: &Amount) -> Result<(), DomainError> {
    if amount.value() < Decimal::from(MIN_DEPOSIT) {
        return Err(DomainError::validation(
            "amount",
            format!("You need to deposit at least {MIN_DEPOSIT} $"),
        ));
    }
    Ok(())
}

/// Withdrawal policy: bankruptcy gate, per-transaction bounds, and the
/// available balance, checked in that order.
pub fn withdrawal_amount(
    amount: &Amount,
    balance: &Balance,
    bank: &BankState,
) -> Result<(), DomainError> {
    if bank.is_bankrupt {
        return Err(DomainError::validation(
            "amount",
            "Bank is bankrupt and no money to withdraw!",
        ));
    }

    if amount.value() < Decimal::from(MIN_WITHDRAWAL) {
        return Err(DomainError::validation(
            "amount",
            format!("Minimum Withdraw Amount: {MIN_WITHDRAWAL} $"),
        ));
    }

    if amount.value() > Decimal::from(MAX_WITHDRAWAL) {
        return Err(DomainError::validation(
            "amount",
            format!("You can withdraw at most {MAX_WITHDRAWAL} $"),
        ));
    }

    if !balance.is_sufficient_for(amount) {
        return Err(DomainError::validation(
            "amount",
            format!(
                "You have {balance} $ in your account. \
                 You can not withdraw more than your account balance"
            ),
        ));
    }

    Ok(())
}

/// Loan request policy: any positive amount is acceptable. The real gate
/// is the approved-loan cap, enforced by [`loan_cap`] before a request
/// row is created.
pub fn loan_amount(amount: &Amount) -> Result<(), DomainError> {
    if amount.is_zero() {
        return Err(DomainError::validation(
            "amount",
            "Loan amount must be positive",
        ));
    }
    Ok(())
}

/// Loan cap: at most [`MAX_ACTIVE_LOANS`] approved loans per account.
pub fn loan_cap(approved_count: i64) -> Result<(), DomainError> {
    if approved_count >= MAX_ACTIVE_LOANS {
        return Err(DomainError::LoanLimitReached {
            count: approved_count,
        });
    }
    Ok(())
}

/// Transfer policy: the sender must hold at least the requested amount.
/// Negative amounts cannot be represented by [`Amount`]; receiver
/// resolution is checked by the store at execution time.
pub fn transfer_amount(amount: &Amount, sender_balance: &Balance) -> Result<(), DomainError> {
    if !sender_balance.is_sufficient_for(amount) {
        return Err(DomainError::validation("amount", "Enter a valid amount!"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn amount(v: Decimal) -> Amount {
        Amount::new(v).unwrap()
    }

    fn balance(v: Decimal) -> Balance {
        Balance::new(v).unwrap()
    }

    #[test]
    fn test_deposit_below_minimum_rejected() {
        let err = deposit_amount(&amount(dec!(50))).unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "amount", .. }));
    }

    #[test]
    fn test_deposit_at_minimum_accepted() {
        assert!(deposit_amount(&amount(dec!(100))).is_ok());
    }

    #[test]
    fn test_withdrawal_bankrupt_bank_rejected() {
        let bank = BankState { is_bankrupt: true };
        // Rejected regardless of amount or balance
        let err = withdrawal_amount(&amount(dec!(1000)), &balance(dec!(50000)), &bank).unwrap_err();
        assert!(err.to_string().contains("bankrupt"));
    }

    #[test]
    fn test_withdrawal_below_minimum_rejected() {
        let bank = BankState::default();
        let err = withdrawal_amount(&amount(dec!(499)), &balance(dec!(50000)), &bank).unwrap_err();
        assert!(err.to_string().contains("Minimum"));
    }

    #[test]
    fn test_withdrawal_above_maximum_rejected() {
        let bank = BankState::default();
        let err =
            withdrawal_amount(&amount(dec!(20001)), &balance(dec!(50000)), &bank).unwrap_err();
        assert!(err.to_string().contains("at most"));
    }

    #[test]
    fn test_withdrawal_over_balance_rejected() {
        let bank = BankState::default();
        let err = withdrawal_amount(&amount(dec!(600)), &balance(dec!(500)), &bank).unwrap_err();
        assert!(err.to_string().contains("account balance"));
    }

    #[test]
    fn test_withdrawal_within_bounds_accepted() {
        let bank = BankState::default();
        assert!(withdrawal_amount(&amount(dec!(500)), &balance(dec!(500)), &bank).is_ok());
        assert!(withdrawal_amount(&amount(dec!(20000)), &balance(dec!(25000)), &bank).is_ok());
    }

    #[test]
    fn test_loan_amount_positive_only() {
        assert!(loan_amount(&amount(dec!(0.01))).is_ok());
        assert!(loan_amount(&amount(dec!(0))).is_err());
    }

    #[test]
    fn test_loan_cap() {
        assert!(loan_cap(0).is_ok());
        assert!(loan_cap(2).is_ok());
        assert!(matches!(
            loan_cap(3),
            Err(DomainError::LoanLimitReached { count: 3 })
        ));
    }

    #[test]
    fn test_transfer_zero_accepted() {
        assert!(transfer_amount(&amount(dec!(0)), &balance(dec!(0))).is_ok());
    }

    #[test]
    fn test_transfer_over_balance_rejected() {
        let err = transfer_amount(&amount(dec!(100)), &balance(dec!(99))).unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "amount", .. }));
    }
}

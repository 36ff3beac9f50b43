//! Loan Handler
//!
//! Loan lifecycle: request (no balance change), privileged approval
//! (credits the balance), payoff (debits it). The store enforces the
//! approved-loan cap and the REQUESTED -> APPROVED -> PAID transitions.

use std::sync::Arc;

use crate::domain::Transaction;
use crate::error::AppError;
use crate::notify::{self, Notifier, Template};
use crate::store::LedgerStore;

use super::{parse_amount, LoanRequestCommand};

/// Handler for the loan lifecycle
pub struct LoanHandler {
    store: Arc<dyn LedgerStore>,
    notifier: Arc<dyn Notifier>,
}

impl LoanHandler {
    pub fn new(store: Arc<dyn LedgerStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Submit a loan request. Rejected without creating any record when
    /// the account already has the maximum number of approved loans.
    pub async fn request(&self, command: LoanRequestCommand) -> Result<Transaction, AppError> {
        let amount = parse_amount(&command.amount)?;

        let transaction = self.store.request_loan(command.account_id, &amount).await?;
        let account = self.store.account(command.account_id).await?;

        tracing::info!(
            account_no = account.account_no,
            amount = %amount,
            "loan requested"
        );

        notify::dispatch(
            self.notifier.clone(),
            account.owner,
            amount.value(),
            "Loan Request",
            Template::LoanRequested,
        );

        Ok(transaction)
    }

    /// Privileged approval: credits the loan amount to the balance and
    /// marks the loan approved.
    pub async fn approve(&self, loan_id: i64) -> Result<Transaction, AppError> {
        let loan = self.store.approve_loan(loan_id).await?;
        let account = self.store.account(loan.account_id).await?;

        tracing::info!(
            account_no = account.account_no,
            loan_id,
            amount = %loan.amount,
            "loan approved"
        );

        notify::dispatch(
            self.notifier.clone(),
            account.owner,
            loan.amount,
            "Loan Approved",
            Template::LoanApproved,
        );

        Ok(loan)
    }

    /// Pay off an approved loan if the balance covers it.
    pub async fn pay(&self, loan_id: i64) -> Result<Transaction, AppError> {
        let loan = self.store.pay_loan(loan_id).await?;

        tracing::info!(loan_id, amount = %loan.amount, "loan paid off");

        Ok(loan)
    }

    /// List the loan transactions of one account.
    pub async fn list(&self, account_id: i64) -> Result<Vec<Transaction>, AppError> {
        Ok(self.store.loans(account_id).await?)
    }
}

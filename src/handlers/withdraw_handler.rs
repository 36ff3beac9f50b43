//! Withdraw Handler

use std::sync::Arc;

use crate::domain::Transaction;
use crate::error::AppError;
use crate::notify::{self, Notifier, Template};
use crate::store::LedgerStore;

use super::{parse_amount, WithdrawCommand};

/// Handler for withdrawals
pub struct WithdrawHandler {
    store: Arc<dyn LedgerStore>,
    notifier: Arc<dyn Notifier>,
}

impl WithdrawHandler {
    pub fn new(store: Arc<dyn LedgerStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Execute the withdraw command
    pub async fn execute(&self, command: WithdrawCommand) -> Result<Transaction, AppError> {
        let amount = parse_amount(&command.amount)?;

        let transaction = self.store.withdraw(command.account_id, &amount).await?;
        let account = self.store.account(command.account_id).await?;

        tracing::info!(
            account_no = account.account_no,
            amount = %amount,
            balance = %account.balance,
            "withdrawal completed"
        );

        notify::dispatch(
            self.notifier.clone(),
            account.owner,
            amount.value(),
            "Withdrawal Message",
            Template::WithdrawalReceipt,
        );

        Ok(transaction)
    }
}

//! Deposit Handler

use std::sync::Arc;

use crate::domain::Transaction;
use crate::error::AppError;
use crate::notify::{self, Notifier, Template};
use crate::store::LedgerStore;

use super::{parse_amount, DepositCommand};

/// Handler for deposits
pub struct DepositHandler {
    store: Arc<dyn LedgerStore>,
    notifier: Arc<dyn Notifier>,
}

impl DepositHandler {
    pub fn new(store: Arc<dyn LedgerStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Execute the deposit command
    pub async fn execute(&self, command: DepositCommand) -> Result<Transaction, AppError> {
        let amount = parse_amount(&command.amount)?;

        let transaction = self.store.deposit(command.account_id, &amount).await?;
        let account = self.store.account(command.account_id).await?;

        tracing::info!(
            account_no = account.account_no,
            amount = %amount,
            balance = %account.balance,
            "deposit completed"
        );

        notify::dispatch(
            self.notifier.clone(),
            account.owner,
            amount.value(),
            "Deposit Message",
            Template::DepositReceipt,
        );

        Ok(transaction)
    }
}

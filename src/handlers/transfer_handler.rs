//! Transfer Handler
//!
//! Moves money between two accounts. The store commits both legs in one
//! atomic unit; both parties are notified afterwards.

use std::sync::Arc;

use crate::error::AppError;
use crate::notify::{self, Notifier, Template};
use crate::store::LedgerStore;

use super::{parse_amount, TransferCommand, TransferResult};

/// Handler for transfers between accounts
pub struct TransferHandler {
    store: Arc<dyn LedgerStore>,
    notifier: Arc<dyn Notifier>,
}

impl TransferHandler {
    pub fn new(store: Arc<dyn LedgerStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Execute the transfer command
    pub async fn execute(&self, command: TransferCommand) -> Result<TransferResult, AppError> {
        let amount = parse_amount(&command.amount)?;

        let outcome = self
            .store
            .transfer(
                command.sender_account_id,
                command.receiver_account_no,
                &amount,
            )
            .await?;

        tracing::info!(
            sender_account_no = outcome.sender.account_no,
            receiver_account_no = outcome.receiver.account_no,
            amount = %amount,
            "transfer completed"
        );

        notify::dispatch(
            self.notifier.clone(),
            outcome.sender.owner.clone(),
            amount.value(),
            "Money Transferred",
            Template::TransferSent,
        );
        notify::dispatch(
            self.notifier.clone(),
            outcome.receiver.owner.clone(),
            amount.value(),
            "Money Received!",
            Template::TransferReceived,
        );

        Ok(TransferResult {
            transfer_id: outcome.record.id,
            sender_account_id: outcome.record.sender_account_id,
            receiver_account_no: outcome.record.receiver_account_no,
            amount: outcome.record.amount,
            sender_balance: outcome.sender.balance.value(),
            status: "completed".to_string(),
        })
    }
}

//! Notification boundary
//!
//! Fire-and-forget dispatch of transaction notifications. The core hands
//! over recipient, amount, a subject label and a named template; it never
//! formats the message body itself. A failed dispatch is logged and must
//! not fail or roll back the financial operation it follows.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::Owner;

/// Named message templates, one per notification-worthy event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    DepositReceipt,
    WithdrawalReceipt,
    LoanRequested,
    LoanApproved,
    TransferSent,
    TransferReceived,
}

impl Template {
    /// Stable key a delivery backend resolves to a message body.
    pub fn key(&self) -> &'static str {
        match self {
            Self::DepositReceipt => "deposit_email",
            Self::WithdrawalReceipt => "withdraw_email",
            Self::LoanRequested => "loan_email",
            Self::LoanApproved => "loan_approve_email",
            Self::TransferSent => "transfer_email",
            Self::TransferReceived => "receiver_email",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// Outbound notification dispatch.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        recipient: &Owner,
        amount: Decimal,
        subject: &str,
        template: Template,
    ) -> Result<(), NotifyError>;
}

/// Notifier that records dispatches in the log stream. Stands in for a
/// real mail backend; delivery itself is an external collaborator.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        recipient: &Owner,
        amount: Decimal,
        subject: &str,
        template: Template,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            recipient = %recipient.email,
            %amount,
            subject,
            template = template.key(),
            "notification dispatched"
        );
        Ok(())
    }
}

/// Dispatch without blocking the caller. Errors are logged and dropped;
/// the financial operation has already committed by the time this runs.
pub fn dispatch(
    notifier: Arc<dyn Notifier>,
    recipient: Owner,
    amount: Decimal,
    subject: &'static str,
    template: Template,
) {
    tokio::spawn(async move {
        if let Err(e) = notifier.notify(&recipient, amount, subject, template).await {
            tracing::warn!(
                recipient = %recipient.email,
                subject,
                "notification dispatch failed: {e}"
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_keys_are_distinct() {
        let keys = [
            Template::DepositReceipt,
            Template::WithdrawalReceipt,
            Template::LoanRequested,
            Template::LoanApproved,
            Template::TransferSent,
            Template::TransferReceived,
        ]
        .map(|t| t.key());

        for (i, a) in keys.iter().enumerate() {
            for b in keys.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        let recipient = Owner {
            username: "alice".to_string(),
            first_name: "Alice".to_string(),
            last_name: "A".to_string(),
            email: "alice@example.com".to_string(),
        };

        let result = LogNotifier
            .notify(
                &recipient,
                Decimal::new(100, 0),
                "Deposit Message",
                Template::DepositReceipt,
            )
            .await;

        assert!(result.is_ok());
    }
}

//! Register Handler
//!
//! Creates the bank account and its address from one profile submission.

use std::sync::Arc;

use crate::error::AppError;
use crate::store::{LedgerStore, NewProfile};

use super::{RegisterCommand, RegisterResult};

/// Handler for user registration
pub struct RegisterHandler {
    store: Arc<dyn LedgerStore>,
}

impl RegisterHandler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Execute the register command
    pub async fn execute(&self, command: RegisterCommand) -> Result<RegisterResult, AppError> {
        let registration = self
            .store
            .register(NewProfile {
                username: command.username,
                first_name: command.first_name,
                last_name: command.last_name,
                email: command.email,
                account_type: command.account_type,
                gender: command.gender,
                birth_date: command.birth_date,
                street: command.street,
                city: command.city,
                post_code: command.post_code,
                country: command.country,
            })
            .await?;

        tracing::info!(
            account_id = registration.account.id,
            account_no = registration.account.account_no,
            "account registered"
        );

        Ok(RegisterResult {
            account: registration.account,
            address: registration.address,
        })
    }
}

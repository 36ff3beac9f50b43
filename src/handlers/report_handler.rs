//! Report Handler
//!
//! Transaction reporting with an optional inclusive calendar-date range.

use std::sync::Arc;

use crate::error::AppError;
use crate::store::{DateRange, LedgerStore};

use super::{ReportQuery, ReportResult};

/// Handler for the transaction report
pub struct ReportHandler {
    store: Arc<dyn LedgerStore>,
}

impl ReportHandler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Execute the report query
    pub async fn execute(&self, query: ReportQuery) -> Result<ReportResult, AppError> {
        let range = match (query.start_date, query.end_date) {
            (Some(start), Some(end)) => Some(DateRange { start, end }),
            (None, None) => None,
            _ => {
                return Err(AppError::InvalidRequest(
                    "start_date and end_date must be provided together".to_string(),
                ))
            }
        };

        let report = self.store.transactions(query.account_id, range).await?;

        Ok(ReportResult {
            account_id: query.account_id,
            transactions: report.transactions,
            total: report.total,
        })
    }
}

//! Budget error types.

use chrono::NaiveDate;
use thiserror::Error;

/// Budget validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BudgetError {
    /// Start date falls after end date.
    #[error("Start date ({start}) must be on or before end date ({end})")]
    InvertedRange {
        /// Requested start date.
        start: NaiveDate,
        /// Requested end date.
        end: NaiveDate,
    },

    /// Amount must be strictly positive.
    #[error("Amount must be positive")]
    NonPositiveAmount,
}

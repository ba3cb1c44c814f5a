//! Report data types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sum, count and average over a set of amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalStats {
    /// Sum of amounts.
    pub total_amount: Decimal,
    /// Number of rows.
    pub total_count: u64,
    /// Mean amount, rounded to cents; zero for an empty set.
    pub average_amount: Decimal,
}

/// Spending for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotal {
    /// Month key, `YYYY-MM` (UTC).
    pub month: String,
    /// Sum of amounts in the month.
    pub total_amount: Decimal,
    /// Number of expenses in the month.
    pub expense_count: u64,
}

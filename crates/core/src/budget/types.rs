//! Budget data types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use spendwise_shared::types::{BudgetId, CategoryId};

/// The slice of a budget the accountant needs: its cap, window and category bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetWindow {
    /// Budget ID.
    pub id: BudgetId,
    /// Spending cap.
    pub amount: Decimal,
    /// First day of the window (inclusive).
    pub start_date: NaiveDate,
    /// Last day of the window (inclusive).
    pub end_date: NaiveDate,
    /// Category bucket; `None` is its own bucket, not a wildcard.
    pub category_id: Option<CategoryId>,
}

/// The slice of an expense the accountant needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpensePoint {
    /// Expense amount.
    pub amount: Decimal,
    /// Calendar date (UTC) the expense was recorded on.
    pub date: NaiveDate,
    /// Expense category.
    pub category_id: CategoryId,
}

/// Derived figures for a single budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetProgress {
    /// Amount attributed to the budget, rounded to cents.
    #[serde(with = "rust_decimal::serde::float")]
    pub spent_amount: Decimal,
    /// `amount - spent_amount`; negative when over budget.
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining_amount: Decimal,
    /// `spent_amount / amount * 100`, rounded to 2 places.
    #[serde(with = "rust_decimal::serde::float")]
    pub percentage_used: Decimal,
    /// Whether `spent_amount > amount`.
    pub is_over_budget: bool,
}

/// Alert tier for a budget nearing or past its cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// At least 80% used.
    Info,
    /// At least 90% used.
    Warning,
    /// Spent more than the cap.
    Critical,
}

//! Budget overlap accounting.
//!
//! Budgets in the same category bucket whose windows intersect share the
//! expenses they jointly cover, in proportion to their caps.

pub mod error;
pub mod overlap;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::BudgetError;
pub use overlap::{overlap_group, ranges_intersect, same_category_bucket};
pub use service::{BudgetService, round_half_up};
pub use types::{AlertSeverity, BudgetProgress, BudgetWindow, ExpensePoint};

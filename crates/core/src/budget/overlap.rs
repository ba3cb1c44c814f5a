//! Overlap predicates between budget windows.
//!
//! A window whose start lies after its end is malformed: it covers no date
//! and intersects no other window.

use chrono::NaiveDate;
use spendwise_shared::types::CategoryId;

use super::types::{BudgetWindow, ExpensePoint};

/// Category-bucket equality: `None` only matches `None`.
#[must_use]
pub fn same_category_bucket(a: Option<CategoryId>, b: Option<CategoryId>) -> bool {
    a == b
}

/// Closed-interval intersection; ranges touching at a single day intersect.
#[must_use]
pub fn ranges_intersect(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= a_end && b_start <= b_end && a_start <= b_end && a_end >= b_start
}

impl BudgetWindow {
    /// Returns true when `start_date <= end_date`.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.start_date <= self.end_date
    }

    /// Returns true when `date` lies within the window, both ends inclusive.
    #[must_use]
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.is_well_formed() && self.start_date <= date && date <= self.end_date
    }

    /// Returns true when `other` is a different budget in the same bucket whose
    /// window intersects this one.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.id != other.id
            && same_category_bucket(self.category_id, other.category_id)
            && ranges_intersect(
                self.start_date,
                self.end_date,
                other.start_date,
                other.end_date,
            )
    }

    /// Returns true when the expense counts toward this budget before proration:
    /// its date is covered and, for a categorised budget, its category matches.
    #[must_use]
    pub fn matches_expense(&self, expense: &ExpensePoint) -> bool {
        self.covers(expense.date)
            && self
                .category_id
                .is_none_or(|category| category == expense.category_id)
    }
}

/// Every other budget in `all` overlapping `target`.
#[must_use]
pub fn overlap_group<'a>(target: &BudgetWindow, all: &'a [BudgetWindow]) -> Vec<&'a BudgetWindow> {
    all.iter().filter(|other| target.overlaps(other)).collect()
}

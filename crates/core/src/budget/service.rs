//! Budget overlap accounting and validation.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use super::error::BudgetError;
use super::overlap::overlap_group;
use super::types::{AlertSeverity, BudgetProgress, BudgetWindow, ExpensePoint};

const INFO_THRESHOLD: Decimal = Decimal::from_parts(80, 0, 0, false, 0);
const WARNING_THRESHOLD: Decimal = Decimal::from_parts(90, 0, 0, false, 0);

/// Rounds to two decimal places, midpoints away from zero.
#[must_use]
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Budget service for business logic.
pub struct BudgetService;

impl BudgetService {
    /// Computes how much of `candidates` is attributed to `target`.
    ///
    /// `all` is every budget of the same user (with or without `target` itself).
    /// `candidates` must already be restricted to expenses inside the target's
    /// window and category bucket; see [`BudgetService::spent_from_pool`].
    ///
    /// An expense covered by several overlapping budgets is split between them
    /// in proportion to their caps. The result is rounded to cents.
    #[must_use]
    pub fn compute_spent(
        target: &BudgetWindow,
        all: &[BudgetWindow],
        candidates: &[ExpensePoint],
    ) -> Decimal {
        let group = overlap_group(target, all);

        if group.is_empty() {
            return round_half_up(candidates.iter().map(|e| e.amount).sum());
        }

        let total: Decimal = candidates
            .iter()
            .map(|expense| {
                let covering: Vec<&BudgetWindow> = std::iter::once(target)
                    .chain(group.iter().copied())
                    .filter(|b| b.covers(expense.date))
                    .collect();

                if covering.len() == 1 {
                    return expense.amount;
                }

                let covering_cap: Decimal = covering.iter().map(|b| b.amount).sum();
                if covering_cap.is_zero() {
                    return Decimal::ZERO;
                }
                expense.amount * target.amount / covering_cap
            })
            .sum();

        round_half_up(total)
    }

    /// Filters `pool` down to the target's candidates, then computes the spent amount.
    #[must_use]
    pub fn spent_from_pool(
        target: &BudgetWindow,
        all: &[BudgetWindow],
        pool: &[ExpensePoint],
    ) -> Decimal {
        let candidates: Vec<ExpensePoint> = pool
            .iter()
            .filter(|e| target.matches_expense(e))
            .cloned()
            .collect();
        Self::compute_spent(target, all, &candidates)
    }

    /// Derives remaining amount, percentage and over-budget flag.
    #[must_use]
    pub fn progress(amount: Decimal, spent_amount: Decimal) -> BudgetProgress {
        BudgetProgress {
            spent_amount,
            remaining_amount: amount - spent_amount,
            percentage_used: Self::percentage_used(amount, spent_amount)
                .map_or(Decimal::ZERO, round_half_up),
            is_over_budget: spent_amount > amount,
        }
    }

    fn percentage_used(amount: Decimal, spent_amount: Decimal) -> Option<Decimal> {
        if amount.is_zero() {
            return None;
        }
        spent_amount
            .checked_div(amount)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
    }

    /// Classifies a budget for alerting; `None` below 80% used.
    ///
    /// Thresholds compare the unrounded percentage.
    #[must_use]
    pub fn alert_severity(amount: Decimal, spent_amount: Decimal) -> Option<AlertSeverity> {
        if spent_amount > amount {
            return Some(AlertSeverity::Critical);
        }
        let pct = Self::percentage_used(amount, spent_amount)?;
        if pct >= WARNING_THRESHOLD {
            Some(AlertSeverity::Warning)
        } else if pct >= INFO_THRESHOLD {
            Some(AlertSeverity::Info)
        } else {
            None
        }
    }

    /// Validates a budget's cap and window.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::NonPositiveAmount` if `amount <= 0`.
    /// Returns `BudgetError::InvertedRange` if `start > end`.
    pub fn validate(amount: Decimal, start: NaiveDate, end: NaiveDate) -> Result<(), BudgetError> {
        if amount <= Decimal::ZERO {
            return Err(BudgetError::NonPositiveAmount);
        }
        Self::validate_range(start, end)
    }

    /// Validates a budget window.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::InvertedRange` if `start > end`.
    pub fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<(), BudgetError> {
        if start > end {
            return Err(BudgetError::InvertedRange { start, end });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use spendwise_shared::types::{BudgetId, CategoryId};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn budget(
        amount: Decimal,
        start: NaiveDate,
        end: NaiveDate,
        category_id: Option<CategoryId>,
    ) -> BudgetWindow {
        BudgetWindow {
            id: BudgetId::new(),
            amount,
            start_date: start,
            end_date: end,
            category_id,
        }
    }

    fn expense(amount: Decimal, date: NaiveDate, category_id: CategoryId) -> ExpensePoint {
        ExpensePoint {
            amount,
            date,
            category_id,
        }
    }

    #[test]
    fn test_monthly_and_rolling_budget_split_shared_expense() {
        let food = CategoryId::new();
        let a = budget(dec!(100), date(1, 1), date(1, 31), Some(food));
        let b = budget(dec!(300), date(1, 15), date(2, 15), Some(food));
        let all = vec![a.clone(), b.clone()];
        let pool = vec![expense(dec!(40), date(1, 20), food)];

        assert_eq!(BudgetService::spent_from_pool(&a, &all, &pool), dec!(10.00));
        assert_eq!(BudgetService::spent_from_pool(&b, &all, &pool), dec!(30.00));
    }

    #[test]
    fn test_expense_covered_by_one_budget_counts_fully() {
        let food = CategoryId::new();
        let a = budget(dec!(100), date(1, 1), date(1, 31), Some(food));
        let b = budget(dec!(300), date(1, 15), date(2, 15), Some(food));
        let all = vec![a.clone(), b.clone()];
        let pool = vec![expense(dec!(40), date(1, 5), food)];

        assert_eq!(BudgetService::spent_from_pool(&a, &all, &pool), dec!(40));
        assert_eq!(BudgetService::spent_from_pool(&b, &all, &pool), Decimal::ZERO);
    }

    #[test]
    fn test_no_overlap_plain_sum() {
        let food = CategoryId::new();
        let a = budget(dec!(500), date(1, 1), date(1, 31), Some(food));
        let candidates = vec![
            expense(dec!(12.34), date(1, 1), food),
            expense(dec!(0.66), date(1, 31), food),
        ];

        assert_eq!(
            BudgetService::compute_spent(&a, std::slice::from_ref(&a), &candidates),
            dec!(13.00)
        );
    }

    #[test]
    fn test_other_category_budgets_do_not_prorate() {
        let food = CategoryId::new();
        let travel = CategoryId::new();
        let a = budget(dec!(100), date(1, 1), date(1, 31), Some(food));
        let all = vec![
            a.clone(),
            budget(dec!(100), date(1, 1), date(1, 31), Some(travel)),
            budget(dec!(100), date(1, 1), date(1, 31), None),
        ];
        let pool = vec![expense(dec!(50), date(1, 10), food)];

        assert_eq!(BudgetService::spent_from_pool(&a, &all, &pool), dec!(50));
    }

    #[test]
    fn test_zero_cap_covering_set_contributes_nothing() {
        let food = CategoryId::new();
        let a = budget(Decimal::ZERO, date(1, 1), date(1, 31), Some(food));
        let b = budget(Decimal::ZERO, date(1, 1), date(1, 31), Some(food));
        let all = vec![a.clone(), b];
        let pool = vec![expense(dec!(40), date(1, 10), food)];

        assert_eq!(BudgetService::spent_from_pool(&a, &all, &pool), Decimal::ZERO);
    }

    #[test]
    fn test_inverted_budget_spends_nothing() {
        let food = CategoryId::new();
        let a = budget(dec!(100), date(2, 1), date(1, 1), Some(food));
        let pool = vec![expense(dec!(40), date(1, 10), food)];

        assert_eq!(
            BudgetService::spent_from_pool(&a, std::slice::from_ref(&a), &pool),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_proration_rounds_half_up() {
        let food = CategoryId::new();
        // 0.05 * 100 / 200 = 0.025 -> 0.03
        let a = budget(dec!(100), date(1, 1), date(1, 31), Some(food));
        let b = budget(dec!(100), date(1, 1), date(1, 31), Some(food));
        let all = vec![a.clone(), b];
        let pool = vec![expense(dec!(0.05), date(1, 10), food)];

        assert_eq!(BudgetService::spent_from_pool(&a, &all, &pool), dec!(0.03));
    }

    #[test]
    fn test_progress() {
        let progress = BudgetService::progress(dec!(300), dec!(100));
        assert_eq!(progress.spent_amount, dec!(100));
        assert_eq!(progress.remaining_amount, dec!(200));
        assert_eq!(progress.percentage_used, dec!(33.33));
        assert!(!progress.is_over_budget);

        let over = BudgetService::progress(dec!(100), dec!(110));
        assert_eq!(over.remaining_amount, dec!(-10));
        assert!(over.is_over_budget);
    }

    #[rstest]
    #[case(dec!(79.99), None)]
    #[case(dec!(80), Some(AlertSeverity::Info))]
    #[case(dec!(89.99), Some(AlertSeverity::Info))]
    #[case(dec!(90), Some(AlertSeverity::Warning))]
    #[case(dec!(95), Some(AlertSeverity::Warning))]
    #[case(dec!(100), Some(AlertSeverity::Warning))]
    #[case(dec!(110), Some(AlertSeverity::Critical))]
    fn test_alert_severity(#[case] spent: Decimal, #[case] expected: Option<AlertSeverity>) {
        assert_eq!(BudgetService::alert_severity(dec!(100), spent), expected);
    }

    #[test]
    fn test_validate() {
        assert!(BudgetService::validate(dec!(1), date(1, 1), date(1, 1)).is_ok());
        assert_eq!(
            BudgetService::validate(dec!(0), date(1, 1), date(1, 2)),
            Err(BudgetError::NonPositiveAmount)
        );
        assert_eq!(
            BudgetService::validate(dec!(10), date(2, 1), date(1, 1)),
            Err(BudgetError::InvertedRange {
                start: date(2, 1),
                end: date(1, 1),
            })
        );
    }
}

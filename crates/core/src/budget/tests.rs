//! Property-based tests for budget module.

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use spendwise_shared::types::{BudgetId, CategoryId};

use super::service::BudgetService;
use super::types::{BudgetWindow, ExpensePoint};

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn day(offset: u64) -> NaiveDate {
    base().checked_add_days(Days::new(offset)).unwrap()
}

fn cents(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

fn window(amount: Decimal, start: u64, len: u64, category_id: Option<CategoryId>) -> BudgetWindow {
    BudgetWindow {
        id: BudgetId::new(),
        amount,
        start_date: day(start),
        end_date: day(start + len),
        category_id,
    }
}

proptest! {
    /// With no overlapping budget the spent amount is the exact sum.
    #[test]
    fn test_no_overlap_equals_sum(
        amounts in prop::collection::vec(1i64..1_000_000, 0..20),
        offsets in prop::collection::vec(0u64..31, 20),
    ) {
        let food = CategoryId::new();
        let target = window(dec!(1000), 0, 30, Some(food));
        let candidates: Vec<ExpensePoint> = amounts
            .iter()
            .zip(&offsets)
            .map(|(a, o)| ExpensePoint { amount: cents(*a), date: day(*o), category_id: food })
            .collect();

        let expected: Decimal = candidates.iter().map(|e| e.amount).sum();
        let spent =
            BudgetService::compute_spent(&target, std::slice::from_ref(&target), &candidates);
        prop_assert_eq!(spent, expected);
    }

    /// Two identical windows split one expense by cap and together account for all of it.
    #[test]
    fn test_proration_conserves_total(
        cap_a in 1i64..10_000_000,
        cap_b in 1i64..10_000_000,
        amount in 1i64..10_000_000,
        offset in 0u64..=30,
    ) {
        let food = CategoryId::new();
        let a = window(cents(cap_a), 0, 30, Some(food));
        let b = window(cents(cap_b), 0, 30, Some(food));
        let all = vec![a.clone(), b.clone()];
        let pool = vec![ExpensePoint {
            amount: cents(amount),
            date: day(offset),
            category_id: food,
        }];

        let spent_a = BudgetService::spent_from_pool(&a, &all, &pool);
        let spent_b = BudgetService::spent_from_pool(&b, &all, &pool);

        prop_assert!((spent_a + spent_b - cents(amount)).abs() <= dec!(0.01));

        // spent_a / spent_b == cap_a / cap_b, up to rounding of each side
        let cross = (spent_a * cents(cap_b) - spent_b * cents(cap_a)).abs();
        prop_assert!(cross <= dec!(0.005) * (cents(cap_a) + cents(cap_b)));
    }

    /// Results are deterministic and carry at most two decimal places.
    #[test]
    fn test_idempotent_and_rounded(
        caps in prop::collection::vec(1i64..1_000_000, 1..5),
        starts in prop::collection::vec(0u64..60, 5),
        lens in prop::collection::vec(0u64..60, 5),
        amounts in prop::collection::vec(1i64..100_000, 0..15),
        offsets in prop::collection::vec(0u64..120, 15),
    ) {
        let food = CategoryId::new();
        let all: Vec<BudgetWindow> = caps
            .iter()
            .enumerate()
            .map(|(i, cap)| window(cents(*cap), starts[i], lens[i], Some(food)))
            .collect();
        let pool: Vec<ExpensePoint> = amounts
            .iter()
            .zip(&offsets)
            .map(|(a, o)| ExpensePoint { amount: cents(*a), date: day(*o), category_id: food })
            .collect();

        for target in &all {
            let first = BudgetService::spent_from_pool(target, &all, &pool);
            let second = BudgetService::spent_from_pool(target, &all, &pool);
            prop_assert_eq!(first, second);
            prop_assert!(first.scale() <= 2);
            prop_assert!(first >= Decimal::ZERO);
        }
    }

    /// Expenses on either boundary day count toward the budget.
    #[test]
    fn test_boundary_days_included(
        start in 0u64..100,
        len in 0u64..100,
        amount in 1i64..1_000_000,
    ) {
        let food = CategoryId::new();
        let target = window(dec!(500), start, len, Some(food));
        let pool = vec![
            ExpensePoint { amount: cents(amount), date: target.start_date, category_id: food },
            ExpensePoint { amount: cents(amount), date: target.end_date, category_id: food },
        ];

        let spent = BudgetService::spent_from_pool(&target, std::slice::from_ref(&target), &pool);
        prop_assert_eq!(spent, cents(amount) * Decimal::TWO);
    }
}

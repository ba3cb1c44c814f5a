//! Tests for the row-to-accountant projections.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use spendwise_core::budget::BudgetService;
use uuid::Uuid;

use crate::entities::{budgets, expenses};
use crate::repositories::budget::{expense_window, to_point, to_window};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn budget_row(
    amount: Decimal,
    start: NaiveDate,
    end: NaiveDate,
    category: Option<Uuid>,
) -> budgets::Model {
    let now = Utc::now().into();
    budgets::Model {
        id: Uuid::new_v4(),
        name: "Food".to_string(),
        amount,
        start_date: start,
        end_date: end,
        is_active: true,
        user_id: Uuid::new_v4(),
        category_id: category,
        created_at: now,
        updated_at: now,
    }
}

fn expense_row(amount: Decimal, at: DateTime<Utc>, category: Uuid) -> expenses::Model {
    let now = Utc::now().into();
    expenses::Model {
        id: Uuid::new_v4(),
        amount,
        description: "Lunch".to_string(),
        notes: None,
        date: at.into(),
        user_id: Uuid::new_v4(),
        category_id: category,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn expense_is_dated_by_its_utc_calendar_day() {
    let category = Uuid::new_v4();
    let offset = chrono::FixedOffset::east_opt(5 * 3600).unwrap();
    // 2024-01-01 02:00 at +05:00 is still 2023-12-31 in UTC.
    let local = offset.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap();

    let mut row = expense_row(dec!(12.50), Utc::now(), category);
    row.date = local;

    let point = to_point(&row);
    assert_eq!(point.date, date(2023, 12, 31));
    assert_eq!(point.amount, dec!(12.50));
    assert_eq!(point.category_id.into_inner(), category);
}

#[test]
fn window_keeps_the_category_bucket() {
    let category = Uuid::new_v4();
    let (start, end) = (date(2024, 1, 1), date(2024, 1, 31));
    let with = to_window(&budget_row(dec!(100), start, end, Some(category)));
    let without = to_window(&budget_row(dec!(100), start, end, None));

    assert_eq!(with.category_id.map(|c| c.into_inner()), Some(category));
    assert!(without.category_id.is_none());
}

#[test]
fn expense_window_spans_all_well_formed_budgets() {
    let windows = vec![
        to_window(&budget_row(dec!(100), date(2024, 1, 1), date(2024, 1, 31), None)),
        to_window(&budget_row(dec!(300), date(2024, 1, 15), date(2024, 2, 15), None)),
        // inverted rows are ignored
        to_window(&budget_row(dec!(50), date(2025, 6, 1), date(2023, 6, 1), None)),
    ];

    let (start, end) = expense_window(&windows).unwrap();
    assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    assert_eq!(end, Utc.with_ymd_and_hms(2024, 2, 16, 0, 0, 0).unwrap());
}

#[test]
fn expense_window_is_none_without_budgets() {
    assert!(expense_window(&[]).is_none());
}

#[test]
fn stored_rows_split_a_shared_expense_by_cap() {
    let food = Uuid::new_v4();
    let rows = [
        budget_row(dec!(100), date(2024, 1, 1), date(2024, 1, 31), Some(food)),
        budget_row(dec!(300), date(2024, 1, 15), date(2024, 2, 15), Some(food)),
    ];
    let windows: Vec<_> = rows.iter().map(to_window).collect();
    let pool = vec![to_point(&expense_row(
        dec!(40),
        Utc.with_ymd_and_hms(2024, 1, 20, 13, 45, 0).unwrap(),
        food,
    ))];

    let a = BudgetService::spent_from_pool(&windows[0], &windows, &pool);
    let b = BudgetService::spent_from_pool(&windows[1], &windows, &pool);
    assert_eq!(a, dec!(10.00));
    assert_eq!(b, dec!(30.00));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any instant on a budget's last day is inside the fetched range.
    #[test]
    fn last_day_instants_fall_inside_expense_window(secs in 0u32..86_400) {
        let row = budget_row(dec!(10), date(2024, 3, 1), date(2024, 3, 31), None);
        let windows = vec![to_window(&row)];
        let (start, end) = expense_window(&windows).unwrap();
        let instant = date(2024, 3, 31)
            .and_hms_opt(secs / 3600, (secs / 60) % 60, secs % 60)
            .unwrap()
            .and_utc();

        prop_assert!(instant >= start);
        prop_assert!(instant < end);
    }
}

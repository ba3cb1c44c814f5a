//! Integration tests for Budget repository.

mod common;

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;
use spendwise_core::budget::{AlertSeverity, BudgetError as RuleError};
use spendwise_db::{
    BudgetRepository, ExpenseRepository,
    repositories::{BudgetError, CreateBudgetInput, CreateExpenseInput, UpdateBudgetInput},
};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn budget(
    amount: rust_decimal::Decimal,
    start: NaiveDate,
    end: NaiveDate,
    category_id: Option<Uuid>,
) -> CreateBudgetInput {
    CreateBudgetInput {
        name: "Food".to_string(),
        amount,
        start_date: start,
        end_date: end,
        category_id,
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_overlapping_budgets_split_expense() {
    let db = common::connect().await;
    let user = common::create_test_user(&db).await;
    let food = common::create_test_category(&db).await;
    let budgets = BudgetRepository::new(db.clone());
    let expenses = ExpenseRepository::new(db.clone());

    let a = budgets
        .create(user.id, budget(dec!(100), date(2024, 1, 1), date(2024, 1, 31), Some(food)))
        .await
        .expect("Failed to create budget A");
    let b = budgets
        .create(user.id, budget(dec!(300), date(2024, 1, 15), date(2024, 2, 15), Some(food)))
        .await
        .expect("Failed to create budget B");

    expenses
        .create(
            user.id,
            CreateExpenseInput {
                amount: dec!(40),
                description: "Groceries".to_string(),
                notes: None,
                date: Some(Utc.with_ymd_and_hms(2024, 1, 20, 12, 0, 0).unwrap()),
                category_id: food,
            },
        )
        .await
        .expect("Failed to create expense");

    let listed = budgets.list_with_spent(user.id, None).await.unwrap();
    let spent = |id: Uuid| listed.iter().find(|b| b.record.budget.id == id).unwrap().spent;
    assert_eq!(spent(a.budget.id), dec!(10.00));
    assert_eq!(spent(b.budget.id), dec!(30.00));

    let progress = budgets.progress(user.id, a.budget.id).await.unwrap();
    assert_eq!(progress.progress.remaining_amount, dec!(90.00));
    assert_eq!(progress.progress.percentage_used, dec!(10.00));
    assert!(!progress.progress.is_over_budget);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_inactive_budget_still_shares_spending() {
    let db = common::connect().await;
    let user = common::create_test_user(&db).await;
    let food = common::create_test_category(&db).await;
    let budgets = BudgetRepository::new(db.clone());
    let expenses = ExpenseRepository::new(db.clone());

    let a = budgets
        .create(user.id, budget(dec!(100), date(2024, 3, 1), date(2024, 3, 31), Some(food)))
        .await
        .unwrap();
    let b = budgets
        .create(user.id, budget(dec!(100), date(2024, 3, 1), date(2024, 3, 31), Some(food)))
        .await
        .unwrap();
    budgets
        .update(
            user.id,
            b.budget.id,
            UpdateBudgetInput {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    expenses
        .create(
            user.id,
            CreateExpenseInput {
                amount: dec!(50),
                description: "Dinner".to_string(),
                notes: None,
                date: Some(Utc.with_ymd_and_hms(2024, 3, 10, 19, 0, 0).unwrap()),
                category_id: food,
            },
        )
        .await
        .unwrap();

    let active = budgets.list_with_spent(user.id, Some(true)).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].record.budget.id, a.budget.id);
    assert_eq!(active[0].spent, dec!(25.00));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_inverted_range_rejected_on_create_and_merged_update() {
    let db = common::connect().await;
    let user = common::create_test_user(&db).await;
    let budgets = BudgetRepository::new(db.clone());

    let result = budgets
        .create(user.id, budget(dec!(100), date(2024, 2, 1), date(2024, 1, 1), None))
        .await;
    assert!(matches!(
        result,
        Err(BudgetError::Invalid(RuleError::InvertedRange { .. }))
    ));

    let created = budgets
        .create(user.id, budget(dec!(100), date(2024, 1, 1), date(2024, 1, 31), None))
        .await
        .unwrap();
    let result = budgets
        .update(
            user.id,
            created.budget.id,
            UpdateBudgetInput {
                start_date: Some(date(2024, 2, 10)),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(BudgetError::Invalid(RuleError::InvertedRange { .. }))
    ));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_unknown_category_rejected() {
    let db = common::connect().await;
    let user = common::create_test_user(&db).await;
    let budgets = BudgetRepository::new(db.clone());
    let missing = Uuid::new_v4();

    let result = budgets
        .create(user.id, budget(dec!(100), date(2024, 1, 1), date(2024, 1, 31), Some(missing)))
        .await;
    assert!(matches!(result, Err(BudgetError::CategoryNotFound(id)) if id == missing));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_alert_for_current_budget() {
    let db = common::connect().await;
    let user = common::create_test_user(&db).await;
    let food = common::create_test_category(&db).await;
    let budgets = BudgetRepository::new(db.clone());
    let expenses = ExpenseRepository::new(db.clone());
    let today = Utc::now().date_naive();

    let created = budgets
        .create(user.id, budget(dec!(100), today, today, Some(food)))
        .await
        .unwrap();
    expenses
        .create(
            user.id,
            CreateExpenseInput {
                amount: dec!(95),
                description: "Big shop".to_string(),
                notes: None,
                date: None,
                category_id: food,
            },
        )
        .await
        .unwrap();

    let alerts = budgets.alerts(user.id, today).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].record.budget.id, created.budget.id);
    assert_eq!(alerts[0].severity, AlertSeverity::Warning);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_other_users_budget_is_not_found() {
    let db = common::connect().await;
    let owner = common::create_test_user(&db).await;
    let stranger = common::create_test_user(&db).await;
    let budgets = BudgetRepository::new(db.clone());

    let created = budgets
        .create(owner.id, budget(dec!(100), date(2024, 1, 1), date(2024, 1, 31), None))
        .await
        .unwrap();

    assert!(matches!(
        budgets.get(stranger.id, created.budget.id).await,
        Err(BudgetError::NotFound(_))
    ));
    assert!(matches!(
        budgets.delete(stranger.id, created.budget.id).await,
        Err(BudgetError::NotFound(_))
    ));
}

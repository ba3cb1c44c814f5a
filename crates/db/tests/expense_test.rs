//! Integration tests for Expense, Income and Category repositories.

mod common;

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use spendwise_db::{
    CategoryRepository, ExpenseRepository, IncomeRepository,
    repositories::{
        CategoryError, CreateCategoryInput, CreateExpenseInput, CreateIncomeInput, DeleteOutcome,
        ExpenseError, ExpenseFilter, IncomeFilter, UpdateCategoryInput,
    },
};
use spendwise_shared::types::PageRequest;
use uuid::Uuid;

fn expense(
    amount: rust_decimal::Decimal,
    description: &str,
    category_id: Uuid,
) -> CreateExpenseInput {
    CreateExpenseInput {
        amount,
        description: description.to_string(),
        notes: None,
        date: None,
        category_id,
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_expense_search_is_case_insensitive() {
    let db = common::connect().await;
    let user = common::create_test_user(&db).await;
    let category = common::create_test_category(&db).await;
    let repo = ExpenseRepository::new(db.clone());

    repo.create(user.id, expense(dec!(12.50), "Coffee Beans", category)).await.unwrap();
    repo.create(user.id, expense(dec!(30), "Train ticket", category)).await.unwrap();

    let filter = ExpenseFilter {
        search: Some("coffee".to_string()),
        ..Default::default()
    };
    let (rows, total) = repo.list(user.id, &filter, PageRequest::new(1, 10)).await.unwrap();

    assert_eq!(total, 1);
    assert_eq!(rows[0].expense.description, "Coffee Beans");
    assert_eq!(rows[0].category.as_ref().map(|c| c.id), Some(category));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_expense_requires_active_category() {
    let db = common::connect().await;
    let user = common::create_test_user(&db).await;
    let category = common::create_test_category(&db).await;
    CategoryRepository::new(db.clone())
        .update(
            category,
            UpdateCategoryInput {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let result = ExpenseRepository::new(db.clone())
        .create(user.id, expense(dec!(5), "Snack", category))
        .await;
    assert!(matches!(result, Err(ExpenseError::CategoryNotFound(_))));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_expense_stats_totals_and_months() {
    let db = common::connect().await;
    let user = common::create_test_user(&db).await;
    let category = common::create_test_category(&db).await;
    let repo = ExpenseRepository::new(db.clone());

    for (amount, day) in [(dec!(10), 5), (dec!(20), 6)] {
        repo.create(
            user.id,
            CreateExpenseInput {
                date: Some(Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap()),
                ..expense(amount, "Lunch", category)
            },
        )
        .await
        .unwrap();
    }

    let stats = repo
        .stats(
            user.id,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            Some(Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap()),
        )
        .await
        .unwrap();

    assert_eq!(stats.totals.total_amount, dec!(30));
    assert_eq!(stats.totals.total_count, 2);
    assert_eq!(stats.totals.average_amount, dec!(15.00));
    assert_eq!(stats.by_category.len(), 1);
    assert_eq!(stats.monthly[0].month, "2024-05");
    assert_eq!(stats.monthly[0].expense_count, 2);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_category_delete_soft_when_used() {
    let db = common::connect().await;
    let user = common::create_test_user(&db).await;
    let used = common::create_test_category(&db).await;
    let unused = common::create_test_category(&db).await;
    let categories = CategoryRepository::new(db.clone());

    ExpenseRepository::new(db.clone())
        .create(user.id, expense(dec!(1), "Gum", used))
        .await
        .unwrap();

    assert_eq!(categories.delete(used).await.unwrap(), DeleteOutcome::Deactivated);
    assert_eq!(categories.delete(unused).await.unwrap(), DeleteOutcome::Deleted);
    assert!(categories.find_by_id(unused).await.unwrap().is_none());
    assert!(categories.find_active(used).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_category_duplicate_name() {
    let db = common::connect().await;
    let categories = CategoryRepository::new(db.clone());
    let name = format!("Dup {}", Uuid::new_v4());
    let input = CreateCategoryInput {
        name,
        description: None,
        color: Some("#ff0000".to_string()),
    };

    categories.create(input.clone()).await.unwrap();
    assert!(matches!(
        categories.create(input).await,
        Err(CategoryError::DuplicateName)
    ));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_income_stats_by_source_largest_first() {
    let db = common::connect().await;
    let user = common::create_test_user(&db).await;
    let repo = IncomeRepository::new(db.clone());

    let payments = [
        (dec!(100), "Freelance"),
        (dec!(2500), "Salary"),
        (dec!(50), "Freelance"),
    ];
    for (amount, source) in payments {
        repo.create(
            user.id,
            CreateIncomeInput {
                amount,
                description: "Payment".to_string(),
                source: source.to_string(),
                date: None,
            },
        )
        .await
        .unwrap();
    }

    let stats = repo.stats(user.id, None, None).await.unwrap();
    assert_eq!(stats.totals.total_amount, dec!(2650));
    assert_eq!(stats.by_source[0].source, "Salary");
    assert_eq!(stats.by_source[1].total_amount, dec!(150));
    assert_eq!(stats.by_source[1].count, 2);

    let (rows, total) = repo
        .list(
            user.id,
            &IncomeFilter {
                search: Some("FREE".to_string()),
                ..Default::default()
            },
            PageRequest::new(1, 10),
        )
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(rows.len(), 2);
}

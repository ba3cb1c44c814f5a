//! Integration tests for User repository.

mod common;

use spendwise_db::{
    UserRepository,
    repositories::{UpdateProfileInput, UserError},
};
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_user_create_and_find() {
    let db = common::connect().await;
    let repo = UserRepository::new(db.clone());
    let email = format!("test-{}@example.com", Uuid::new_v4());

    let user = repo
        .create("Test User", &email, "$argon2id$test_hash")
        .await
        .expect("Failed to create user");

    assert_eq!(user.email, email);
    assert_eq!(user.name, "Test User");
    assert!(user.is_active);

    let found = repo
        .find_by_email(&email)
        .await
        .expect("Failed to find user")
        .expect("User should exist");
    assert_eq!(found.id, user.id);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_user_duplicate_email_rejected() {
    let db = common::connect().await;
    let repo = UserRepository::new(db.clone());
    let user = common::create_test_user(&db).await;

    let result = repo.create("Other", &user.email, "$argon2id$x").await;
    assert!(matches!(result, Err(UserError::EmailTaken)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_profile_rejects_taken_email() {
    let db = common::connect().await;
    let repo = UserRepository::new(db.clone());
    let first = common::create_test_user(&db).await;
    let second = common::create_test_user(&db).await;

    let result = repo
        .update_profile(
            second.id,
            UpdateProfileInput {
                email: Some(first.email.clone()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(UserError::EmailTaken)));

    // Keeping one's own email is fine.
    let same = repo
        .update_profile(
            second.id,
            UpdateProfileInput {
                name: Some("Renamed".to_string()),
                email: Some(second.email.clone()),
                avatar: None,
            },
        )
        .await
        .expect("Failed to update profile");
    assert_eq!(same.name, "Renamed");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_deactivated_user_is_not_active() {
    let db = common::connect().await;
    let repo = UserRepository::new(db.clone());
    let user = common::create_test_user(&db).await;

    repo.deactivate(user.id).await.expect("Failed to deactivate");

    assert!(repo.find_active_by_id(user.id).await.unwrap().is_none());
    assert!(repo.find_by_id(user.id).await.unwrap().is_some());
}

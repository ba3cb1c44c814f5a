//! Database seeder for Spendwise.
//!
//! Inserts the default category catalogue. Categories that already exist are
//! left untouched, so the seeder can be re-run safely.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use spendwise_db::{
    CategoryRepository,
    repositories::{CategoryError, CreateCategoryInput},
};
use spendwise_shared::DatabaseConfig;

/// Name, description and color of each default category.
const DEFAULT_CATEGORIES: [(&str, &str, &str); 10] = [
    ("Food & Dining", "Restaurants, groceries, and food delivery", "#F59E0B"),
    ("Transportation", "Gas, public transport, taxi, car maintenance", "#3B82F6"),
    ("Shopping", "Clothing, electronics, and general shopping", "#EC4899"),
    ("Entertainment", "Movies, games, subscriptions, and hobbies", "#8B5CF6"),
    ("Bills & Utilities", "Electricity, water, internet, phone bills", "#EF4444"),
    ("Healthcare", "Medical expenses, insurance, pharmacy", "#10B981"),
    ("Education", "Books, courses, school fees", "#F97316"),
    ("Travel", "Flights, hotels, vacation expenses", "#06B6D4"),
    ("Personal Care", "Haircuts, cosmetics, gym membership", "#84CC16"),
    ("Other", "Miscellaneous expenses", "#6B7280"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    println!("Connecting to database...");
    let db = spendwise_db::connect(&DatabaseConfig {
        url,
        max_connections: 2,
        min_connections: 1,
    })
    .await
    .context("Failed to connect to database")?;

    println!("Seeding categories...");
    let repo = CategoryRepository::new(db);
    let mut created = 0;

    for (name, description, color) in DEFAULT_CATEGORIES {
        let input = CreateCategoryInput {
            name: name.to_string(),
            description: Some(description.to_string()),
            color: Some(color.to_string()),
        };

        match repo.create(input).await {
            Ok(_) => {
                created += 1;
                println!("  Created category: {name}");
            }
            Err(CategoryError::DuplicateName) => {
                println!("  Category {name} already exists, skipping...");
            }
            Err(e) => return Err(e).context(format!("Failed to insert category {name}")),
        }
    }

    println!("Seeding complete! {created} categories created.");
    Ok(())
}

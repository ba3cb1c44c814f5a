//! Database migration runner for Spendwise.
//!
//! Usage:
//!   migrator up      - Run all pending migrations
//!   migrator down    - Rollback last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations
//!
//! Reads `DATABASE_URL`.

use sea_orm_migration::prelude::*;
use spendwise_db::migration::Migrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // run_cli sets up its own tracing
    cli::run_cli(Migrator).await;
}

//! Core business logic for Spendwise.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//!
//! # Modules
//!
//! - `budget` - Budget overlap accounting, progress and alerts
//! - `auth` - Password hashing
//! - `reports` - Totals and monthly aggregation

pub mod auth;
pub mod budget;
pub mod reports;

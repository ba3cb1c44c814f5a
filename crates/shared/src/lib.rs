//! Shared types, errors, and configuration for Spendwise.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - JWT and email services

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::{Claims, TokenKind, TokenPair};
pub use config::{AppConfig, DatabaseConfig, EmailConfig, JwtSettings, ServerConfig};
pub use email::{EmailError, EmailService};
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};

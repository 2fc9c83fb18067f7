//! Database operations for the Brightkit `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Accounts and roles
//! - `products` / `labs` - Catalog
//! - `orders` / `order_items` - Order pipeline
//! - `support_tickets` / `support_messages` - Ticketing
//! - `lab_supports` / `lab_support_limits` - Lab support sessions and quotas
//! - `tower_sessions` - Session storage (created by the session store)
//!
//! # Migrations
//!
//! Migrations live in `crates/api/migrations/` and run on startup via
//! `sqlx::migrate!`.

pub mod catalog;
pub mod orders;
pub mod reports;
pub mod support;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalog::CatalogRepository;
pub use orders::OrderRepository;
pub use reports::{DeliveryReportRow, ReportsRepository, SalesReportRow, SupportReportRow};
pub use support::SupportRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Per-lab support quota exhausted for this customer.
    #[error("maximum support limit reached for this lab")]
    QuotaExceeded,
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the expenditure chain
//! - Repositories that commit each transition (status, ledger entry, audit
//!   record) in one database transaction
//! - Database migrations
//!
//! Counters shared between requests (`budget_lines` totals,
//! `ordonnancements.montant_paye`) are only moved by conditional SQL
//! increments; entity rows are updated under optimistic versioning.

pub mod entities;
pub mod error;
pub mod mapping;
pub mod migration;
pub mod repositories;

pub use error::RepositoryError;
pub use repositories::{
    AttachmentRepository, AuditRepository, BudgetLedgerRepository, CreateLiquidationInput,
    LiquidationRepository, OrdonnancementRepository, SettlementRepository,
};

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sygfp_shared::config::DatabaseConfig;

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection from the database configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}

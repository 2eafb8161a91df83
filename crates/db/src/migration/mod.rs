//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_expenditure_chain;
mod m20260315_000002_bordereaux;
mod m20260320_000003_urgent_liquidations;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_expenditure_chain::Migration),
            Box::new(m20260315_000002_bordereaux::Migration),
            Box::new(m20260320_000003_urgent_liquidations::Migration),
        ]
    }
}

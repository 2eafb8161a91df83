//! Urgent-settlement flag on liquidations.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(SCHEMA_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const SCHEMA_SQL: &str = r"
ALTER TABLE liquidations
    ADD COLUMN reglement_urgent BOOLEAN NOT NULL DEFAULT FALSE,
    ADD COLUMN urgence_motif TEXT,
    ADD COLUMN urgence_date TIMESTAMPTZ,
    ADD COLUMN urgence_par UUID,
    ADD CONSTRAINT chk_liquidations_urgence CHECK (
        reglement_urgent = (urgence_motif IS NOT NULL AND urgence_date IS NOT NULL AND urgence_par IS NOT NULL)
    );

CREATE INDEX idx_liquidations_urgent ON liquidations(urgence_date DESC) WHERE reglement_urgent;
";

const DROP_SQL: &str = r"
DROP INDEX IF EXISTS idx_liquidations_urgent;
ALTER TABLE liquidations
    DROP CONSTRAINT IF EXISTS chk_liquidations_urgence,
    DROP COLUMN IF EXISTS urgence_par,
    DROP COLUMN IF EXISTS urgence_date,
    DROP COLUMN IF EXISTS urgence_motif,
    DROP COLUMN IF EXISTS reglement_urgent;
";

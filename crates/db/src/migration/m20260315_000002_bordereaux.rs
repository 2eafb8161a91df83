//! Persisted bordereaux.
//!
//! Sequences are allocated per exercice from a counter row, so numbers
//! never repeat within a year and a rolled-back batch gives its number back.

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
CREATE TABLE bordereau_sequences (
    exercice INTEGER PRIMARY KEY,
    last_sequence BIGINT NOT NULL CHECK (last_sequence >= 1)
);

CREATE TABLE bordereaux (
    id UUID PRIMARY KEY,
    numero VARCHAR(20) NOT NULL UNIQUE,
    exercice INTEGER NOT NULL,
    sequence INTEGER NOT NULL CHECK (sequence BETWEEN 1 AND 9999),
    total BIGINT NOT NULL CHECK (total > 0),
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_bordereaux_sequence UNIQUE (exercice, sequence)
);

-- Selected movements in selection order; rejected ones are kept as excluded.
CREATE TABLE bordereau_reglements (
    bordereau_id UUID NOT NULL REFERENCES bordereaux(id) ON DELETE CASCADE,
    reglement_id UUID NOT NULL REFERENCES reglements(id),
    position INTEGER NOT NULL,
    excluded BOOLEAN NOT NULL DEFAULT FALSE,
    PRIMARY KEY (bordereau_id, reglement_id)
);
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS bordereau_reglements CASCADE;
DROP TABLE IF EXISTS bordereaux CASCADE;
DROP TABLE IF EXISTS bordereau_sequences CASCADE;
";

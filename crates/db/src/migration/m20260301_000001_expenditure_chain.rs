//! Expenditure chain schema.
//!
//! Budget lines with their consumption counters and ledger entries, the
//! engagement → liquidation → ordonnancement → règlement chain, attachments
//! and the audit log. Amounts are BIGINT minor units.

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
-- ============================================================
-- BUDGET LINES
-- Counters are moved only by atomic conditional increments.
-- ============================================================
CREATE TABLE budget_lines (
    id UUID PRIMARY KEY,
    code VARCHAR(50) NOT NULL,
    libelle VARCHAR(255) NOT NULL,
    exercice INTEGER NOT NULL,
    dotation_initiale BIGINT NOT NULL DEFAULT 0,
    virements_entrants BIGINT NOT NULL DEFAULT 0,
    virements_sortants BIGINT NOT NULL DEFAULT 0,
    total_engage BIGINT NOT NULL DEFAULT 0,
    total_liquide BIGINT NOT NULL DEFAULT 0,
    total_paye BIGINT NOT NULL DEFAULT 0,
    version BIGINT NOT NULL DEFAULT 1,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_budget_lines_code UNIQUE (exercice, code),
    CONSTRAINT chk_budget_lines_totals CHECK (
        total_engage >= 0 AND total_liquide >= 0 AND total_paye >= 0
    )
);

CREATE TABLE budget_ledger_entries (
    id UUID PRIMARY KEY,
    budget_line_id UUID NOT NULL REFERENCES budget_lines(id),
    kind VARCHAR(20) NOT NULL CHECK (kind IN ('engagement', 'liquidation', 'paiement')),
    montant BIGINT NOT NULL CHECK (montant <> 0),
    source_type VARCHAR(30) NOT NULL,
    source_id UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_ledger_entries_line ON budget_ledger_entries(budget_line_id, created_at);
CREATE INDEX idx_ledger_entries_source ON budget_ledger_entries(source_type, source_id);

-- ============================================================
-- ENGAGEMENTS (read by liquidation creation)
-- ============================================================
CREATE TABLE engagements (
    id UUID PRIMARY KEY,
    numero VARCHAR(50) NOT NULL UNIQUE,
    budget_line_id UUID NOT NULL REFERENCES budget_lines(id),
    objet TEXT NOT NULL,
    montant BIGINT NOT NULL CHECK (montant > 0),
    statut VARCHAR(20) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- ============================================================
-- LIQUIDATIONS
-- ============================================================
CREATE TABLE liquidations (
    id UUID PRIMARY KEY,
    numero VARCHAR(50) NOT NULL UNIQUE,
    engagement_id UUID NOT NULL REFERENCES engagements(id),
    budget_line_id UUID NOT NULL REFERENCES budget_lines(id),
    montant_ht BIGINT NOT NULL,
    tva_montant BIGINT NOT NULL,
    montant_ttc BIGINT NOT NULL,
    airsi BIGINT NOT NULL DEFAULT 0,
    retenue_source BIGINT NOT NULL DEFAULT 0,
    bic BIGINT NOT NULL DEFAULT 0,
    bnc BIGINT NOT NULL DEFAULT 0,
    penalites BIGINT NOT NULL DEFAULT 0,
    total_retenues BIGINT NOT NULL,
    net_a_payer BIGINT NOT NULL,
    reference_facture VARCHAR(100),
    statut VARCHAR(20) NOT NULL,
    current_step SMALLINT NOT NULL DEFAULT 0,
    created_by UUID NOT NULL,
    certified_by UUID,
    certified_at TIMESTAMPTZ,
    submitted_at TIMESTAMPTZ,
    daaf_validated_by UUID,
    daaf_validated_at TIMESTAMPTZ,
    validated_by UUID,
    validated_at TIMESTAMPTZ,
    motif_rejet TEXT,
    rejected_by UUID,
    rejected_at TIMESTAMPTZ,
    rejected_step SMALLINT,
    motif_differe TEXT,
    deferred_by UUID,
    deferred_at TIMESTAMPTZ,
    date_reprise DATE,
    deferred_step SMALLINT,
    version BIGINT NOT NULL DEFAULT 1,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_liquidations_net CHECK (net_a_payer = montant_ttc - total_retenues),
    CONSTRAINT chk_liquidations_net_positive CHECK (net_a_payer >= 0),
    CONSTRAINT chk_liquidations_step CHECK (current_step BETWEEN 0 AND 2)
);

CREATE INDEX idx_liquidations_engagement ON liquidations(engagement_id);
CREATE INDEX idx_liquidations_line ON liquidations(budget_line_id) WHERE validated_at IS NOT NULL;

-- ============================================================
-- ORDONNANCEMENTS
-- montant_paye moves only through the settlement conditional update.
-- ============================================================
CREATE TABLE ordonnancements (
    id UUID PRIMARY KEY,
    numero VARCHAR(50) NOT NULL UNIQUE,
    liquidation_id UUID NOT NULL REFERENCES liquidations(id),
    budget_line_id UUID NOT NULL REFERENCES budget_lines(id),
    objet TEXT NOT NULL,
    beneficiaire VARCHAR(255) NOT NULL,
    montant BIGINT NOT NULL CHECK (montant > 0),
    montant_paye BIGINT NOT NULL DEFAULT 0,
    mode_paiement VARCHAR(20) NOT NULL,
    banque VARCHAR(100),
    rib VARCHAR(50),
    date_prevue_paiement DATE,
    statut VARCHAR(20) NOT NULL,
    current_step SMALLINT NOT NULL DEFAULT 0,
    motif_rejet TEXT,
    rejected_by UUID,
    rejected_at TIMESTAMPTZ,
    rejected_step SMALLINT,
    motif_differe TEXT,
    deferred_by UUID,
    deferred_at TIMESTAMPTZ,
    date_reprise DATE,
    deferred_step SMALLINT,
    transmitted_at TIMESTAMPTZ,
    created_by UUID NOT NULL,
    version BIGINT NOT NULL DEFAULT 1,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_ordonnancements_paye CHECK (montant_paye BETWEEN 0 AND montant)
);

CREATE INDEX idx_ordonnancements_liquidation ON ordonnancements(liquidation_id);

CREATE TABLE ordonnancement_steps (
    id UUID PRIMARY KEY,
    ordonnancement_id UUID NOT NULL REFERENCES ordonnancements(id) ON DELETE CASCADE,
    step_order SMALLINT NOT NULL CHECK (step_order >= 1),
    role VARCHAR(20) NOT NULL,
    status VARCHAR(20) NOT NULL,
    validated_by UUID,
    validated_at TIMESTAMPTZ,
    comments TEXT,
    CONSTRAINT uq_ordonnancement_steps UNIQUE (ordonnancement_id, step_order)
);

CREATE TABLE ordonnancement_signatures (
    id UUID PRIMARY KEY,
    ordonnancement_id UUID NOT NULL REFERENCES ordonnancements(id) ON DELETE CASCADE,
    signature_order SMALLINT NOT NULL CHECK (signature_order >= 1),
    role VARCHAR(20) NOT NULL,
    label VARCHAR(255) NOT NULL,
    signed_by UUID,
    signed_at TIMESTAMPTZ,
    signature_hash VARCHAR(64),
    CONSTRAINT uq_ordonnancement_signatures UNIQUE (ordonnancement_id, signature_order)
);

-- ============================================================
-- REGLEMENTS (never deleted, rejected rows are kept)
-- ============================================================
CREATE TABLE reglements (
    id UUID PRIMARY KEY,
    numero VARCHAR(50) NOT NULL,
    ordonnancement_id UUID NOT NULL REFERENCES ordonnancements(id),
    budget_line_id UUID NOT NULL REFERENCES budget_lines(id),
    montant BIGINT NOT NULL CHECK (montant > 0),
    mode_paiement VARCHAR(20) NOT NULL,
    reference VARCHAR(100),
    compte_bancaire VARCHAR(50),
    date_paiement DATE NOT NULL,
    statut VARCHAR(20) NOT NULL CHECK (statut IN ('enregistre', 'rejete')),
    motif_rejet TEXT,
    renvoi VARCHAR(20),
    rejected_by UUID,
    rejected_at TIMESTAMPTZ,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_reglements_ordonnancement ON reglements(ordonnancement_id, created_at);

-- ============================================================
-- ATTACHMENTS (documents stored elsewhere, only their presence matters)
-- ============================================================
CREATE TABLE attachments (
    id UUID PRIMARY KEY,
    entity_type VARCHAR(30) NOT NULL,
    entity_id UUID NOT NULL,
    document_type VARCHAR(40) NOT NULL,
    file_name VARCHAR(255) NOT NULL,
    uploaded_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_attachments_entity ON attachments(entity_type, entity_id);

-- ============================================================
-- AUDIT LOG (append-only)
-- ============================================================
CREATE TABLE audit_logs (
    id UUID PRIMARY KEY,
    entity_type VARCHAR(30) NOT NULL,
    entity_id UUID NOT NULL,
    action VARCHAR(40) NOT NULL,
    actor_id UUID NOT NULL,
    old_values JSONB,
    new_values JSONB,
    motif TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_audit_logs_entity ON audit_logs(entity_type, entity_id, created_at);

CREATE OR REPLACE FUNCTION prevent_audit_modification()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'audit_logs is append-only';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_audit_logs_append_only
BEFORE UPDATE OR DELETE ON audit_logs
FOR EACH ROW
EXECUTE FUNCTION prevent_audit_modification();
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS audit_logs CASCADE;
DROP FUNCTION IF EXISTS prevent_audit_modification();
DROP TABLE IF EXISTS attachments CASCADE;
DROP TABLE IF EXISTS reglements CASCADE;
DROP TABLE IF EXISTS ordonnancement_signatures CASCADE;
DROP TABLE IF EXISTS ordonnancement_steps CASCADE;
DROP TABLE IF EXISTS ordonnancements CASCADE;
DROP TABLE IF EXISTS liquidations CASCADE;
DROP TABLE IF EXISTS engagements CASCADE;
DROP TABLE IF EXISTS budget_ledger_entries CASCADE;
DROP TABLE IF EXISTS budget_lines CASCADE;
";

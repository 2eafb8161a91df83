//! `SeaORM` entities for the expenditure chain tables.

pub mod prelude;

pub mod attachments;
pub mod audit_logs;
pub mod bordereau_reglements;
pub mod bordereaux;
pub mod budget_ledger_entries;
pub mod budget_lines;
pub mod engagements;
pub mod liquidations;
pub mod ordonnancement_signatures;
pub mod ordonnancement_steps;
pub mod ordonnancements;
pub mod reglements;

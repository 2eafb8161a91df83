//! Entity prelude.

pub use super::attachments::Entity as Attachments;
pub use super::audit_logs::Entity as AuditLogs;
pub use super::bordereau_reglements::Entity as BordereauReglements;
pub use super::bordereaux::Entity as Bordereaux;
pub use super::budget_ledger_entries::Entity as BudgetLedgerEntries;
pub use super::budget_lines::Entity as BudgetLines;
pub use super::engagements::Entity as Engagements;
pub use super::liquidations::Entity as Liquidations;
pub use super::ordonnancement_signatures::Entity as OrdonnancementSignatures;
pub use super::ordonnancement_steps::Entity as OrdonnancementSteps;
pub use super::ordonnancements::Entity as Ordonnancements;
pub use super::reglements::Entity as Reglements;

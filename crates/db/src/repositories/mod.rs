//! Repository abstractions for data access.
//!
//! Repositories load domain values, run the pure state machines from
//! `sygfp-core`, and commit the outcome. Every write path runs inside a
//! single database transaction: either the status change, the ledger entry
//! and the audit record are all stored, or none is.

pub mod attachment;
pub mod audit;
pub mod budget_ledger;
pub mod liquidation;
pub mod ordonnancement;
pub mod settlement;

pub use attachment::AttachmentRepository;
pub use audit::AuditRepository;
pub use budget_ledger::BudgetLedgerRepository;
pub use liquidation::{CreateLiquidationInput, LiquidationRepository};
pub use ordonnancement::OrdonnancementRepository;
pub use settlement::SettlementRepository;

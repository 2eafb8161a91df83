//! Core expenditure chain logic for SYGFP.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Every transition is computed as a new value; persistence collaborators commit
//! the result (status, ledger entry, audit record) in a single transaction.
//!
//! # Modules
//!
//! - `threshold` - DG validation ceiling
//! - `workflow` - Roles, authorization matrix, circuits and the transition error taxonomy
//! - `liquidation` - Liquidation state machine (service fait, DAAF control, DG validation)
//! - `ordonnancement` - Ordonnancement state machine (validation steps, signatures)
//! - `budget` - Budget line consumption ledger and impact projection
//! - `settlement` - Payment reconciliation against the ordonnancement ceiling, bordereaux
//! - `audit` - Immutable audit records for every transition

pub mod audit;
pub mod budget;
pub mod liquidation;
pub mod ordonnancement;
pub mod settlement;
pub mod threshold;
pub mod workflow;

pub use threshold::{DgThreshold, SEUIL_VALIDATION_DG};

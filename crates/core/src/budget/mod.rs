//! Budget line consumption ledger.
//!
//! Tracks engaged, liquidated and paid totals per line, refuses entries that
//! would break `paye <= liquide <= engage`, and projects the display impact of
//! a pending liquidation.

pub mod engagement;
pub mod error;
pub mod impact;
pub mod ledger;
pub mod service;
pub mod types;

#[cfg(test)]
mod ledger_props;

pub use engagement::{EngagementProgress, EngagementSnapshot, EngagementStatus};
pub use error::BudgetError;
pub use impact::{AlertLevel, BudgetImpact, SEUIL_ALERTE, SEUIL_DANGER, compute_impact};
pub use ledger::BudgetLedger;
pub use service::BudgetService;
pub use types::{BudgetLine, LedgerEntry, LedgerEntryKind, LedgerTotals};

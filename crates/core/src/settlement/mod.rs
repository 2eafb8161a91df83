//! Settlement reconciliation.
//!
//! Partial payments (règlements) are reconciled against the authorized
//! amount of an ordonnancement. The settlement status is derived from the
//! amounts by [`settlement_status`] and never stored.

pub mod bordereau;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use bordereau::{Bordereau, BordereauNumber};
pub use error::SettlementError;
pub use service::{NewPayment, PaymentCancellation, PaymentOutcome, SettlementService, TREASURY_ROLES};
pub use types::{
    Reglement, ReglementRejection, ReglementStatus, RenvoiTarget, SettlementStatus,
    SettlementSummary, settlement_status,
};

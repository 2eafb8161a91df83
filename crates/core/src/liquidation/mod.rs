//! Liquidation: service-fait certification, DAAF control and DG validation.

pub mod machine;
pub mod types;

#[cfg(test)]
mod machine_props;
#[cfg(test)]
mod tests;

pub use machine::{
    LIQUIDATION_MATRIX, LiquidationAction, LiquidationMachine, LiquidationTransition,
    NewLiquidation, REQUIRED_DOCUMENTS, URGENT_ROLES,
};
pub use types::{
    Liquidation, LiquidationAmounts, LiquidationStatus, Penalites, Retenues, TAUX_TVA_STANDARD,
    TauxRetenues, Urgence,
};

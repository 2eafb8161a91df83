//! DG validation ceiling.
//!
//! A liquidation whose net payable amount is strictly above the ceiling needs
//! a second validation step by the Director-General.

use sygfp_shared::types::Montant;

/// Default ceiling above which DG validation is mandatory (FCFA).
pub const SEUIL_VALIDATION_DG: Montant = Montant::new(50_000_000);

/// Configured DG validation ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DgThreshold(Montant);

impl DgThreshold {
    /// Creates a threshold with the given ceiling.
    #[must_use]
    pub const fn new(seuil: Montant) -> Self {
        Self(seuil)
    }

    /// Returns the ceiling.
    #[must_use]
    pub const fn seuil(self) -> Montant {
        self.0
    }

    /// Returns true if `amount` requires DG validation (`amount > seuil`).
    #[must_use]
    pub fn requires_dg_validation(self, amount: Montant) -> bool {
        amount > self.0
    }
}

impl Default for DgThreshold {
    fn default() -> Self {
        Self(SEUIL_VALIDATION_DG)
    }
}

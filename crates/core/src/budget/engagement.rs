//! The engagement as seen by the liquidation stage.
//!
//! Engagements follow their own, simpler chain; only the status and the
//! committed amount matter downstream.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sygfp_shared::types::{BudgetLineId, EngagementId, Montant, MoneyError};

/// Engagement status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementStatus {
    /// Draft.
    Brouillon,
    /// Submitted.
    Soumis,
    /// SAF visa granted.
    VisaSaf,
    /// Budget controller visa granted.
    VisaCb,
    /// DAAF visa granted.
    VisaDaaf,
    /// Fully validated.
    Valide,
    /// Rejected.
    Rejete,
}

impl EngagementStatus {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Brouillon => "brouillon",
            Self::Soumis => "soumis",
            Self::VisaSaf => "visa_saf",
            Self::VisaCb => "visa_cb",
            Self::VisaDaaf => "visa_daaf",
            Self::Valide => "valide",
            Self::Rejete => "rejete",
        }
    }

    /// Parses a status string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "brouillon" | "draft" => Some(Self::Brouillon),
            "soumis" | "submitted" => Some(Self::Soumis),
            "visa_saf" => Some(Self::VisaSaf),
            "visa_cb" => Some(Self::VisaCb),
            "visa_daaf" => Some(Self::VisaDaaf),
            "valide" | "validated" => Some(Self::Valide),
            "rejete" | "rejected" => Some(Self::Rejete),
            _ => None,
        }
    }
}

impl fmt::Display for EngagementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of an engagement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementSnapshot {
    /// Engagement ID.
    pub id: EngagementId,
    /// Budget line it consumes.
    pub budget_line_id: BudgetLineId,
    /// Committed amount.
    pub montant: Montant,
    /// Status.
    pub status: EngagementStatus,
}

/// Liquidation progress of an engagement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementProgress {
    /// Committed amount.
    pub montant_engage: Montant,
    /// Sum of the non-rejected liquidations.
    pub montant_liquide: Montant,
    /// Amount still open for liquidation (never below zero).
    pub restant_a_liquider: Montant,
    /// Liquidated share in percent, capped at 100.
    pub pourcentage: Decimal,
    /// True once nothing remains to liquidate.
    pub is_complet: bool,
}

impl EngagementProgress {
    /// Computes progress from the committed amount and the TTC amounts of
    /// the engagement's non-rejected liquidations.
    pub fn compute(
        montant_engage: Montant,
        liquidations: &[Montant],
    ) -> Result<Self, MoneyError> {
        let montant_liquide = Montant::sum(liquidations.iter().copied())?;
        let restant_a_liquider = montant_engage
            .checked_sub(montant_liquide)?
            .max(Montant::ZERO);
        let pourcentage = montant_liquide
            .percent_of(montant_engage)
            .min(Decimal::ONE_HUNDRED);

        Ok(Self {
            montant_engage,
            montant_liquide,
            restant_a_liquider,
            pourcentage,
            is_complet: restant_a_liquider.is_zero(),
        })
    }
}

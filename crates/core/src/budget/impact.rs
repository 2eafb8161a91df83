//! Read-only budget impact projection shown before a liquidation is validated.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sygfp_shared::types::{Montant, MoneyError};

use crate::budget::types::BudgetLine;

/// Consumption rate above which a warning is shown (percent).
pub const SEUIL_ALERTE: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

/// Consumption rate above which a danger alert is shown (percent).
pub const SEUIL_DANGER: Decimal = Decimal::from_parts(95, 0, 0, false, 0);

/// Display alert level derived from a consumption rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    /// Rate at or below 80%.
    Normal,
    /// Rate above 80%.
    Warning,
    /// Rate above 95%.
    Danger,
}

impl AlertLevel {
    /// Classifies a consumption rate.
    #[must_use]
    pub fn from_taux(taux: Decimal) -> Self {
        if taux > SEUIL_DANGER {
            Self::Danger
        } else if taux > SEUIL_ALERTE {
            Self::Warning
        } else {
            Self::Normal
        }
    }
}

/// Before/after consumption of a budget line for the current liquidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetImpact {
    /// Current allocation.
    pub dotation: Montant,
    /// Liquidated before the current liquidation.
    pub liquide_before: Montant,
    /// Liquidated after the current liquidation.
    pub liquide_after: Montant,
    /// Rate before, in percent.
    pub taux_avant: Decimal,
    /// Rate after, in percent.
    pub taux_apres: Decimal,
    /// Alert level of `taux_apres`.
    pub niveau: AlertLevel,
    /// True when the unrounded rate after exceeds 100%.
    pub depassement: bool,
}

/// Projects the impact of validating `net_a_payer_courant` on `line`.
///
/// `validated_excluding_current` lists the net amounts of the liquidations
/// already validated on the line. Pure: nothing is mutated.
pub fn compute_impact(
    line: &BudgetLine,
    validated_excluding_current: &[Montant],
    net_a_payer_courant: Montant,
) -> Result<BudgetImpact, MoneyError> {
    let dotation = line.dotation()?;
    let liquide_before = Montant::sum(validated_excluding_current.iter().copied())?;
    let liquide_after = liquide_before.checked_add(net_a_payer_courant)?;
    // Thresholds are strict, so classify on the unrounded rate.
    let ratio_apres = liquide_after.ratio_percent(dotation);

    Ok(BudgetImpact {
        dotation,
        liquide_before,
        liquide_after,
        taux_avant: liquide_before.percent_of(dotation),
        taux_apres: ratio_apres.round_dp(2),
        niveau: AlertLevel::from_taux(ratio_apres),
        depassement: ratio_apres > Decimal::ONE_HUNDRED,
    })
}

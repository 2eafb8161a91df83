//! Liquidation domain types.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sygfp_shared::types::{BudgetLineId, EngagementId, LiquidationId, Montant, MoneyError, UserId};

use crate::workflow::error::TransitionError;
use crate::workflow::types::{Deferral, Rejection};

/// Standard VAT rate in percent.
pub const TAUX_TVA_STANDARD: Decimal = Decimal::from_parts(18, 0, 0, false, 0);

/// Urgent-settlement flag: the payment should jump the treasury queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Urgence {
    /// Mandatory motif.
    pub motif: String,
    /// Who flagged it.
    pub marked_by: UserId,
    /// When it was flagged.
    pub marked_at: DateTime<Utc>,
}

/// Liquidation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiquidationStatus {
    /// Editable draft.
    #[serde(rename = "brouillon")]
    Brouillon,
    /// Service fait certified.
    #[serde(rename = "certifié_sf")]
    CertifieSf,
    /// Submitted for DAAF / SDCT control.
    #[serde(rename = "soumis")]
    Soumis,
    /// DAAF control passed.
    #[serde(rename = "validé_daaf")]
    ValideDaaf,
    /// DG validation passed.
    #[serde(rename = "validé_dg")]
    ValideDg,
    /// Rejected with motif.
    #[serde(rename = "rejete")]
    Rejete,
    /// Deferred with motif.
    #[serde(rename = "differe")]
    Differe,
}

impl LiquidationStatus {
    /// Returns the status code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Brouillon => "brouillon",
            Self::CertifieSf => "certifié_sf",
            Self::Soumis => "soumis",
            Self::ValideDaaf => "validé_daaf",
            Self::ValideDg => "validé_dg",
            Self::Rejete => "rejete",
            Self::Differe => "differe",
        }
    }

    /// Parses a status code, accented or not.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "brouillon" => Some(Self::Brouillon),
            "certifié_sf" | "certifie_sf" => Some(Self::CertifieSf),
            "soumis" => Some(Self::Soumis),
            "validé_daaf" | "valide_daaf" => Some(Self::ValideDaaf),
            "validé_dg" | "valide_dg" => Some(Self::ValideDg),
            "rejete" | "rejeté" => Some(Self::Rejete),
            "differe" | "différé" => Some(Self::Differe),
            _ => None,
        }
    }

    /// Returns true for the suspended statuses that only `Resume` leaves.
    #[must_use]
    pub const fn is_suspended(&self) -> bool {
        matches!(self, Self::Rejete | Self::Differe)
    }
}

impl fmt::Display for LiquidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Withholding amounts deducted from the TTC amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retenues {
    /// AIRSI withholding.
    pub airsi: Montant,
    /// Withholding at source.
    pub retenue_source: Montant,
    /// BIC withholding.
    pub bic: Montant,
    /// BNC withholding.
    pub bnc: Montant,
    /// Late-delivery penalties.
    pub penalites: Montant,
}

impl Retenues {
    /// Sum of every withholding.
    pub fn total(&self) -> Result<Montant, MoneyError> {
        Montant::sum([
            self.airsi,
            self.retenue_source,
            self.bic,
            self.bnc,
            self.penalites,
        ])
    }

    fn first_negative(&self) -> Option<Montant> {
        [
            self.airsi,
            self.retenue_source,
            self.bic,
            self.bnc,
            self.penalites,
        ]
        .into_iter()
        .find(|m| m.is_negative())
    }
}

/// Withholding rates in percent of the HT amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TauxRetenues {
    /// AIRSI rate.
    pub airsi: Decimal,
    /// Withholding-at-source rate.
    pub retenue_source: Decimal,
    /// BIC rate.
    pub bic: Decimal,
    /// BNC rate.
    pub bnc: Decimal,
}

/// How penalties are determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Penalites {
    /// No penalty.
    Aucune,
    /// Fixed amount.
    Forfait {
        /// The amount.
        montant: Montant,
    },
    /// Daily rate of the TTC amount times the days late.
    Journalieres {
        /// Daily rate in percent.
        taux_journalier: Decimal,
        /// Days late.
        nb_jours: u32,
    },
}

impl Penalites {
    fn amount(self, montant_ttc: Montant) -> Result<Montant, MoneyError> {
        match self {
            Self::Aucune => Ok(Montant::ZERO),
            Self::Forfait { montant } => Ok(montant),
            Self::Journalieres {
                taux_journalier,
                nb_jours,
            } => {
                let taux = taux_journalier
                    .checked_mul(Decimal::from(nb_jours))
                    .ok_or(MoneyError::Overflow)?;
                montant_ttc.apply_rate(taux)
            }
        }
    }
}

/// The monetary breakdown of a liquidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationAmounts {
    /// Amount before tax.
    pub montant_ht: Montant,
    /// VAT amount.
    pub tva_montant: Montant,
    /// Amount including tax.
    pub montant_ttc: Montant,
    /// Withholdings.
    pub retenues: Retenues,
    /// Sum of withholdings.
    pub total_retenues: Montant,
    /// `montant_ttc - total_retenues`.
    pub net_a_payer: Montant,
}

impl LiquidationAmounts {
    /// Builds the breakdown from explicit amounts.
    ///
    /// Fails `InvalidAmount` on a negative component and `ExceedsRemaining`
    /// when the withholdings exceed the TTC amount.
    pub fn new(
        montant_ht: Montant,
        tva_montant: Montant,
        retenues: Retenues,
    ) -> Result<Self, TransitionError> {
        if let Some(negative) = [montant_ht, tva_montant]
            .into_iter()
            .find(|m| m.is_negative())
            .or_else(|| retenues.first_negative())
        {
            return Err(TransitionError::InvalidAmount(negative));
        }
        let montant_ttc = montant_ht.checked_add(tva_montant)?;
        let total_retenues = retenues.total()?;
        if total_retenues > montant_ttc {
            return Err(TransitionError::ExceedsRemaining {
                amount: total_retenues,
                remaining: montant_ttc,
            });
        }
        Ok(Self {
            montant_ht,
            tva_montant,
            montant_ttc,
            retenues,
            total_retenues,
            net_a_payer: montant_ttc.checked_sub(total_retenues)?,
        })
    }

    /// Derives the breakdown from rates applied to the HT amount.
    pub fn from_rates(
        montant_ht: Montant,
        tva_taux: Decimal,
        taux: &TauxRetenues,
        penalites: Penalites,
    ) -> Result<Self, TransitionError> {
        let tva_montant = montant_ht.apply_rate(tva_taux)?;
        let montant_ttc = montant_ht.checked_add(tva_montant)?;
        let retenues = Retenues {
            airsi: montant_ht.apply_rate(taux.airsi)?,
            retenue_source: montant_ht.apply_rate(taux.retenue_source)?,
            bic: montant_ht.apply_rate(taux.bic)?,
            bnc: montant_ht.apply_rate(taux.bnc)?,
            penalites: penalites.amount(montant_ttc)?,
        };
        Self::new(montant_ht, tva_montant, retenues)
    }
}

/// A liquidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Liquidation {
    /// Liquidation ID.
    pub id: LiquidationId,
    /// Human-readable number.
    pub numero: String,
    /// Parent engagement.
    pub engagement_id: EngagementId,
    /// Budget line consumed.
    pub budget_line_id: BudgetLineId,
    /// Monetary breakdown.
    pub amounts: LiquidationAmounts,
    /// Supplier invoice reference.
    pub reference_facture: Option<String>,
    /// Status.
    pub status: LiquidationStatus,
    /// 0 before submission, 1 for DAAF control, 2 for DG validation.
    pub current_step: u8,
    /// Author.
    pub created_by: UserId,
    /// Service-fait certification stamp.
    pub certified_by: Option<UserId>,
    /// Service-fait certification time.
    pub certified_at: Option<DateTime<Utc>>,
    /// Submission time.
    pub submitted_at: Option<DateTime<Utc>>,
    /// DAAF control actor.
    pub daaf_validated_by: Option<UserId>,
    /// DAAF control time.
    pub daaf_validated_at: Option<DateTime<Utc>>,
    /// Actor who completed the validation chain.
    pub validated_by: Option<UserId>,
    /// Completion time of the validation chain.
    pub validated_at: Option<DateTime<Utc>>,
    /// Rejection stamp.
    pub rejection: Option<Rejection>,
    /// Deferral stamp.
    pub deferral: Option<Deferral>,
    /// Urgent-settlement flag, independent of the status.
    pub urgence: Option<Urgence>,
    /// Optimistic lock version.
    pub version: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Liquidation {
    /// Returns true once the validation chain is complete.
    #[must_use]
    pub const fn is_validation_complete(&self) -> bool {
        self.validated_at.is_some()
    }

    /// Returns true while the liquidation is flagged for urgent settlement.
    #[must_use]
    pub const fn is_urgent(&self) -> bool {
        self.urgence.is_some()
    }

    /// Snapshot recorded in audit old/new values.
    #[must_use]
    pub fn audit_snapshot(&self) -> Value {
        json!({
            "statut": self.status.as_str(),
            "current_step": self.current_step,
            "net_a_payer": self.amounts.net_a_payer,
            "motif_rejet": self.rejection.as_ref().map(|r| r.motif.clone()),
            "motif_differe": self.deferral.as_ref().map(|d| d.motif.clone()),
            "date_reprise": self.deferral.as_ref().and_then(|d| d.date_reprise),
            "validated_at": self.validated_at,
            "reglement_urgent": self.is_urgent(),
            "urgence_motif": self.urgence.as_ref().map(|u| u.motif.clone()),
            "version": self.version,
        })
    }
}

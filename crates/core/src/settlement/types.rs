//! Payment movement types and the derived settlement status.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sygfp_shared::types::{
    BudgetLineId, Montant, MoneyError, OrdonnancementId, ReglementId, UserId,
};

use crate::ordonnancement::{ModePaiement, Ordonnancement};

/// Status of a payment movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReglementStatus {
    /// Registered; counts toward `montant_paye`.
    Enregistre,
    /// Rejected; kept for history, no longer counted.
    Rejete,
}

impl ReglementStatus {
    /// Returns the status code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Enregistre => "enregistre",
            Self::Rejete => "rejete",
        }
    }

    /// Parses a status code.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "enregistre" | "enregistré" => Some(Self::Enregistre),
            "rejete" | "rejeté" => Some(Self::Rejete),
            _ => None,
        }
    }
}

impl fmt::Display for ReglementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chain stage the parent dossier should be sent back to after a rejection.
///
/// Recorded only; routing is done elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenvoiTarget {
    /// Back to the engagement stage.
    Engagement,
    /// Back to liquidation creation.
    Creation,
}

impl RenvoiTarget {
    /// Returns the target code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Engagement => "engagement",
            Self::Creation => "creation",
        }
    }

    /// Parses a target code.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "engagement" => Some(Self::Engagement),
            "creation" | "création" => Some(Self::Creation),
            _ => None,
        }
    }
}

/// Rejection stamp of a payment movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReglementRejection {
    /// Mandatory motif.
    pub motif: String,
    /// Optional renvoi target.
    pub renvoi: Option<RenvoiTarget>,
    /// Who rejected.
    pub rejected_by: UserId,
    /// When.
    pub rejected_at: DateTime<Utc>,
}

/// A payment movement against an ordonnancement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reglement {
    /// Movement ID.
    pub id: ReglementId,
    /// Human-readable number.
    pub numero: String,
    /// Ordonnancement paid.
    pub ordonnancement_id: OrdonnancementId,
    /// Budget line of the ordonnancement.
    pub budget_line_id: BudgetLineId,
    /// Amount paid.
    pub montant: Montant,
    /// Payment mode.
    pub mode_paiement: ModePaiement,
    /// Bank or cheque reference.
    pub reference: Option<String>,
    /// Debited account.
    pub compte_bancaire: Option<String>,
    /// Value date.
    pub date_paiement: NaiveDate,
    /// Status.
    pub status: ReglementStatus,
    /// Rejection stamp.
    pub rejection: Option<ReglementRejection>,
    /// Author.
    pub created_by: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Reglement {
    /// Returns true while the movement counts toward `montant_paye`.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ReglementStatus::Enregistre
    }

    /// Snapshot recorded in audit old/new values.
    #[must_use]
    pub fn audit_snapshot(&self) -> Value {
        json!({
            "statut": self.status.as_str(),
            "montant": self.montant,
            "ordonnancement_id": self.ordonnancement_id,
            "motif_rejet": self.rejection.as_ref().map(|r| r.motif.clone()),
            "renvoi": self.rejection.as_ref().and_then(|r| r.renvoi).map(|t| t.as_str()),
        })
    }
}

/// Derived settlement status of an ordonnancement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    /// Something remains to pay.
    Partiel,
    /// Fully paid ("Soldé").
    Solde,
}

impl SettlementStatus {
    /// Returns the status code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Partiel => "partiel",
            Self::Solde => "solde",
        }
    }
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single source of the settlement status: `Solde` iff `montant_paye >= montant`.
#[must_use]
pub fn settlement_status(ordonnancement: &Ordonnancement) -> SettlementStatus {
    if ordonnancement.montant_paye >= ordonnancement.montant {
        SettlementStatus::Solde
    } else {
        SettlementStatus::Partiel
    }
}

/// Payment position of an ordonnancement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementSummary {
    /// Ordonnancement ID.
    pub ordonnancement_id: OrdonnancementId,
    /// Authorized amount.
    pub montant: Montant,
    /// Paid so far.
    pub montant_paye: Montant,
    /// Remaining to pay.
    pub restant: Montant,
    /// Derived status.
    pub status: SettlementStatus,
    /// Active movements.
    pub reglements_actifs: usize,
    /// Rejected movements.
    pub reglements_rejetes: usize,
}

impl SettlementSummary {
    /// Summarizes an ordonnancement and its movements.
    pub fn compute(
        ordonnancement: &Ordonnancement,
        reglements: &[Reglement],
    ) -> Result<Self, MoneyError> {
        let own = reglements
            .iter()
            .filter(|r| r.ordonnancement_id == ordonnancement.id);
        let (actifs, rejetes) = own.fold((0, 0), |(a, r), reglement| {
            if reglement.is_active() {
                (a + 1, r)
            } else {
                (a, r + 1)
            }
        });
        Ok(Self {
            ordonnancement_id: ordonnancement.id,
            montant: ordonnancement.montant,
            montant_paye: ordonnancement.montant_paye,
            restant: ordonnancement.restant()?.max(Montant::ZERO),
            status: settlement_status(ordonnancement),
            reglements_actifs: actifs,
            reglements_rejetes: rejetes,
        })
    }
}

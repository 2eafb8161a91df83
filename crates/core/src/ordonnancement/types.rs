//! Ordonnancement (payment mandate) domain types.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sygfp_shared::types::{
    BudgetLineId, LiquidationId, Montant, MoneyError, OrdonnancementId, UserId,
};

use crate::workflow::circuit::Circuit;
use crate::workflow::types::{Deferral, Rejection, Role};

/// Ordonnancement status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrdonnancementStatus {
    /// Editable draft.
    Brouillon,
    /// Submitted, no step validated yet.
    Soumis,
    /// At least one step validated, more remain.
    EnValidation,
    /// Every validation step passed.
    Valide,
    /// Rejected with motif.
    Rejete,
    /// Deferred with motif.
    Differe,
    /// Fully signed and transmitted for payment.
    Transmis,
}

impl OrdonnancementStatus {
    /// Returns the status code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Brouillon => "brouillon",
            Self::Soumis => "soumis",
            Self::EnValidation => "en_validation",
            Self::Valide => "valide",
            Self::Rejete => "rejete",
            Self::Differe => "differe",
            Self::Transmis => "transmis",
        }
    }

    /// Parses a status code.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "brouillon" => Some(Self::Brouillon),
            "soumis" => Some(Self::Soumis),
            "en_validation" => Some(Self::EnValidation),
            "valide" | "validé" => Some(Self::Valide),
            "rejete" | "rejeté" => Some(Self::Rejete),
            "differe" | "différé" => Some(Self::Differe),
            "transmis" => Some(Self::Transmis),
            _ => None,
        }
    }
}

impl fmt::Display for OrdonnancementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModePaiement {
    /// Bank transfer.
    Virement,
    /// Cheque.
    Cheque,
    /// Cash.
    Especes,
    /// Mobile money.
    MobileMoney,
}

impl ModePaiement {
    /// Returns the mode code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Virement => "virement",
            Self::Cheque => "cheque",
            Self::Especes => "especes",
            Self::MobileMoney => "mobile_money",
        }
    }

    /// Parses a mode code.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "virement" => Some(Self::Virement),
            "cheque" | "chèque" => Some(Self::Cheque),
            "especes" | "espèces" => Some(Self::Especes),
            "mobile_money" => Some(Self::MobileMoney),
            _ => None,
        }
    }
}

impl fmt::Display for ModePaiement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Beneficiary bank details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    /// Bank name.
    pub banque: String,
    /// Account identifier (RIB).
    pub rib: String,
}

/// Status of one validation step record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Not reached yet.
    Waiting,
    /// Current step, awaiting its validator.
    Pending,
    /// Validated.
    Validated,
    /// Rejected here.
    Rejected,
    /// Deferred here.
    Deferred,
}

impl StepStatus {
    /// Returns the status code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Pending => "pending",
            Self::Validated => "validated",
            Self::Rejected => "rejected",
            Self::Deferred => "deferred",
        }
    }

    /// Parses a status code.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "waiting" => Some(Self::Waiting),
            "pending" => Some(Self::Pending),
            "validated" => Some(Self::Validated),
            "rejected" => Some(Self::Rejected),
            "deferred" => Some(Self::Deferred),
            _ => None,
        }
    }
}

/// One validation step record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationStepRecord {
    /// 1-based order.
    pub step_order: u8,
    /// Role assigned to the step.
    pub role: Role,
    /// Step status.
    pub status: StepStatus,
    /// Who acted on the step.
    pub validated_by: Option<UserId>,
    /// When the step was acted on.
    pub validated_at: Option<DateTime<Utc>>,
    /// Validator comments or motif.
    pub comments: Option<String>,
}

impl ValidationStepRecord {
    /// Builds the step records of a freshly submitted ordonnancement.
    #[must_use]
    pub fn from_circuit(circuit: &Circuit) -> Vec<Self> {
        circuit
            .steps()
            .iter()
            .map(|step| Self {
                step_order: step.order,
                role: step.role,
                status: if step.order == 1 {
                    StepStatus::Pending
                } else {
                    StepStatus::Waiting
                },
                validated_by: None,
                validated_at: None,
                comments: None,
            })
            .collect()
    }
}

/// One signature slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    /// 1-based order.
    pub signature_order: u8,
    /// Role allowed to sign.
    pub role: Role,
    /// Display label of the signatory.
    pub label: String,
    /// Who signed.
    pub signed_by: Option<UserId>,
    /// When it was signed.
    pub signed_at: Option<DateTime<Utc>>,
    /// SHA-256 over the mandate's critical fields.
    pub signature_hash: Option<String>,
}

impl SignatureRecord {
    /// Builds the empty signature slots from a circuit.
    #[must_use]
    pub fn from_circuit(circuit: &Circuit) -> Vec<Self> {
        circuit
            .steps()
            .iter()
            .map(|step| Self {
                signature_order: step.order,
                role: step.role,
                label: step.label.clone(),
                signed_by: None,
                signed_at: None,
                signature_hash: None,
            })
            .collect()
    }

    /// Returns true once signed.
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        self.signed_by.is_some()
    }
}

/// A payment mandate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ordonnancement {
    /// Ordonnancement ID.
    pub id: OrdonnancementId,
    /// Human-readable number.
    pub numero: String,
    /// Parent liquidation.
    pub liquidation_id: LiquidationId,
    /// Budget line consumed.
    pub budget_line_id: BudgetLineId,
    /// Object of the payment.
    pub objet: String,
    /// Beneficiary.
    pub beneficiaire: String,
    /// Authorized amount.
    pub montant: Montant,
    /// Running total of registered payments.
    pub montant_paye: Montant,
    /// Payment mode.
    pub mode_paiement: ModePaiement,
    /// Bank details, when paid by transfer.
    pub bank_details: Option<BankDetails>,
    /// Planned payment date.
    pub date_prevue_paiement: Option<NaiveDate>,
    /// Status.
    pub status: OrdonnancementStatus,
    /// Current validation step (0 before submission).
    pub current_step: u8,
    /// Validation step records.
    pub steps: Vec<ValidationStepRecord>,
    /// Signature slots (created on `valide`).
    pub signatures: Vec<SignatureRecord>,
    /// Rejection stamp.
    pub rejection: Option<Rejection>,
    /// Deferral stamp.
    pub deferral: Option<Deferral>,
    /// Transmission time.
    pub transmitted_at: Option<DateTime<Utc>>,
    /// Author.
    pub created_by: UserId,
    /// Optimistic lock version.
    pub version: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Ordonnancement {
    /// Remaining authorized amount still unpaid.
    pub fn restant(&self) -> Result<Montant, MoneyError> {
        self.montant.checked_sub(self.montant_paye)
    }

    /// Returns true when every signature slot exists and is signed.
    #[must_use]
    pub fn signatures_complete(&self) -> bool {
        !self.signatures.is_empty() && self.signatures.iter().all(SignatureRecord::is_signed)
    }

    /// The first unsigned slot, in order.
    #[must_use]
    pub fn next_signature(&self) -> Option<&SignatureRecord> {
        self.signatures
            .iter()
            .filter(|slot| !slot.is_signed())
            .min_by_key(|slot| slot.signature_order)
    }

    /// Returns true when payments may be registered.
    #[must_use]
    pub fn is_payable(&self) -> bool {
        matches!(
            self.status,
            OrdonnancementStatus::Valide | OrdonnancementStatus::Transmis
        ) && self.signatures_complete()
    }

    /// Snapshot recorded in audit old/new values.
    #[must_use]
    pub fn audit_snapshot(&self) -> Value {
        json!({
            "statut": self.status.as_str(),
            "current_step": self.current_step,
            "montant": self.montant,
            "montant_paye": self.montant_paye,
            "signatures": self.signatures.iter().filter(|s| s.is_signed()).count(),
            "motif_rejet": self.rejection.as_ref().map(|r| r.motif.clone()),
            "motif_differe": self.deferral.as_ref().map(|d| d.motif.clone()),
            "version": self.version,
        })
    }
}

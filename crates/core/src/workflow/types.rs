//! Workflow domain types shared by every stage of the expenditure chain.
//!
//! Roles, actors, action kinds, supporting documents and the rejection /
//! deferral stamps that suspend an entity until it is resumed.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sygfp_shared::types::UserId;

/// Organizational role held by a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Platform administrator.
    Admin,
    /// Directeur Général (ordonnateur).
    Dg,
    /// Directeur Administratif et Financier (DAAF).
    Daaf,
    /// Directeur Administratif et Financier (legacy DAF code).
    Daf,
    /// Sous-Direction de la Comptabilité et de la Trésorerie.
    Sdct,
    /// Operational direction (service owner).
    Direction,
    /// Contrôleur Budgétaire.
    Cb,
    /// Service Administratif et Financier.
    Saf,
    /// Agent Comptable.
    Ac,
    /// Treasury agent.
    Tresorerie,
    /// Regular agent without validation rights.
    Agent,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::Admin,
        Self::Dg,
        Self::Daaf,
        Self::Daf,
        Self::Sdct,
        Self::Direction,
        Self::Cb,
        Self::Saf,
        Self::Ac,
        Self::Tresorerie,
        Self::Agent,
    ];

    /// Returns the role code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Dg => "DG",
            Self::Daaf => "DAAF",
            Self::Daf => "DAF",
            Self::Sdct => "SDCT",
            Self::Direction => "DIRECTION",
            Self::Cb => "CB",
            Self::Saf => "SAF",
            Self::Ac => "AC",
            Self::Tresorerie => "TRESORERIE",
            Self::Agent => "AGENT",
        }
    }

    /// Parses a role code (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        let code = s.trim().to_uppercase();
        Self::ALL.into_iter().find(|role| role.as_str() == code)
    }

    const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compact set of roles.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RoleSet(u16);

impl RoleSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Builds a set from a slice of roles (usable in `const` tables).
    #[must_use]
    pub const fn of(roles: &[Role]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < roles.len() {
            bits |= roles[i].bit();
            i += 1;
        }
        Self(bits)
    }

    /// Returns true if the set contains `role`.
    #[must_use]
    pub const fn contains(self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    /// Returns true if the two sets share at least one role.
    #[must_use]
    pub const fn contains_any(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns a copy of the set with `role` added.
    #[must_use]
    pub const fn with(self, role: Role) -> Self {
        Self(self.0 | role.bit())
    }

    /// Iterates over the roles in the set.
    pub fn iter(self) -> impl Iterator<Item = Role> {
        Role::ALL.into_iter().filter(move |role| self.contains(*role))
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl fmt::Debug for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<&str> = self.iter().map(|role| role.as_str()).collect();
        write!(f, "{{{}}}", codes.join(", "))
    }
}

/// The user performing an action, with the roles they hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// The user ID.
    pub user_id: UserId,
    /// Roles held by the user.
    pub roles: RoleSet,
}

impl Actor {
    /// Creates an actor.
    pub fn new(user_id: UserId, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            user_id,
            roles: roles.into_iter().collect(),
        }
    }

    /// Returns true if the actor holds `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }

    /// Returns true if the actor holds any role of `roles`.
    #[must_use]
    pub fn has_any_role(&self, roles: RoleSet) -> bool {
        self.roles.contains_any(roles)
    }
}

/// Entity types of the expenditure chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Budget line.
    BudgetLine,
    /// Engagement.
    Engagement,
    /// Liquidation.
    Liquidation,
    /// Ordonnancement.
    Ordonnancement,
    /// Règlement (payment movement).
    Reglement,
    /// Bordereau (batch receipt).
    Bordereau,
}

impl EntityKind {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BudgetLine => "budget_line",
            Self::Engagement => "engagement",
            Self::Liquidation => "liquidation",
            Self::Ordonnancement => "ordonnancement",
            Self::Reglement => "reglement",
            Self::Bordereau => "bordereau",
        }
    }

    /// Parses an entity kind.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "budget_line" => Some(Self::BudgetLine),
            "engagement" => Some(Self::Engagement),
            "liquidation" => Some(Self::Liquidation),
            "ordonnancement" => Some(Self::Ordonnancement),
            "reglement" => Some(Self::Reglement),
            "bordereau" => Some(Self::Bordereau),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of action requested on an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    /// Entity creation.
    Create,
    /// Service-fait certification.
    CertifyServiceFait,
    /// Submission for validation.
    Submit,
    /// DAAF / SDCT control of a liquidation.
    ValidateDaaf,
    /// DG validation of a liquidation.
    ValidateDg,
    /// Validation of the current ordonnancement step.
    ValidateStep,
    /// Rejection with motif.
    Reject,
    /// Deferral with motif.
    Defer,
    /// Resumption of a rejected or deferred entity ("reprendre").
    Resume,
    /// Signature of a validated ordonnancement.
    Sign,
    /// Transmission of a fully signed ordonnancement.
    Transmit,
    /// Registration of a payment movement.
    #[serde(rename = "PAYMENT_REGISTERED")]
    RegisterPayment,
    /// Cancellation (rejection) of a payment movement.
    #[serde(rename = "PAYMENT_CANCELLED")]
    CancelPayment,
    /// Budget ledger posting.
    LedgerPosting,
    /// Flagging a liquidation for urgent settlement.
    MarkUrgent,
    /// Clearing the urgent-settlement flag.
    #[serde(rename = "REMOVE_URGENT")]
    UnmarkUrgent,
}

impl ActionKind {
    /// Returns the audit action code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::CertifyServiceFait => "CERTIFY_SERVICE_FAIT",
            Self::Submit => "SUBMIT",
            Self::ValidateDaaf => "VALIDATE_DAAF",
            Self::ValidateDg => "VALIDATE_DG",
            Self::ValidateStep => "VALIDATE_STEP",
            Self::Reject => "REJECT",
            Self::Defer => "DEFER",
            Self::Resume => "RESUME",
            Self::Sign => "SIGN",
            Self::Transmit => "TRANSMIT",
            Self::RegisterPayment => "PAYMENT_REGISTERED",
            Self::CancelPayment => "PAYMENT_CANCELLED",
            Self::LedgerPosting => "LEDGER_POSTING",
            Self::MarkUrgent => "MARK_URGENT",
            Self::UnmarkUrgent => "REMOVE_URGENT",
        }
    }

    /// Parses an audit action code.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATE" => Some(Self::Create),
            "CERTIFY_SERVICE_FAIT" => Some(Self::CertifyServiceFait),
            "SUBMIT" => Some(Self::Submit),
            "VALIDATE_DAAF" => Some(Self::ValidateDaaf),
            "VALIDATE_DG" => Some(Self::ValidateDg),
            "VALIDATE_STEP" => Some(Self::ValidateStep),
            "REJECT" => Some(Self::Reject),
            "DEFER" => Some(Self::Defer),
            "RESUME" => Some(Self::Resume),
            "SIGN" => Some(Self::Sign),
            "TRANSMIT" => Some(Self::Transmit),
            "PAYMENT_REGISTERED" => Some(Self::RegisterPayment),
            "PAYMENT_CANCELLED" => Some(Self::CancelPayment),
            "LEDGER_POSTING" => Some(Self::LedgerPosting),
            "MARK_URGENT" => Some(Self::MarkUrgent),
            "REMOVE_URGENT" => Some(Self::UnmarkUrgent),
            _ => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supporting document type attached to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Supplier invoice.
    Facture,
    /// Delivery note.
    BonLivraison,
    /// Reception report.
    PvReception,
    /// Service-fait attestation.
    AttestationServiceFait,
    /// Proof of payment.
    PreuvePaiement,
    /// Any other document.
    Autre,
}

impl DocumentType {
    /// Returns the document type code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Facture => "facture",
            Self::BonLivraison => "bon_livraison",
            Self::PvReception => "pv_reception",
            Self::AttestationServiceFait => "attestation_service_fait",
            Self::PreuvePaiement => "preuve_paiement",
            Self::Autre => "autre",
        }
    }

    /// Parses a document type code.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "facture" => Some(Self::Facture),
            "bon_livraison" => Some(Self::BonLivraison),
            "pv_reception" => Some(Self::PvReception),
            "attestation_service_fait" => Some(Self::AttestationServiceFait),
            "preuve_paiement" => Some(Self::PreuvePaiement),
            "autre" => Some(Self::Autre),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of document types attached to an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachments(BTreeSet<DocumentType>);

impl Attachments {
    /// Creates an empty attachment set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a document of type `doc` exists.
    #[must_use]
    pub fn contains(&self, doc: DocumentType) -> bool {
        self.0.contains(&doc)
    }

    /// Returns the required documents that are absent.
    #[must_use]
    pub fn missing(&self, required: &[DocumentType]) -> Vec<DocumentType> {
        required
            .iter()
            .copied()
            .filter(|doc| !self.contains(*doc))
            .collect()
    }

    /// Returns the document codes, sorted.
    #[must_use]
    pub fn codes(&self) -> Vec<&'static str> {
        self.0.iter().map(DocumentType::as_str).collect()
    }
}

impl FromIterator<DocumentType> for Attachments {
    fn from_iter<I: IntoIterator<Item = DocumentType>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Returns the trimmed motif, or `None` when it is blank.
#[must_use]
pub fn non_empty_motif(motif: &str) -> Option<String> {
    let trimmed = motif.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Rejection stamp attached to a rejected entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// Mandatory motif.
    pub motif: String,
    /// Who rejected.
    pub rejected_by: UserId,
    /// When the rejection happened.
    pub rejected_at: DateTime<Utc>,
    /// Step at which the rejection happened.
    pub step: u8,
}

/// Deferral stamp attached to a deferred entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deferral {
    /// Mandatory motif.
    pub motif: String,
    /// Who deferred.
    pub deferred_by: UserId,
    /// When the deferral happened.
    pub deferred_at: DateTime<Utc>,
    /// Optional target resume date.
    pub date_reprise: Option<NaiveDate>,
    /// Step at which the deferral happened.
    pub step: u8,
}

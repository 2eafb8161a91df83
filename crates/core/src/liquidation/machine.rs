//! Liquidation state machine.
//!
//! ```text
//! brouillon --certify--> certifié_sf --submit--> soumis --validate_daaf--> validé_daaf
//!                                                  |                          | (step 2 only)
//!                                            reject/defer                validate_dg
//!                                                  v                          v
//!                                          rejete / differe              validé_dg
//!                                                  | resume
//!                                                  v
//!                                              brouillon
//! ```
//!
//! `MarkUrgent` and `UnmarkUrgent` toggle the urgent-settlement flag from
//! any status but `rejete` and leave the status where it is.
//!
//! Each transition returns the new liquidation, the ledger entry to post
//! (only when the validation chain completes) and the audit record. Nothing
//! is mutated in place; the caller persists the three together.

use chrono::NaiveDate;
use sygfp_shared::types::{timestamp, LiquidationId};

use crate::audit::{AuditEmitter, AuditRecord};
use crate::budget::{EngagementProgress, EngagementSnapshot, EngagementStatus, LedgerEntry};
use crate::liquidation::types::{Liquidation, LiquidationAmounts, LiquidationStatus, Urgence};
use crate::threshold::DgThreshold;
use crate::workflow::authz::{AuthorizationMatrix, Gate, TransitionRule};
use crate::workflow::error::{Precondition, TransitionError};
use crate::workflow::types::{
    ActionKind, Actor, Attachments, Deferral, DocumentType, EntityKind, Rejection, Role, RoleSet,
    non_empty_motif,
};

/// Roles allowed to act on a liquidation they did not author.
pub const AUTHOR_ROLES: RoleSet =
    RoleSet::of(&[Role::Admin, Role::Sdct, Role::Daaf, Role::Direction]);

/// Roles allowed to create a liquidation.
pub const CREATE_ROLES: RoleSet = RoleSet::of(&[
    Role::Admin,
    Role::Sdct,
    Role::Daaf,
    Role::Direction,
    Role::Agent,
]);

/// Roles allowed to perform DAAF / SDCT control.
pub const DAAF_ROLES: RoleSet = RoleSet::of(&[Role::Admin, Role::Daaf, Role::Daf, Role::Sdct]);

/// Roles allowed to perform DG validation.
pub const DG_ROLES: RoleSet = RoleSet::of(&[Role::Admin, Role::Dg]);

/// Roles allowed to raise or clear the urgent-settlement flag.
pub const URGENT_ROLES: RoleSet =
    RoleSet::of(&[Role::Admin, Role::Dg, Role::Daaf, Role::Daf, Role::Sdct]);

/// Documents that must be attached before certification and submission.
pub const REQUIRED_DOCUMENTS: [DocumentType; 2] =
    [DocumentType::Facture, DocumentType::BonLivraison];

const RULES: &[TransitionRule<LiquidationStatus>] = &[
    TransitionRule::new(
        ActionKind::CertifyServiceFait,
        LiquidationStatus::Brouillon,
        Gate::AuthorOr(AUTHOR_ROLES),
    ),
    TransitionRule::new(
        ActionKind::Submit,
        LiquidationStatus::CertifieSf,
        Gate::AuthorOr(AUTHOR_ROLES),
    ),
    TransitionRule::new(
        ActionKind::ValidateDaaf,
        LiquidationStatus::Soumis,
        Gate::Roles(DAAF_ROLES),
    ),
    TransitionRule::new(ActionKind::Reject, LiquidationStatus::Soumis, Gate::Roles(DAAF_ROLES)),
    TransitionRule::new(ActionKind::Defer, LiquidationStatus::Soumis, Gate::Roles(DAAF_ROLES)),
    TransitionRule::new(
        ActionKind::ValidateDg,
        LiquidationStatus::ValideDaaf,
        Gate::Roles(DG_ROLES),
    ),
    TransitionRule::new(
        ActionKind::Reject,
        LiquidationStatus::ValideDaaf,
        Gate::Roles(DG_ROLES),
    ),
    TransitionRule::new(ActionKind::Defer, LiquidationStatus::ValideDaaf, Gate::Roles(DG_ROLES)),
    TransitionRule::new(
        ActionKind::Resume,
        LiquidationStatus::Rejete,
        Gate::AuthorOr(AUTHOR_ROLES),
    ),
    TransitionRule::new(
        ActionKind::Resume,
        LiquidationStatus::Differe,
        Gate::AuthorOr(AUTHOR_ROLES),
    ),
    // Urgency is a flag beside the status; a rejected liquidation cannot carry it.
    urgent(ActionKind::MarkUrgent, LiquidationStatus::Brouillon),
    urgent(ActionKind::MarkUrgent, LiquidationStatus::CertifieSf),
    urgent(ActionKind::MarkUrgent, LiquidationStatus::Soumis),
    urgent(ActionKind::MarkUrgent, LiquidationStatus::ValideDaaf),
    urgent(ActionKind::MarkUrgent, LiquidationStatus::ValideDg),
    urgent(ActionKind::MarkUrgent, LiquidationStatus::Differe),
    urgent(ActionKind::UnmarkUrgent, LiquidationStatus::Brouillon),
    urgent(ActionKind::UnmarkUrgent, LiquidationStatus::CertifieSf),
    urgent(ActionKind::UnmarkUrgent, LiquidationStatus::Soumis),
    urgent(ActionKind::UnmarkUrgent, LiquidationStatus::ValideDaaf),
    urgent(ActionKind::UnmarkUrgent, LiquidationStatus::ValideDg),
    urgent(ActionKind::UnmarkUrgent, LiquidationStatus::Differe),
];

const fn urgent(
    action: ActionKind,
    from: LiquidationStatus,
) -> TransitionRule<LiquidationStatus> {
    TransitionRule::new(action, from, Gate::Roles(URGENT_ROLES))
}

const fn is_urgency(kind: ActionKind) -> bool {
    matches!(kind, ActionKind::MarkUrgent | ActionKind::UnmarkUrgent)
}

/// The liquidation authorization matrix.
pub const LIQUIDATION_MATRIX: AuthorizationMatrix<LiquidationStatus> =
    AuthorizationMatrix::new(EntityKind::Liquidation, RULES);

/// Input for a new liquidation.
#[derive(Debug, Clone)]
pub struct NewLiquidation {
    /// Human-readable number.
    pub numero: String,
    /// Parent engagement.
    pub engagement: EngagementSnapshot,
    /// Monetary breakdown.
    pub amounts: LiquidationAmounts,
    /// Supplier invoice reference.
    pub reference_facture: Option<String>,
}

/// An action requested on a liquidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiquidationAction {
    /// Certify service fait.
    CertifyServiceFait,
    /// Submit for DAAF control.
    Submit,
    /// DAAF / SDCT control.
    ValidateDaaf,
    /// DG validation.
    ValidateDg,
    /// Reject with motif.
    Reject {
        /// Mandatory motif.
        motif: String,
    },
    /// Defer with motif and optional resume date.
    Defer {
        /// Mandatory motif.
        motif: String,
        /// Target resume date.
        date_reprise: Option<NaiveDate>,
    },
    /// Return a rejected or deferred liquidation to draft.
    Resume,
    /// Flag for urgent settlement with a motif; the status is unchanged.
    MarkUrgent {
        /// Mandatory motif.
        motif: String,
    },
    /// Clear the urgent-settlement flag.
    UnmarkUrgent,
}

impl LiquidationAction {
    /// The action kind used for authorization and audit.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::CertifyServiceFait => ActionKind::CertifyServiceFait,
            Self::Submit => ActionKind::Submit,
            Self::ValidateDaaf => ActionKind::ValidateDaaf,
            Self::ValidateDg => ActionKind::ValidateDg,
            Self::Reject { .. } => ActionKind::Reject,
            Self::Defer { .. } => ActionKind::Defer,
            Self::Resume => ActionKind::Resume,
            Self::MarkUrgent { .. } => ActionKind::MarkUrgent,
            Self::UnmarkUrgent => ActionKind::UnmarkUrgent,
        }
    }
}

/// Result of an accepted transition.
#[derive(Debug, Clone)]
pub struct LiquidationTransition {
    /// The liquidation after the transition.
    pub liquidation: Liquidation,
    /// Ledger entry to post with it, if the validation chain completed.
    pub ledger_effect: Option<LedgerEntry>,
    /// Audit record to persist with it.
    pub audit: AuditRecord,
}

/// Liquidation state machine configured with the DG threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiquidationMachine {
    threshold: DgThreshold,
}

impl LiquidationMachine {
    /// Creates a machine with the given DG threshold.
    #[must_use]
    pub const fn new(threshold: DgThreshold) -> Self {
        Self { threshold }
    }

    /// The DG threshold in use.
    #[must_use]
    pub const fn threshold(&self) -> DgThreshold {
        self.threshold
    }

    /// The authorization matrix.
    #[must_use]
    pub const fn matrix(&self) -> &'static AuthorizationMatrix<LiquidationStatus> {
        &LIQUIDATION_MATRIX
    }

    /// Creates a draft liquidation against a validated engagement.
    ///
    /// The TTC amount may not exceed the engagement's restant à liquider.
    pub fn create(
        &self,
        input: NewLiquidation,
        progress: &EngagementProgress,
        actor: &Actor,
    ) -> Result<LiquidationTransition, TransitionError> {
        if !actor.has_any_role(CREATE_ROLES) {
            return Err(TransitionError::Unauthorized {
                action: ActionKind::Create,
                required: CREATE_ROLES,
            });
        }
        if input.engagement.status != EngagementStatus::Valide {
            return Err(TransitionError::MissingPrecondition(
                Precondition::ParentNotValidated,
            ));
        }
        let amounts = input.amounts;
        if !amounts.montant_ttc.is_positive() {
            return Err(TransitionError::InvalidAmount(amounts.montant_ttc));
        }
        if amounts.montant_ttc > progress.restant_a_liquider {
            return Err(TransitionError::ExceedsRemaining {
                amount: amounts.montant_ttc,
                remaining: progress.restant_a_liquider,
            });
        }

        let now = timestamp::now();
        let liquidation = Liquidation {
            id: LiquidationId::new(),
            numero: input.numero,
            engagement_id: input.engagement.id,
            budget_line_id: input.engagement.budget_line_id,
            amounts,
            reference_facture: input.reference_facture,
            status: LiquidationStatus::Brouillon,
            current_step: 0,
            created_by: actor.user_id,
            certified_by: None,
            certified_at: None,
            submitted_at: None,
            daaf_validated_by: None,
            daaf_validated_at: None,
            validated_by: None,
            validated_at: None,
            rejection: None,
            deferral: None,
            urgence: None,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        let audit = AuditEmitter::emit(
            EntityKind::Liquidation,
            liquidation.id,
            ActionKind::Create,
            actor,
            None,
            Some(liquidation.audit_snapshot()),
        );

        Ok(LiquidationTransition {
            liquidation,
            ledger_effect: None,
            audit,
        })
    }

    /// Applies `action` to `liquidation`.
    ///
    /// Checks, in order: the action is legal from the current status, the
    /// actor may fire it, the action's data (motif, documents) is complete.
    pub fn transition(
        &self,
        liquidation: &Liquidation,
        action: LiquidationAction,
        actor: &Actor,
        attachments: &Attachments,
    ) -> Result<LiquidationTransition, TransitionError> {
        let kind = action.kind();

        // validé_daaf only accepts DG actions while it waits on step 2
        if !is_urgency(kind) && awaits_nothing_at_daaf(liquidation) {
            return Err(TransitionError::InvalidState {
                entity: EntityKind::Liquidation,
                action: kind,
                from: liquidation.status.to_string(),
            });
        }

        LIQUIDATION_MATRIX.authorize(
            kind,
            liquidation.status,
            actor,
            Some(liquidation.created_by),
        )?;

        let now = timestamp::now();
        let mut next = liquidation.clone();
        let mut ledger_effect = None;
        let mut motif_for_audit = None;

        match action {
            LiquidationAction::CertifyServiceFait => {
                require_documents(attachments)?;
                next.status = LiquidationStatus::CertifieSf;
                next.certified_by = Some(actor.user_id);
                next.certified_at = Some(now);
            }
            LiquidationAction::Submit => {
                require_documents(attachments)?;
                next.status = LiquidationStatus::Soumis;
                next.current_step = 1;
                next.submitted_at = Some(now);
            }
            LiquidationAction::ValidateDaaf => {
                next.daaf_validated_by = Some(actor.user_id);
                next.daaf_validated_at = Some(now);
                next.status = LiquidationStatus::ValideDaaf;
                if self
                    .threshold
                    .requires_dg_validation(liquidation.amounts.net_a_payer)
                {
                    next.current_step = 2;
                } else {
                    next.current_step = 1;
                    next.validated_by = Some(actor.user_id);
                    next.validated_at = Some(now);
                    ledger_effect = validated_entry(liquidation);
                }
            }
            LiquidationAction::ValidateDg => {
                next.status = LiquidationStatus::ValideDg;
                next.validated_by = Some(actor.user_id);
                next.validated_at = Some(now);
                ledger_effect = validated_entry(liquidation);
            }
            LiquidationAction::Reject { motif } => {
                let motif = non_empty_motif(&motif).ok_or_else(TransitionError::missing_motif)?;
                next.status = LiquidationStatus::Rejete;
                next.rejection = Some(Rejection {
                    motif: motif.clone(),
                    rejected_by: actor.user_id,
                    rejected_at: now,
                    step: liquidation.current_step,
                });
                motif_for_audit = Some(motif);
            }
            LiquidationAction::Defer {
                motif,
                date_reprise,
            } => {
                let motif = non_empty_motif(&motif).ok_or_else(TransitionError::missing_motif)?;
                next.status = LiquidationStatus::Differe;
                next.deferral = Some(Deferral {
                    motif: motif.clone(),
                    deferred_by: actor.user_id,
                    deferred_at: now,
                    date_reprise,
                    step: liquidation.current_step,
                });
                motif_for_audit = Some(motif);
            }
            LiquidationAction::Resume => {
                next.status = LiquidationStatus::Brouillon;
                next.current_step = 0;
                next.rejection = None;
                next.deferral = None;
                next.certified_by = None;
                next.certified_at = None;
                next.submitted_at = None;
                next.daaf_validated_by = None;
                next.daaf_validated_at = None;
            }
            LiquidationAction::MarkUrgent { motif } => {
                let motif = non_empty_motif(&motif).ok_or_else(TransitionError::missing_motif)?;
                next.urgence = Some(Urgence {
                    motif: motif.clone(),
                    marked_by: actor.user_id,
                    marked_at: now,
                });
                motif_for_audit = Some(motif);
            }
            LiquidationAction::UnmarkUrgent => {
                if !liquidation.is_urgent() {
                    return Err(TransitionError::MissingPrecondition(Precondition::NotUrgent));
                }
                next.urgence = None;
            }
        }

        next.version += 1;
        next.updated_at = now;

        let mut audit = AuditEmitter::emit(
            EntityKind::Liquidation,
            next.id,
            kind,
            actor,
            Some(liquidation.audit_snapshot()),
            Some(next.audit_snapshot()),
        );
        if let Some(motif) = motif_for_audit {
            audit = audit.with_motif(motif);
        }

        Ok(LiquidationTransition {
            liquidation: next,
            ledger_effect,
            audit,
        })
    }

    /// Actions the actor may attempt on `liquidation`.
    #[must_use]
    pub fn available_actions(&self, liquidation: &Liquidation, actor: &Actor) -> Vec<ActionKind> {
        let settled_at_daaf = awaits_nothing_at_daaf(liquidation);
        LIQUIDATION_MATRIX
            .available_actions(liquidation.status, actor, Some(liquidation.created_by))
            .into_iter()
            .filter(|kind| is_urgency(*kind) || !settled_at_daaf)
            .filter(|kind| *kind != ActionKind::UnmarkUrgent || liquidation.is_urgent())
            .collect()
    }
}

fn awaits_nothing_at_daaf(liquidation: &Liquidation) -> bool {
    liquidation.status == LiquidationStatus::ValideDaaf
        && (liquidation.current_step != 2 || liquidation.is_validation_complete())
}

fn require_documents(attachments: &Attachments) -> Result<(), TransitionError> {
    let missing = attachments.missing(&REQUIRED_DOCUMENTS);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(TransitionError::MissingPrecondition(Precondition::Documents(
            missing,
        )))
    }
}

// A fully withheld liquidation consumes nothing.
fn validated_entry(liquidation: &Liquidation) -> Option<LedgerEntry> {
    let net = liquidation.amounts.net_a_payer;
    (!net.is_zero()).then(|| {
        LedgerEntry::liquidation_validated(liquidation.budget_line_id, liquidation.id, net)
    })
}

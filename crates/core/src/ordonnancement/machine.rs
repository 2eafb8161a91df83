//! Ordonnancement state machine: ordered validation steps, then signatures.
//!
//! Step actions (validate, reject, defer) are gated by the role of the
//! current step record; signatures by the role of the next unsigned slot.
//! Both circuits come from configuration.

use chrono::{DateTime, NaiveDate, Utc};
use sha2::{Digest, Sha256};
use sygfp_shared::WorkflowConfig;
use sygfp_shared::types::{timestamp, Montant, OrdonnancementId, UserId};

use crate::audit::{AuditEmitter, AuditRecord};
use crate::liquidation::Liquidation;
use crate::ordonnancement::types::{
    BankDetails, ModePaiement, Ordonnancement, OrdonnancementStatus, SignatureRecord, StepStatus,
    ValidationStepRecord,
};
use crate::workflow::authz::{AuthorizationMatrix, Gate, TransitionRule};
use crate::workflow::circuit::{Circuit, CircuitError};
use crate::workflow::error::{Precondition, TransitionError};
use crate::workflow::types::{
    ActionKind, Actor, Deferral, EntityKind, Rejection, Role, RoleSet, non_empty_motif,
};

/// Roles allowed to create an ordonnancement, or act on one they did not author.
pub const AUTHOR_ROLES: RoleSet = RoleSet::of(&[Role::Admin, Role::Daaf, Role::Daf, Role::Sdct]);

/// Roles allowed to transmit a signed ordonnancement.
pub const TRANSMIT_ROLES: RoleSet = RoleSet::of(&[Role::Admin, Role::Daaf, Role::Daf, Role::Dg]);

const RULES: &[TransitionRule<OrdonnancementStatus>] = &[
    TransitionRule::new(
        ActionKind::Submit,
        OrdonnancementStatus::Brouillon,
        Gate::AuthorOr(AUTHOR_ROLES),
    ),
    TransitionRule::new(ActionKind::ValidateStep, OrdonnancementStatus::Soumis, Gate::Circuit),
    TransitionRule::new(
        ActionKind::ValidateStep,
        OrdonnancementStatus::EnValidation,
        Gate::Circuit,
    ),
    TransitionRule::new(ActionKind::Reject, OrdonnancementStatus::Soumis, Gate::Circuit),
    TransitionRule::new(ActionKind::Reject, OrdonnancementStatus::EnValidation, Gate::Circuit),
    TransitionRule::new(ActionKind::Defer, OrdonnancementStatus::Soumis, Gate::Circuit),
    TransitionRule::new(ActionKind::Defer, OrdonnancementStatus::EnValidation, Gate::Circuit),
    TransitionRule::new(
        ActionKind::Resume,
        OrdonnancementStatus::Rejete,
        Gate::AuthorOr(AUTHOR_ROLES),
    ),
    TransitionRule::new(
        ActionKind::Resume,
        OrdonnancementStatus::Differe,
        Gate::AuthorOr(AUTHOR_ROLES),
    ),
    TransitionRule::new(ActionKind::Sign, OrdonnancementStatus::Valide, Gate::Circuit),
    TransitionRule::new(
        ActionKind::Transmit,
        OrdonnancementStatus::Valide,
        Gate::Roles(TRANSMIT_ROLES),
    ),
];

/// The ordonnancement authorization matrix.
pub const ORDONNANCEMENT_MATRIX: AuthorizationMatrix<OrdonnancementStatus> =
    AuthorizationMatrix::new(EntityKind::Ordonnancement, RULES);

/// Input for a new ordonnancement.
#[derive(Debug, Clone)]
pub struct NewOrdonnancement {
    /// Human-readable number.
    pub numero: String,
    /// Object of the payment.
    pub objet: String,
    /// Beneficiary.
    pub beneficiaire: String,
    /// Amount to authorize.
    pub montant: Montant,
    /// Payment mode.
    pub mode_paiement: ModePaiement,
    /// Bank details.
    pub bank_details: Option<BankDetails>,
    /// Planned payment date.
    pub date_prevue_paiement: Option<NaiveDate>,
}

/// An action requested on an ordonnancement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrdonnancementAction {
    /// Submit the draft into the validation circuit.
    Submit,
    /// Validate the current step.
    ValidateStep {
        /// Step addressed.
        step_order: u8,
        /// Optional comments.
        comments: Option<String>,
    },
    /// Reject at the current step.
    RejectStep {
        /// Step addressed.
        step_order: u8,
        /// Mandatory motif.
        motif: String,
    },
    /// Defer at the current step.
    DeferStep {
        /// Step addressed.
        step_order: u8,
        /// Mandatory motif.
        motif: String,
        /// Target resume date.
        date_reprise: Option<NaiveDate>,
    },
    /// Return a rejected or deferred ordonnancement to draft.
    Resume,
    /// Apply a signature.
    Sign {
        /// Signature slot addressed.
        signature_order: u8,
    },
    /// Transmit a fully signed ordonnancement.
    Transmit,
}

impl OrdonnancementAction {
    /// The action kind used for authorization and audit.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Submit => ActionKind::Submit,
            Self::ValidateStep { .. } => ActionKind::ValidateStep,
            Self::RejectStep { .. } => ActionKind::Reject,
            Self::DeferStep { .. } => ActionKind::Defer,
            Self::Resume => ActionKind::Resume,
            Self::Sign { .. } => ActionKind::Sign,
            Self::Transmit => ActionKind::Transmit,
        }
    }
}

/// Result of an accepted transition.
#[derive(Debug, Clone)]
pub struct OrdonnancementTransition {
    /// The ordonnancement after the transition.
    pub ordonnancement: Ordonnancement,
    /// Audit record to persist with it.
    pub audit: AuditRecord,
}

/// Ordonnancement state machine configured with its two circuits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrdonnancementMachine {
    validation: Circuit,
    signatures: Circuit,
}

impl Default for OrdonnancementMachine {
    fn default() -> Self {
        Self::new(Circuit::default_validation(), Circuit::default_signature())
    }
}

impl OrdonnancementMachine {
    /// Creates a machine with explicit circuits.
    #[must_use]
    pub const fn new(validation: Circuit, signatures: Circuit) -> Self {
        Self {
            validation,
            signatures,
        }
    }

    /// Creates a machine from the workflow configuration.
    pub fn from_config(config: &WorkflowConfig) -> Result<Self, CircuitError> {
        Ok(Self::new(
            Circuit::from_config(&config.ordonnancement_steps)?,
            Circuit::from_config(&config.signature_steps)?,
        ))
    }

    /// The validation circuit.
    #[must_use]
    pub const fn validation_circuit(&self) -> &Circuit {
        &self.validation
    }

    /// The signature circuit.
    #[must_use]
    pub const fn signature_circuit(&self) -> &Circuit {
        &self.signatures
    }

    /// Creates a draft ordonnancement on a fully validated liquidation.
    ///
    /// `siblings` are the amounts of the liquidation's other non-rejected
    /// ordonnancements; the new amount may not exceed what remains of the
    /// net payable.
    pub fn create(
        &self,
        input: NewOrdonnancement,
        liquidation: &Liquidation,
        siblings: &[Montant],
        actor: &Actor,
    ) -> Result<OrdonnancementTransition, TransitionError> {
        if !actor.has_any_role(AUTHOR_ROLES) {
            return Err(TransitionError::Unauthorized {
                action: ActionKind::Create,
                required: AUTHOR_ROLES,
            });
        }
        if !liquidation.is_validation_complete() {
            return Err(TransitionError::MissingPrecondition(
                Precondition::ParentNotValidated,
            ));
        }
        if !input.montant.is_positive() {
            return Err(TransitionError::InvalidAmount(input.montant));
        }
        let deja_ordonnance = Montant::sum(siblings.iter().copied())?;
        let restant = liquidation
            .amounts
            .net_a_payer
            .checked_sub(deja_ordonnance)?
            .max(Montant::ZERO);
        if input.montant > restant {
            return Err(TransitionError::ExceedsRemaining {
                amount: input.montant,
                remaining: restant,
            });
        }

        let now = timestamp::now();
        let ordonnancement = Ordonnancement {
            id: OrdonnancementId::new(),
            numero: input.numero,
            liquidation_id: liquidation.id,
            budget_line_id: liquidation.budget_line_id,
            objet: input.objet,
            beneficiaire: input.beneficiaire,
            montant: input.montant,
            montant_paye: Montant::ZERO,
            mode_paiement: input.mode_paiement,
            bank_details: input.bank_details,
            date_prevue_paiement: input.date_prevue_paiement,
            status: OrdonnancementStatus::Brouillon,
            current_step: 0,
            steps: Vec::new(),
            signatures: Vec::new(),
            rejection: None,
            deferral: None,
            transmitted_at: None,
            created_by: actor.user_id,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        let audit = AuditEmitter::emit(
            EntityKind::Ordonnancement,
            ordonnancement.id,
            ActionKind::Create,
            actor,
            None,
            Some(ordonnancement.audit_snapshot()),
        );
        Ok(OrdonnancementTransition {
            ordonnancement,
            audit,
        })
    }

    /// Applies `action` to `ordonnancement`.
    pub fn transition(
        &self,
        ordonnancement: &Ordonnancement,
        action: OrdonnancementAction,
        actor: &Actor,
    ) -> Result<OrdonnancementTransition, TransitionError> {
        let kind = action.kind();
        ORDONNANCEMENT_MATRIX.authorize(
            kind,
            ordonnancement.status,
            actor,
            Some(ordonnancement.created_by),
        )?;

        let now = timestamp::now();
        let mut next = ordonnancement.clone();
        let mut motif_for_audit = None;

        match action {
            OrdonnancementAction::Submit => {
                next.status = OrdonnancementStatus::Soumis;
                next.current_step = 1;
                next.steps = ValidationStepRecord::from_circuit(&self.validation);
            }
            OrdonnancementAction::ValidateStep {
                step_order,
                comments,
            } => {
                let index = current_step_index(ordonnancement, step_order, actor, kind)?;
                let last = ordonnancement
                    .steps
                    .iter()
                    .map(|step| step.step_order)
                    .max()
                    .unwrap_or(step_order);
                stamp_step(&mut next.steps[index], StepStatus::Validated, actor, now, comments);

                if step_order >= last {
                    next.status = OrdonnancementStatus::Valide;
                    next.signatures = SignatureRecord::from_circuit(&self.signatures);
                } else {
                    next.status = OrdonnancementStatus::EnValidation;
                    next.current_step = step_order + 1;
                    if let Some(following) = next
                        .steps
                        .iter_mut()
                        .find(|step| step.step_order == step_order + 1)
                    {
                        following.status = StepStatus::Pending;
                    }
                }
            }
            OrdonnancementAction::RejectStep { step_order, motif } => {
                let index = current_step_index(ordonnancement, step_order, actor, kind)?;
                let motif = non_empty_motif(&motif).ok_or_else(TransitionError::missing_motif)?;
                stamp_step(
                    &mut next.steps[index],
                    StepStatus::Rejected,
                    actor,
                    now,
                    Some(motif.clone()),
                );
                next.status = OrdonnancementStatus::Rejete;
                next.rejection = Some(Rejection {
                    motif: motif.clone(),
                    rejected_by: actor.user_id,
                    rejected_at: now,
                    step: step_order,
                });
                motif_for_audit = Some(motif);
            }
            OrdonnancementAction::DeferStep {
                step_order,
                motif,
                date_reprise,
            } => {
                let index = current_step_index(ordonnancement, step_order, actor, kind)?;
                let motif = non_empty_motif(&motif).ok_or_else(TransitionError::missing_motif)?;
                stamp_step(
                    &mut next.steps[index],
                    StepStatus::Deferred,
                    actor,
                    now,
                    Some(motif.clone()),
                );
                next.status = OrdonnancementStatus::Differe;
                next.deferral = Some(Deferral {
                    motif: motif.clone(),
                    deferred_by: actor.user_id,
                    deferred_at: now,
                    date_reprise,
                    step: step_order,
                });
                motif_for_audit = Some(motif);
            }
            OrdonnancementAction::Resume => {
                next.status = OrdonnancementStatus::Brouillon;
                next.current_step = 0;
                next.steps = Vec::new();
                next.rejection = None;
                next.deferral = None;
            }
            OrdonnancementAction::Sign { signature_order } => {
                let pending = ordonnancement
                    .next_signature()
                    .ok_or_else(|| TransitionError::InvalidState {
                        entity: EntityKind::Ordonnancement,
                        action: kind,
                        from: ordonnancement.status.to_string(),
                    })?;
                if signature_order != pending.signature_order {
                    return Err(TransitionError::OutOfOrder {
                        order: signature_order,
                        pending: pending.signature_order,
                    });
                }
                if !actor.has_role(pending.role) {
                    return Err(TransitionError::Unauthorized {
                        action: kind,
                        required: RoleSet::of(&[pending.role]),
                    });
                }
                let hash = signature_hash(ordonnancement, actor.user_id, now);
                if let Some(slot) = next
                    .signatures
                    .iter_mut()
                    .find(|slot| slot.signature_order == signature_order)
                {
                    slot.signed_by = Some(actor.user_id);
                    slot.signed_at = Some(now);
                    slot.signature_hash = Some(hash);
                }
            }
            OrdonnancementAction::Transmit => {
                if !ordonnancement.signatures_complete() {
                    return Err(TransitionError::MissingPrecondition(Precondition::Signatures));
                }
                next.status = OrdonnancementStatus::Transmis;
                next.transmitted_at = Some(now);
            }
        }

        next.version += 1;
        next.updated_at = now;

        let mut audit = AuditEmitter::emit(
            EntityKind::Ordonnancement,
            next.id,
            kind,
            actor,
            Some(ordonnancement.audit_snapshot()),
            Some(next.audit_snapshot()),
        );
        if let Some(motif) = motif_for_audit {
            audit = audit.with_motif(motif);
        }

        Ok(OrdonnancementTransition {
            ordonnancement: next,
            audit,
        })
    }
}

/// Locates the current step record, checking order then role.
fn current_step_index(
    ordonnancement: &Ordonnancement,
    step_order: u8,
    actor: &Actor,
    kind: ActionKind,
) -> Result<usize, TransitionError> {
    if step_order != ordonnancement.current_step {
        return Err(TransitionError::WrongStep {
            expected: ordonnancement.current_step,
            got: step_order,
        });
    }
    let index = ordonnancement
        .steps
        .iter()
        .position(|step| step.step_order == step_order)
        .ok_or(TransitionError::WrongStep {
            expected: ordonnancement.current_step,
            got: step_order,
        })?;
    let role = ordonnancement.steps[index].role;
    if !actor.has_role(role) {
        return Err(TransitionError::Unauthorized {
            action: kind,
            required: RoleSet::of(&[role]),
        });
    }
    Ok(index)
}

fn stamp_step(
    step: &mut ValidationStepRecord,
    status: StepStatus,
    actor: &Actor,
    at: DateTime<Utc>,
    comments: Option<String>,
) {
    step.status = status;
    step.validated_by = Some(actor.user_id);
    step.validated_at = Some(at);
    step.comments = comments;
}

/// SHA-256 hex over `id|numero|montant|beneficiaire|signer|signed_at`.
#[must_use]
pub fn signature_hash(
    ordonnancement: &Ordonnancement,
    signer: UserId,
    signed_at: DateTime<Utc>,
) -> String {
    let payload = format!(
        "{}|{}|{}|{}|{}|{}",
        ordonnancement.id,
        ordonnancement.numero,
        ordonnancement.montant,
        ordonnancement.beneficiaire,
        signer,
        signed_at.to_rfc3339(),
    );
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    format!("{:x}", hasher.finalize())
}

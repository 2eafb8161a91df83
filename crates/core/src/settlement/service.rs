//! Payment registration and cancellation against the ordonnancement ceiling.
//!
//! Both operations are pure: they return the updated ordonnancement and
//! movement together with the ledger entry and audit record that the
//! persistence layer commits in one transaction. The db layer re-checks the
//! ceiling with a conditional update, so a stale read cannot overshoot it.

use chrono::NaiveDate;
use sygfp_shared::types::{timestamp, Montant, ReglementId};

use crate::audit::{AuditEmitter, AuditRecord};
use crate::budget::LedgerEntry;
use crate::ordonnancement::{ModePaiement, Ordonnancement, OrdonnancementStatus};
use crate::settlement::error::SettlementError;
use crate::settlement::types::{
    Reglement, ReglementRejection, ReglementStatus, RenvoiTarget, SettlementStatus,
    settlement_status,
};
use crate::workflow::error::Precondition;
use crate::workflow::types::{ActionKind, Actor, EntityKind, Role, RoleSet, non_empty_motif};

/// Roles allowed to register or cancel payments.
pub const TREASURY_ROLES: RoleSet = RoleSet::of(&[Role::Admin, Role::Tresorerie, Role::Ac]);

/// Input for a payment movement.
#[derive(Debug, Clone)]
pub struct NewPayment {
    /// Human-readable number.
    pub numero: String,
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
}

/// Input for a payment cancellation.
#[derive(Debug, Clone)]
pub struct PaymentCancellation {
    /// Mandatory motif.
    pub motif: String,
    /// Where the parent dossier should go back to.
    pub renvoi: Option<RenvoiTarget>,
}

/// Result of an accepted registration or cancellation.
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    /// The ordonnancement with its new `montant_paye`.
    pub ordonnancement: Ordonnancement,
    /// The movement registered or rejected.
    pub reglement: Reglement,
    /// Settlement status after the operation.
    pub status: SettlementStatus,
    /// Ledger entry to post on the budget line.
    pub ledger_effect: LedgerEntry,
    /// Audit record to persist with it.
    pub audit: AuditRecord,
}

/// Settlement reconciliation service.
pub struct SettlementService;

impl SettlementService {
    /// Fails unless the ordonnancement is `valide` or `transmis` with every
    /// signature slot filled.
    pub fn check_payable(ordonnancement: &Ordonnancement) -> Result<(), SettlementError> {
        if !matches!(
            ordonnancement.status,
            OrdonnancementStatus::Valide | OrdonnancementStatus::Transmis
        ) {
            return Err(SettlementError::InvalidState {
                entity: EntityKind::Ordonnancement,
                from: ordonnancement.status.to_string(),
            });
        }
        if !ordonnancement.is_payable() {
            return Err(SettlementError::MissingPrecondition(Precondition::Signatures));
        }
        Ok(())
    }

    /// Registers a payment on a payable ordonnancement.
    ///
    /// Accepts `montant <= restant`, the boundary included.
    pub fn register_payment(
        ordonnancement: &Ordonnancement,
        input: NewPayment,
        actor: &Actor,
    ) -> Result<PaymentOutcome, SettlementError> {
        authorize(ActionKind::RegisterPayment, actor)?;
        Self::check_payable(ordonnancement)?;
        if !input.montant.is_positive() {
            return Err(SettlementError::InvalidAmount(input.montant));
        }
        let restant = ordonnancement.restant()?;
        if input.montant > restant {
            return Err(SettlementError::ExceedsRemaining {
                amount: input.montant,
                remaining: restant.max(Montant::ZERO),
            });
        }

        let now = timestamp::now();
        let reglement = Reglement {
            id: ReglementId::new(),
            numero: input.numero,
            ordonnancement_id: ordonnancement.id,
            budget_line_id: ordonnancement.budget_line_id,
            montant: input.montant,
            mode_paiement: input.mode_paiement,
            reference: input.reference,
            compte_bancaire: input.compte_bancaire,
            date_paiement: input.date_paiement,
            status: ReglementStatus::Enregistre,
            rejection: None,
            created_by: actor.user_id,
            created_at: now,
        };

        let mut next = ordonnancement.clone();
        next.montant_paye = ordonnancement.montant_paye.checked_add(input.montant)?;
        next.version += 1;
        next.updated_at = now;

        let ledger_effect =
            LedgerEntry::payment(ordonnancement.budget_line_id, reglement.id, input.montant);
        let audit = AuditEmitter::emit(
            EntityKind::Reglement,
            reglement.id,
            ActionKind::RegisterPayment,
            actor,
            Some(ordonnancement.audit_snapshot()),
            Some(next.audit_snapshot()),
        );

        Ok(PaymentOutcome {
            status: settlement_status(&next),
            ordonnancement: next,
            reglement,
            ledger_effect,
            audit,
        })
    }

    /// Cancels a registered payment: the movement is kept as `rejete` and
    /// its amount comes off `montant_paye`.
    pub fn cancel_payment(
        ordonnancement: &Ordonnancement,
        reglement: &Reglement,
        cancellation: PaymentCancellation,
        actor: &Actor,
    ) -> Result<PaymentOutcome, SettlementError> {
        authorize(ActionKind::CancelPayment, actor)?;
        if reglement.ordonnancement_id != ordonnancement.id {
            return Err(SettlementError::ForeignReglement {
                reglement: reglement.id,
                ordonnancement: ordonnancement.id,
            });
        }
        if !reglement.is_active() {
            return Err(SettlementError::InvalidState {
                entity: EntityKind::Reglement,
                from: reglement.status.to_string(),
            });
        }
        let motif = non_empty_motif(&cancellation.motif)
            .ok_or(SettlementError::MissingPrecondition(Precondition::Motif))?;

        let montant_paye = ordonnancement.montant_paye.checked_sub(reglement.montant)?;
        if montant_paye.is_negative() {
            return Err(SettlementError::NegativeBalance { montant_paye });
        }

        let now = timestamp::now();
        let mut cancelled = reglement.clone();
        cancelled.status = ReglementStatus::Rejete;
        cancelled.rejection = Some(ReglementRejection {
            motif: motif.clone(),
            renvoi: cancellation.renvoi,
            rejected_by: actor.user_id,
            rejected_at: now,
        });

        let mut next = ordonnancement.clone();
        next.montant_paye = montant_paye;
        next.version += 1;
        next.updated_at = now;

        let ledger_effect = LedgerEntry::payment_reversal(
            reglement.budget_line_id,
            reglement.id,
            reglement.montant,
        )?;
        let audit = AuditEmitter::emit(
            EntityKind::Reglement,
            reglement.id,
            ActionKind::CancelPayment,
            actor,
            Some(reglement.audit_snapshot()),
            Some(cancelled.audit_snapshot()),
        )
        .with_motif(motif);

        Ok(PaymentOutcome {
            status: settlement_status(&next),
            ordonnancement: next,
            reglement: cancelled,
            ledger_effect,
            audit,
        })
    }
}

fn authorize(action: ActionKind, actor: &Actor) -> Result<(), SettlementError> {
    if actor.has_any_role(TREASURY_ROLES) {
        Ok(())
    } else {
        Err(SettlementError::Unauthorized {
            action,
            required: TREASURY_ROLES,
        })
    }
}

//! Conversions between database rows and domain values.
//!
//! Status and kind columns are stored as their domain codes and parsed back
//! through the domain enums; an unknown code is a [`MappingError`].

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use sygfp_core::audit::AuditRecord;
use sygfp_core::budget::{
    BudgetLine, EngagementSnapshot, EngagementStatus, LedgerEntry, LedgerEntryKind, LedgerTotals,
};
use sygfp_core::liquidation::{
    Liquidation, LiquidationAmounts, LiquidationStatus, Retenues, Urgence,
};
use sygfp_core::ordonnancement::{
    BankDetails, ModePaiement, Ordonnancement, OrdonnancementStatus, SignatureRecord, StepStatus,
    ValidationStepRecord,
};
use sygfp_core::settlement::{
    Bordereau, BordereauNumber, Reglement, ReglementRejection, ReglementStatus, RenvoiTarget,
};
use sygfp_core::workflow::{ActionKind, Deferral, DocumentType, EntityKind, Rejection, Role};
use sygfp_shared::types::{
    timestamp, AuditEventId, BudgetLineId, EngagementId, LedgerEntryId, LiquidationId, Montant,
    OrdonnancementId, ReglementId, UserId,
};
use thiserror::Error;
use uuid::Uuid;

use crate::entities::{
    audit_logs, bordereau_reglements, bordereaux, budget_ledger_entries, budget_lines, engagements, liquidations,
    ordonnancement_signatures, ordonnancement_steps, ordonnancements, reglements,
};

/// A row that cannot be turned into a domain value.
#[derive(Debug, Error)]
pub enum MappingError {
    /// A code column holds a value the domain does not know.
    #[error("Unknown {column} code: {value}")]
    UnknownCode {
        /// Column name.
        column: &'static str,
        /// Stored value.
        value: String,
    },

    /// A numeric column is outside the domain range.
    #[error("{column} out of range: {value}")]
    OutOfRange {
        /// Column name.
        column: &'static str,
        /// Stored value.
        value: i64,
    },
}

fn code<T>(
    column: &'static str,
    value: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T, MappingError> {
    parse(value).ok_or_else(|| MappingError::UnknownCode {
        column,
        value: value.to_string(),
    })
}

fn small(column: &'static str, value: i16) -> Result<u8, MappingError> {
    u8::try_from(value).map_err(|_| MappingError::OutOfRange {
        column,
        value: i64::from(value),
    })
}

fn utc(value: DateTimeWithTimeZone) -> DateTime<Utc> {
    value.with_timezone(&Utc)
}

fn utc_opt(value: Option<DateTimeWithTimeZone>) -> Option<DateTime<Utc>> {
    value.map(utc)
}

fn tz(value: DateTime<Utc>) -> DateTimeWithTimeZone {
    value.into()
}

fn tz_opt(value: Option<DateTime<Utc>>) -> Option<DateTimeWithTimeZone> {
    value.map(tz)
}

fn user(value: Option<Uuid>) -> Option<UserId> {
    value.map(UserId::from_uuid)
}

fn uuid(value: Option<UserId>) -> Option<Uuid> {
    value.map(UserId::into_inner)
}

// ============================================================================
// Budget
// ============================================================================

/// Budget line row to domain.
#[must_use]
pub fn budget_line(model: budget_lines::Model) -> BudgetLine {
    BudgetLine {
        id: BudgetLineId::from_uuid(model.id),
        code: model.code,
        libelle: model.libelle,
        exercice: model.exercice,
        dotation_initiale: Montant::new(model.dotation_initiale),
        virements_entrants: Montant::new(model.virements_entrants),
        virements_sortants: Montant::new(model.virements_sortants),
        totals: LedgerTotals {
            total_engage: Montant::new(model.total_engage),
            total_liquide: Montant::new(model.total_liquide),
            total_paye: Montant::new(model.total_paye),
        },
        version: model.version,
    }
}

/// Domain budget line to an insertable row.
#[must_use]
pub fn budget_line_active(line: &BudgetLine) -> budget_lines::ActiveModel {
    let now = tz(timestamp::now());
    budget_lines::ActiveModel {
        id: Set(line.id.into_inner()),
        code: Set(line.code.clone()),
        libelle: Set(line.libelle.clone()),
        exercice: Set(line.exercice),
        dotation_initiale: Set(line.dotation_initiale.minor_units()),
        virements_entrants: Set(line.virements_entrants.minor_units()),
        virements_sortants: Set(line.virements_sortants.minor_units()),
        total_engage: Set(line.totals.total_engage.minor_units()),
        total_liquide: Set(line.totals.total_liquide.minor_units()),
        total_paye: Set(line.totals.total_paye.minor_units()),
        version: Set(line.version),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

/// Ledger entry row to domain.
pub fn ledger_entry(model: budget_ledger_entries::Model) -> Result<LedgerEntry, MappingError> {
    Ok(LedgerEntry {
        id: LedgerEntryId::from_uuid(model.id),
        budget_line_id: BudgetLineId::from_uuid(model.budget_line_id),
        kind: code("kind", &model.kind, LedgerEntryKind::parse)?,
        montant: Montant::new(model.montant),
        source_type: code("source_type", &model.source_type, EntityKind::parse)?,
        source_id: model.source_id,
        created_at: utc(model.created_at),
    })
}

/// Domain ledger entry to an insertable row.
#[must_use]
pub fn ledger_entry_active(entry: &LedgerEntry) -> budget_ledger_entries::ActiveModel {
    budget_ledger_entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        budget_line_id: Set(entry.budget_line_id.into_inner()),
        kind: Set(entry.kind.as_str().to_string()),
        montant: Set(entry.montant.minor_units()),
        source_type: Set(entry.source_type.as_str().to_string()),
        source_id: Set(entry.source_id),
        created_at: Set(tz(entry.created_at)),
    }
}

/// Engagement row to domain.
pub fn engagement(model: engagements::Model) -> Result<EngagementSnapshot, MappingError> {
    Ok(EngagementSnapshot {
        id: EngagementId::from_uuid(model.id),
        budget_line_id: BudgetLineId::from_uuid(model.budget_line_id),
        montant: Montant::new(model.montant),
        status: code("statut", &model.statut, EngagementStatus::parse)?,
    })
}

// ============================================================================
// Liquidation
// ============================================================================

/// Liquidation row to domain.
pub fn liquidation(model: liquidations::Model) -> Result<Liquidation, MappingError> {
    let rejection = match (model.motif_rejet, model.rejected_by, model.rejected_at) {
        (Some(motif), Some(by), Some(at)) => Some(Rejection {
            motif,
            rejected_by: UserId::from_uuid(by),
            rejected_at: utc(at),
            step: small("rejected_step", model.rejected_step.unwrap_or_default())?,
        }),
        _ => None,
    };
    let deferral = match (model.motif_differe, model.deferred_by, model.deferred_at) {
        (Some(motif), Some(by), Some(at)) => Some(Deferral {
            motif,
            deferred_by: UserId::from_uuid(by),
            deferred_at: utc(at),
            date_reprise: model.date_reprise,
            step: small("deferred_step", model.deferred_step.unwrap_or_default())?,
        }),
        _ => None,
    };
    let urgence = match (model.urgence_motif, model.urgence_par, model.urgence_date) {
        (Some(motif), Some(by), Some(at)) if model.reglement_urgent => Some(Urgence {
            motif,
            marked_by: UserId::from_uuid(by),
            marked_at: utc(at),
        }),
        _ => None,
    };

    Ok(Liquidation {
        id: LiquidationId::from_uuid(model.id),
        numero: model.numero,
        engagement_id: EngagementId::from_uuid(model.engagement_id),
        budget_line_id: BudgetLineId::from_uuid(model.budget_line_id),
        amounts: LiquidationAmounts {
            montant_ht: Montant::new(model.montant_ht),
            tva_montant: Montant::new(model.tva_montant),
            montant_ttc: Montant::new(model.montant_ttc),
            retenues: Retenues {
                airsi: Montant::new(model.airsi),
                retenue_source: Montant::new(model.retenue_source),
                bic: Montant::new(model.bic),
                bnc: Montant::new(model.bnc),
                penalites: Montant::new(model.penalites),
            },
            total_retenues: Montant::new(model.total_retenues),
            net_a_payer: Montant::new(model.net_a_payer),
        },
        reference_facture: model.reference_facture,
        status: code("statut", &model.statut, LiquidationStatus::parse)?,
        current_step: small("current_step", model.current_step)?,
        created_by: UserId::from_uuid(model.created_by),
        certified_by: user(model.certified_by),
        certified_at: utc_opt(model.certified_at),
        submitted_at: utc_opt(model.submitted_at),
        daaf_validated_by: user(model.daaf_validated_by),
        daaf_validated_at: utc_opt(model.daaf_validated_at),
        validated_by: user(model.validated_by),
        validated_at: utc_opt(model.validated_at),
        rejection,
        deferral,
        urgence,
        version: model.version,
        created_at: utc(model.created_at),
        updated_at: utc(model.updated_at),
    })
}

/// Domain liquidation to a fully set row.
#[must_use]
pub fn liquidation_active(liq: &Liquidation) -> liquidations::ActiveModel {
    let amounts = &liq.amounts;
    let rejection = liq.rejection.as_ref();
    let deferral = liq.deferral.as_ref();
    let urgence = liq.urgence.as_ref();
    liquidations::ActiveModel {
        id: Set(liq.id.into_inner()),
        numero: Set(liq.numero.clone()),
        engagement_id: Set(liq.engagement_id.into_inner()),
        budget_line_id: Set(liq.budget_line_id.into_inner()),
        montant_ht: Set(amounts.montant_ht.minor_units()),
        tva_montant: Set(amounts.tva_montant.minor_units()),
        montant_ttc: Set(amounts.montant_ttc.minor_units()),
        airsi: Set(amounts.retenues.airsi.minor_units()),
        retenue_source: Set(amounts.retenues.retenue_source.minor_units()),
        bic: Set(amounts.retenues.bic.minor_units()),
        bnc: Set(amounts.retenues.bnc.minor_units()),
        penalites: Set(amounts.retenues.penalites.minor_units()),
        total_retenues: Set(amounts.total_retenues.minor_units()),
        net_a_payer: Set(amounts.net_a_payer.minor_units()),
        reference_facture: Set(liq.reference_facture.clone()),
        statut: Set(liq.status.as_str().to_string()),
        current_step: Set(i16::from(liq.current_step)),
        created_by: Set(liq.created_by.into_inner()),
        certified_by: Set(uuid(liq.certified_by)),
        certified_at: Set(tz_opt(liq.certified_at)),
        submitted_at: Set(tz_opt(liq.submitted_at)),
        daaf_validated_by: Set(uuid(liq.daaf_validated_by)),
        daaf_validated_at: Set(tz_opt(liq.daaf_validated_at)),
        validated_by: Set(uuid(liq.validated_by)),
        validated_at: Set(tz_opt(liq.validated_at)),
        motif_rejet: Set(rejection.map(|r| r.motif.clone())),
        rejected_by: Set(rejection.map(|r| r.rejected_by.into_inner())),
        rejected_at: Set(rejection.map(|r| tz(r.rejected_at))),
        rejected_step: Set(rejection.map(|r| i16::from(r.step))),
        motif_differe: Set(deferral.map(|d| d.motif.clone())),
        deferred_by: Set(deferral.map(|d| d.deferred_by.into_inner())),
        deferred_at: Set(deferral.map(|d| tz(d.deferred_at))),
        date_reprise: Set(deferral.and_then(|d| d.date_reprise)),
        deferred_step: Set(deferral.map(|d| i16::from(d.step))),
        reglement_urgent: Set(urgence.is_some()),
        urgence_motif: Set(urgence.map(|u| u.motif.clone())),
        urgence_date: Set(urgence.map(|u| tz(u.marked_at))),
        urgence_par: Set(urgence.map(|u| u.marked_by.into_inner())),
        version: Set(liq.version),
        created_at: Set(tz(liq.created_at)),
        updated_at: Set(tz(liq.updated_at)),
    }
}

// ============================================================================
// Ordonnancement
// ============================================================================

/// Step row to domain.
pub fn step(model: ordonnancement_steps::Model) -> Result<ValidationStepRecord, MappingError> {
    Ok(ValidationStepRecord {
        step_order: small("step_order", model.step_order)?,
        role: code("role", &model.role, Role::parse)?,
        status: code("status", &model.status, StepStatus::parse)?,
        validated_by: user(model.validated_by),
        validated_at: utc_opt(model.validated_at),
        comments: model.comments,
    })
}

/// Domain step to an insertable row.
#[must_use]
pub fn step_active(
    ordonnancement_id: OrdonnancementId,
    record: &ValidationStepRecord,
) -> ordonnancement_steps::ActiveModel {
    ordonnancement_steps::ActiveModel {
        id: Set(Uuid::now_v7()),
        ordonnancement_id: Set(ordonnancement_id.into_inner()),
        step_order: Set(i16::from(record.step_order)),
        role: Set(record.role.as_str().to_string()),
        status: Set(record.status.as_str().to_string()),
        validated_by: Set(uuid(record.validated_by)),
        validated_at: Set(tz_opt(record.validated_at)),
        comments: Set(record.comments.clone()),
    }
}

/// Signature row to domain.
pub fn signature(model: ordonnancement_signatures::Model) -> Result<SignatureRecord, MappingError> {
    Ok(SignatureRecord {
        signature_order: small("signature_order", model.signature_order)?,
        role: code("role", &model.role, Role::parse)?,
        label: model.label,
        signed_by: user(model.signed_by),
        signed_at: utc_opt(model.signed_at),
        signature_hash: model.signature_hash,
    })
}

/// Domain signature slot to an insertable row.
#[must_use]
pub fn signature_active(
    ordonnancement_id: OrdonnancementId,
    slot: &SignatureRecord,
) -> ordonnancement_signatures::ActiveModel {
    ordonnancement_signatures::ActiveModel {
        id: Set(Uuid::now_v7()),
        ordonnancement_id: Set(ordonnancement_id.into_inner()),
        signature_order: Set(i16::from(slot.signature_order)),
        role: Set(slot.role.as_str().to_string()),
        label: Set(slot.label.clone()),
        signed_by: Set(uuid(slot.signed_by)),
        signed_at: Set(tz_opt(slot.signed_at)),
        signature_hash: Set(slot.signature_hash.clone()),
    }
}

/// Ordonnancement row plus its step and signature rows to domain.
pub fn ordonnancement(
    model: ordonnancements::Model,
    steps: Vec<ordonnancement_steps::Model>,
    signatures: Vec<ordonnancement_signatures::Model>,
) -> Result<Ordonnancement, MappingError> {
    let mut steps = steps.into_iter().map(step).collect::<Result<Vec<_>, _>>()?;
    steps.sort_by_key(|s| s.step_order);
    let mut signatures = signatures
        .into_iter()
        .map(signature)
        .collect::<Result<Vec<_>, _>>()?;
    signatures.sort_by_key(|s| s.signature_order);

    let bank_details = match (model.banque, model.rib) {
        (Some(banque), Some(rib)) => Some(BankDetails { banque, rib }),
        _ => None,
    };
    let rejection = match (model.motif_rejet, model.rejected_by, model.rejected_at) {
        (Some(motif), Some(by), Some(at)) => Some(Rejection {
            motif,
            rejected_by: UserId::from_uuid(by),
            rejected_at: utc(at),
            step: small("rejected_step", model.rejected_step.unwrap_or_default())?,
        }),
        _ => None,
    };
    let deferral = match (model.motif_differe, model.deferred_by, model.deferred_at) {
        (Some(motif), Some(by), Some(at)) => Some(Deferral {
            motif,
            deferred_by: UserId::from_uuid(by),
            deferred_at: utc(at),
            date_reprise: model.date_reprise,
            step: small("deferred_step", model.deferred_step.unwrap_or_default())?,
        }),
        _ => None,
    };

    Ok(Ordonnancement {
        id: OrdonnancementId::from_uuid(model.id),
        numero: model.numero,
        liquidation_id: LiquidationId::from_uuid(model.liquidation_id),
        budget_line_id: BudgetLineId::from_uuid(model.budget_line_id),
        objet: model.objet,
        beneficiaire: model.beneficiaire,
        montant: Montant::new(model.montant),
        montant_paye: Montant::new(model.montant_paye),
        mode_paiement: code("mode_paiement", &model.mode_paiement, ModePaiement::parse)?,
        bank_details,
        date_prevue_paiement: model.date_prevue_paiement,
        status: code("statut", &model.statut, OrdonnancementStatus::parse)?,
        current_step: small("current_step", model.current_step)?,
        steps,
        signatures,
        rejection,
        deferral,
        transmitted_at: utc_opt(model.transmitted_at),
        created_by: UserId::from_uuid(model.created_by),
        version: model.version,
        created_at: utc(model.created_at),
        updated_at: utc(model.updated_at),
    })
}

/// Domain ordonnancement header to a fully set row.
#[must_use]
pub fn ordonnancement_active(ord: &Ordonnancement) -> ordonnancements::ActiveModel {
    let rejection = ord.rejection.as_ref();
    let deferral = ord.deferral.as_ref();
    let bank = ord.bank_details.as_ref();
    ordonnancements::ActiveModel {
        id: Set(ord.id.into_inner()),
        numero: Set(ord.numero.clone()),
        liquidation_id: Set(ord.liquidation_id.into_inner()),
        budget_line_id: Set(ord.budget_line_id.into_inner()),
        objet: Set(ord.objet.clone()),
        beneficiaire: Set(ord.beneficiaire.clone()),
        montant: Set(ord.montant.minor_units()),
        montant_paye: Set(ord.montant_paye.minor_units()),
        mode_paiement: Set(ord.mode_paiement.as_str().to_string()),
        banque: Set(bank.map(|b| b.banque.clone())),
        rib: Set(bank.map(|b| b.rib.clone())),
        date_prevue_paiement: Set(ord.date_prevue_paiement),
        statut: Set(ord.status.as_str().to_string()),
        current_step: Set(i16::from(ord.current_step)),
        motif_rejet: Set(rejection.map(|r| r.motif.clone())),
        rejected_by: Set(rejection.map(|r| r.rejected_by.into_inner())),
        rejected_at: Set(rejection.map(|r| tz(r.rejected_at))),
        rejected_step: Set(rejection.map(|r| i16::from(r.step))),
        motif_differe: Set(deferral.map(|d| d.motif.clone())),
        deferred_by: Set(deferral.map(|d| d.deferred_by.into_inner())),
        deferred_at: Set(deferral.map(|d| tz(d.deferred_at))),
        date_reprise: Set(deferral.and_then(|d| d.date_reprise)),
        deferred_step: Set(deferral.map(|d| i16::from(d.step))),
        transmitted_at: Set(tz_opt(ord.transmitted_at)),
        created_by: Set(ord.created_by.into_inner()),
        version: Set(ord.version),
        created_at: Set(tz(ord.created_at)),
        updated_at: Set(tz(ord.updated_at)),
    }
}

// ============================================================================
// Settlement
// ============================================================================

/// Reglement row to domain.
pub fn reglement(model: reglements::Model) -> Result<Reglement, MappingError> {
    let renvoi = model
        .renvoi
        .as_deref()
        .map(|value| code("renvoi", value, RenvoiTarget::parse))
        .transpose()?;
    let rejection = match (model.motif_rejet, model.rejected_by, model.rejected_at) {
        (Some(motif), Some(by), Some(at)) => Some(ReglementRejection {
            motif,
            renvoi,
            rejected_by: UserId::from_uuid(by),
            rejected_at: utc(at),
        }),
        _ => None,
    };
    Ok(Reglement {
        id: ReglementId::from_uuid(model.id),
        numero: model.numero,
        ordonnancement_id: OrdonnancementId::from_uuid(model.ordonnancement_id),
        budget_line_id: BudgetLineId::from_uuid(model.budget_line_id),
        montant: Montant::new(model.montant),
        mode_paiement: code("mode_paiement", &model.mode_paiement, ModePaiement::parse)?,
        reference: model.reference,
        compte_bancaire: model.compte_bancaire,
        date_paiement: model.date_paiement,
        status: code("statut", &model.statut, ReglementStatus::parse)?,
        rejection,
        created_by: UserId::from_uuid(model.created_by),
        created_at: utc(model.created_at),
    })
}

/// Domain reglement to an insertable row.
#[must_use]
pub fn reglement_active(reglement: &Reglement) -> reglements::ActiveModel {
    let rejection = reglement.rejection.as_ref();
    reglements::ActiveModel {
        id: Set(reglement.id.into_inner()),
        numero: Set(reglement.numero.clone()),
        ordonnancement_id: Set(reglement.ordonnancement_id.into_inner()),
        budget_line_id: Set(reglement.budget_line_id.into_inner()),
        montant: Set(reglement.montant.minor_units()),
        mode_paiement: Set(reglement.mode_paiement.as_str().to_string()),
        reference: Set(reglement.reference.clone()),
        compte_bancaire: Set(reglement.compte_bancaire.clone()),
        date_paiement: Set(reglement.date_paiement),
        statut: Set(reglement.status.as_str().to_string()),
        motif_rejet: Set(rejection.map(|r| r.motif.clone())),
        renvoi: Set(rejection
            .and_then(|r| r.renvoi)
            .map(|t| t.as_str().to_string())),
        rejected_by: Set(rejection.map(|r| r.rejected_by.into_inner())),
        rejected_at: Set(rejection.map(|r| tz(r.rejected_at))),
        created_by: Set(reglement.created_by.into_inner()),
        created_at: Set(tz(reglement.created_at)),
    }
}

/// Bordereau row and its movement links to domain.
pub fn bordereau(
    model: bordereaux::Model,
    mut links: Vec<bordereau_reglements::Model>,
) -> Result<Bordereau, MappingError> {
    links.sort_by_key(|link| link.position);
    let (excluded, included): (Vec<_>, Vec<_>) = links.into_iter().partition(|link| link.excluded);
    let ids = |links: Vec<bordereau_reglements::Model>| -> Vec<ReglementId> {
        links
            .into_iter()
            .map(|link| ReglementId::from_uuid(link.reglement_id))
            .collect()
    };
    Ok(Bordereau {
        numero: code("numero", &model.numero, |s| s.parse::<BordereauNumber>().ok())?,
        reglements: ids(included),
        excluded: ids(excluded),
        total: Montant::new(model.total),
    })
}

/// Domain bordereau to an insertable row.
#[must_use]
pub fn bordereau_active(
    id: Uuid,
    bordereau: &Bordereau,
    created_by: UserId,
    created_at: DateTime<Utc>,
) -> bordereaux::ActiveModel {
    bordereaux::ActiveModel {
        id: Set(id),
        numero: Set(bordereau.numero.to_string()),
        exercice: Set(i32::from(bordereau.numero.exercice())),
        sequence: Set(i32::from(bordereau.numero.sequence())),
        total: Set(bordereau.total.minor_units()),
        created_by: Set(created_by.into_inner()),
        created_at: Set(tz(created_at)),
    }
}

/// Movement links of a bordereau, included ones first.
#[must_use]
pub fn bordereau_links(id: Uuid, bordereau: &Bordereau) -> Vec<bordereau_reglements::ActiveModel> {
    let included = bordereau.reglements.iter().map(|r| (r, false));
    let excluded = bordereau.excluded.iter().map(|r| (r, true));
    included
        .chain(excluded)
        .zip(0..)
        .map(|((reglement, excluded), position)| bordereau_reglements::ActiveModel {
            bordereau_id: Set(id),
            reglement_id: Set(reglement.into_inner()),
            position: Set(position),
            excluded: Set(excluded),
        })
        .collect()
}

// ============================================================================
// Audit & attachments
// ============================================================================

/// Audit row to domain.
pub fn audit_record(model: audit_logs::Model) -> Result<AuditRecord, MappingError> {
    Ok(AuditRecord {
        id: AuditEventId::from_uuid(model.id),
        entity_type: code("entity_type", &model.entity_type, EntityKind::parse)?,
        entity_id: model.entity_id,
        action: code("action", &model.action, ActionKind::parse)?,
        actor_id: UserId::from_uuid(model.actor_id),
        old_values: model.old_values,
        new_values: model.new_values,
        motif: model.motif,
        created_at: utc(model.created_at),
    })
}

/// Domain audit record to an insertable row.
#[must_use]
pub fn audit_active(record: &AuditRecord) -> audit_logs::ActiveModel {
    audit_logs::ActiveModel {
        id: Set(record.id.into_inner()),
        entity_type: Set(record.entity_type.as_str().to_string()),
        entity_id: Set(record.entity_id),
        action: Set(record.action.as_str().to_string()),
        actor_id: Set(record.actor_id.into_inner()),
        old_values: Set(record.old_values.clone()),
        new_values: Set(record.new_values.clone()),
        motif: Set(record.motif.clone()),
        created_at: Set(tz(record.created_at)),
    }
}

/// Document type column to domain.
pub fn document_type(value: &str) -> Result<DocumentType, MappingError> {
    code("document_type", value, DocumentType::parse)
}

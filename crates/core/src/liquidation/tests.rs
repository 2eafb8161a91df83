//! Unit tests for the liquidation state machine.

use rstest::rstest;
use rust_decimal_macros::dec;
use sygfp_shared::types::{BudgetLineId, EngagementId, Montant, UserId};

use super::*;
use crate::budget::{
    BudgetLine, BudgetService, EngagementProgress, EngagementSnapshot, EngagementStatus,
    LedgerEntryKind, LedgerTotals,
};
use crate::threshold::DgThreshold;
use crate::workflow::error::{Precondition, TransitionError};
use crate::workflow::types::{ActionKind, Actor, Attachments, DocumentType, Role};

pub(super) fn actor(roles: &[Role]) -> Actor {
    Actor::new(UserId::new(), roles.iter().copied())
}

pub(super) fn full_attachments() -> Attachments {
    [DocumentType::Facture, DocumentType::BonLivraison]
        .into_iter()
        .collect()
}

fn engagement(montant: i64) -> EngagementSnapshot {
    EngagementSnapshot {
        id: EngagementId::new(),
        budget_line_id: BudgetLineId::new(),
        montant: Montant::new(montant),
        status: EngagementStatus::Valide,
    }
}

fn amounts(ht: i64) -> LiquidationAmounts {
    LiquidationAmounts::new(Montant::new(ht), Montant::ZERO, Retenues::default()).unwrap()
}

pub(super) fn draft(machine: &LiquidationMachine, ht: i64, author: &Actor) -> Liquidation {
    let engagement = engagement(ht);
    let progress = EngagementProgress::compute(engagement.montant, &[]).unwrap();
    machine
        .create(
            NewLiquidation {
                numero: "LIQ-2026-0001".to_string(),
                engagement,
                amounts: amounts(ht),
                reference_facture: Some("FAC-778".to_string()),
            },
            &progress,
            author,
        )
        .unwrap()
        .liquidation
}

pub(super) fn submitted(machine: &LiquidationMachine, ht: i64) -> Liquidation {
    let author = actor(&[Role::Sdct]);
    let liq = draft(machine, ht, &author);
    let liq = machine
        .transition(&liq, LiquidationAction::CertifyServiceFait, &author, &full_attachments())
        .unwrap()
        .liquidation;
    machine
        .transition(&liq, LiquidationAction::Submit, &author, &full_attachments())
        .unwrap()
        .liquidation
}

fn scenario_machine() -> LiquidationMachine {
    LiquidationMachine::new(DgThreshold::new(Montant::new(500_000)))
}

#[test]
fn test_scenario_a_dg_validation_required() {
    let machine = scenario_machine();
    let liq = submitted(&machine, 1_000_000);
    assert_eq!(liq.status, LiquidationStatus::Soumis);
    assert_eq!(liq.current_step, 1);

    let daaf = actor(&[Role::Daaf]);
    let step1 = machine
        .transition(&liq, LiquidationAction::ValidateDaaf, &daaf, &full_attachments())
        .unwrap();
    assert_eq!(step1.liquidation.status, LiquidationStatus::ValideDaaf);
    assert_eq!(step1.liquidation.current_step, 2);
    assert!(step1.ledger_effect.is_none());
    assert!(!step1.liquidation.is_validation_complete());

    let dg = actor(&[Role::Dg]);
    let step2 = machine
        .transition(
            &step1.liquidation,
            LiquidationAction::ValidateDg,
            &dg,
            &full_attachments(),
        )
        .unwrap();
    assert_eq!(step2.liquidation.status, LiquidationStatus::ValideDg);
    assert!(step2.liquidation.is_validation_complete());

    let entry = step2.ledger_effect.unwrap();
    assert_eq!(entry.kind, LedgerEntryKind::Liquidation);
    assert_eq!(entry.montant, step2.liquidation.amounts.net_a_payer);

    let line = BudgetLine {
        id: step2.liquidation.budget_line_id,
        code: "62-01".to_string(),
        libelle: "Services".to_string(),
        exercice: 2026,
        dotation_initiale: Montant::new(10_000_000),
        virements_entrants: Montant::ZERO,
        virements_sortants: Montant::ZERO,
        totals: LedgerTotals {
            total_engage: Montant::new(5_000_000),
            total_liquide: Montant::new(250_000),
            total_paye: Montant::ZERO,
        },
        version: 3,
    };
    let updated = BudgetService::post(&line, &entry).unwrap();
    assert_eq!(updated.totals.total_liquide, Montant::new(1_250_000));
}

#[test]
fn test_below_threshold_is_final_at_daaf() {
    let machine = scenario_machine();
    let liq = submitted(&machine, 500_000);
    let daaf = actor(&[Role::Daaf]);
    let result = machine
        .transition(&liq, LiquidationAction::ValidateDaaf, &daaf, &full_attachments())
        .unwrap();
    assert_eq!(result.liquidation.status, LiquidationStatus::ValideDaaf);
    assert_eq!(result.liquidation.current_step, 1);
    assert!(result.liquidation.is_validation_complete());
    assert_eq!(
        result.ledger_effect.unwrap().montant,
        Montant::new(500_000)
    );

    // No DG step on a final DAAF validation.
    let dg = actor(&[Role::Dg]);
    let err = machine
        .transition(
            &result.liquidation,
            LiquidationAction::ValidateDg,
            &dg,
            &full_attachments(),
        )
        .unwrap_err();
    assert!(matches!(err, TransitionError::InvalidState { .. }));
    assert_eq!(
        machine.available_actions(&result.liquidation, &dg),
        vec![ActionKind::MarkUrgent]
    );
}

#[test]
fn test_scenario_c_reject_without_motif() {
    let machine = scenario_machine();
    let liq = submitted(&machine, 100_000);
    let daaf = actor(&[Role::Daaf]);
    let err = machine
        .transition(
            &liq,
            LiquidationAction::Reject {
                motif: "   ".to_string(),
            },
            &daaf,
            &full_attachments(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        TransitionError::MissingPrecondition(Precondition::Motif)
    ));
    assert_eq!(liq.status, LiquidationStatus::Soumis);
}

#[test]
fn test_reject_records_motif_and_audit() {
    let machine = scenario_machine();
    let liq = submitted(&machine, 100_000);
    let daaf = actor(&[Role::Daaf]);
    let result = machine
        .transition(
            &liq,
            LiquidationAction::Reject {
                motif: "Facture non conforme".to_string(),
            },
            &daaf,
            &full_attachments(),
        )
        .unwrap();
    assert_eq!(result.liquidation.status, LiquidationStatus::Rejete);
    let rejection = result.liquidation.rejection.as_ref().unwrap();
    assert_eq!(rejection.motif, "Facture non conforme");
    assert_eq!(rejection.step, 1);
    assert_eq!(result.audit.action, ActionKind::Reject);
    assert_eq!(result.audit.motif.as_deref(), Some("Facture non conforme"));
    assert_eq!(result.audit.old_values.as_ref().unwrap()["statut"], "soumis");
    assert_eq!(result.audit.new_values.as_ref().unwrap()["statut"], "rejete");
    assert_eq!(result.liquidation.version, liq.version + 1);
}

#[test]
fn test_certification_requires_both_documents() {
    let machine = scenario_machine();
    let author = actor(&[Role::Agent]);
    let liq = draft(&machine, 100_000, &author);
    let only_invoice: Attachments = [DocumentType::Facture].into_iter().collect();
    let err = machine
        .transition(&liq, LiquidationAction::CertifyServiceFait, &author, &only_invoice)
        .unwrap_err();
    match err {
        TransitionError::MissingPrecondition(Precondition::Documents(missing)) => {
            assert_eq!(missing, vec![DocumentType::BonLivraison]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_author_may_certify_without_role() {
    let machine = scenario_machine();
    let author = actor(&[Role::Agent]);
    let liq = draft(&machine, 100_000, &author);
    let result = machine
        .transition(&liq, LiquidationAction::CertifyServiceFait, &author, &full_attachments())
        .unwrap();
    assert_eq!(result.liquidation.status, LiquidationStatus::CertifieSf);
    assert_eq!(result.liquidation.certified_by, Some(author.user_id));

    let stranger = actor(&[Role::Agent]);
    let err = machine
        .transition(&liq, LiquidationAction::CertifyServiceFait, &stranger, &full_attachments())
        .unwrap_err();
    assert!(matches!(err, TransitionError::Unauthorized { .. }));
}

#[rstest]
#[case(Role::Admin, true)]
#[case(Role::Daaf, true)]
#[case(Role::Daf, true)]
#[case(Role::Sdct, true)]
#[case(Role::Dg, false)]
#[case(Role::Cb, false)]
#[case(Role::Tresorerie, false)]
fn test_daaf_control_roles(#[case] role: Role, #[case] allowed: bool) {
    let machine = scenario_machine();
    let liq = submitted(&machine, 100_000);
    let result = machine.transition(
        &liq,
        LiquidationAction::ValidateDaaf,
        &actor(&[role]),
        &full_attachments(),
    );
    assert_eq!(result.is_ok(), allowed);
    if !allowed {
        assert!(matches!(result, Err(TransitionError::Unauthorized { .. })));
    }
}

#[test]
fn test_dg_validation_only_from_valide_daaf() {
    let machine = scenario_machine();
    let liq = submitted(&machine, 1_000_000);
    let err = machine
        .transition(&liq, LiquidationAction::ValidateDg, &actor(&[Role::Dg]), &full_attachments())
        .unwrap_err();
    assert!(matches!(err, TransitionError::InvalidState { .. }));
}

#[test]
fn test_dg_defer_then_resume() {
    let machine = scenario_machine();
    let liq = submitted(&machine, 1_000_000);
    let liq = machine
        .transition(&liq, LiquidationAction::ValidateDaaf, &actor(&[Role::Daaf]), &full_attachments())
        .unwrap()
        .liquidation;

    let reprise = chrono::NaiveDate::from_ymd_opt(2026, 11, 30);
    let deferred = machine
        .transition(
            &liq,
            LiquidationAction::Defer {
                motif: "Attente arbitrage".to_string(),
                date_reprise: reprise,
            },
            &actor(&[Role::Dg]),
            &full_attachments(),
        )
        .unwrap()
        .liquidation;
    assert_eq!(deferred.status, LiquidationStatus::Differe);
    assert_eq!(deferred.deferral.as_ref().unwrap().step, 2);
    assert_eq!(deferred.deferral.as_ref().unwrap().date_reprise, reprise);

    let resumed = machine
        .transition(
            &deferred,
            LiquidationAction::Resume,
            &actor(&[Role::Direction]),
            &full_attachments(),
        )
        .unwrap()
        .liquidation;
    assert_eq!(resumed.status, LiquidationStatus::Brouillon);
    assert_eq!(resumed.current_step, 0);
    assert!(resumed.deferral.is_none());
    assert!(resumed.daaf_validated_at.is_none());
}

#[test]
fn test_resume_only_from_suspended() {
    let machine = scenario_machine();
    let liq = submitted(&machine, 100_000);
    let err = machine
        .transition(&liq, LiquidationAction::Resume, &actor(&[Role::Admin]), &full_attachments())
        .unwrap_err();
    assert!(matches!(err, TransitionError::InvalidState { .. }));
}

#[test]
fn test_create_checks_restant_a_liquider() {
    let machine = scenario_machine();
    let engagement = engagement(1_000_000);
    let progress =
        EngagementProgress::compute(engagement.montant, &[Montant::new(700_000)]).unwrap();
    let err = machine
        .create(
            NewLiquidation {
                numero: "LIQ-2026-0002".to_string(),
                engagement,
                amounts: amounts(300_001),
                reference_facture: None,
            },
            &progress,
            &actor(&[Role::Sdct]),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        TransitionError::ExceedsRemaining { remaining, .. } if remaining == Montant::new(300_000)
    ));
}

#[test]
fn test_create_requires_validated_engagement() {
    let machine = scenario_machine();
    let mut engagement = engagement(1_000_000);
    engagement.status = EngagementStatus::VisaCb;
    let progress = EngagementProgress::compute(engagement.montant, &[]).unwrap();
    let err = machine
        .create(
            NewLiquidation {
                numero: "LIQ-2026-0003".to_string(),
                engagement,
                amounts: amounts(10),
                reference_facture: None,
            },
            &progress,
            &actor(&[Role::Sdct]),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        TransitionError::MissingPrecondition(Precondition::ParentNotValidated)
    ));
}

fn mark_urgent(motif: &str) -> LiquidationAction {
    LiquidationAction::MarkUrgent {
        motif: motif.to_string(),
    }
}

#[test]
fn test_mark_urgent_keeps_status_and_is_audited() {
    let machine = scenario_machine();
    let liq = submitted(&machine, 1_000_000);
    let daaf = actor(&[Role::Daaf]);
    let result = machine
        .transition(&liq, mark_urgent(" Fournisseur en rupture "), &daaf, &Attachments::new())
        .unwrap();

    let marked = &result.liquidation;
    assert_eq!(marked.status, LiquidationStatus::Soumis);
    assert_eq!(marked.current_step, 1);
    assert_eq!(marked.version, liq.version + 1);
    let urgence = marked.urgence.as_ref().unwrap();
    assert_eq!(urgence.motif, "Fournisseur en rupture");
    assert_eq!(urgence.marked_by, daaf.user_id);
    assert!(result.ledger_effect.is_none());

    assert_eq!(result.audit.action, ActionKind::MarkUrgent);
    assert_eq!(result.audit.motif.as_deref(), Some("Fournisseur en rupture"));
    assert_eq!(result.audit.old_values.as_ref().unwrap()["reglement_urgent"], false);
    assert_eq!(result.audit.new_values.as_ref().unwrap()["reglement_urgent"], true);
    assert_eq!(result.audit.new_values.as_ref().unwrap()["statut"], "soumis");
}

#[test]
fn test_mark_urgent_requires_motif() {
    let machine = scenario_machine();
    let liq = submitted(&machine, 100_000);
    let err = machine
        .transition(&liq, mark_urgent("  "), &actor(&[Role::Dg]), &Attachments::new())
        .unwrap_err();
    assert!(matches!(
        err,
        TransitionError::MissingPrecondition(Precondition::Motif)
    ));
}

#[test]
fn test_unmark_urgent_clears_flag() {
    let machine = scenario_machine();
    let liq = submitted(&machine, 100_000);
    let dg = actor(&[Role::Dg]);
    let marked = machine
        .transition(&liq, mark_urgent("Échéance contractuelle"), &dg, &Attachments::new())
        .unwrap()
        .liquidation;
    assert!(marked.is_urgent());

    let result = machine
        .transition(&marked, LiquidationAction::UnmarkUrgent, &dg, &Attachments::new())
        .unwrap();
    assert!(!result.liquidation.is_urgent());
    assert_eq!(result.liquidation.status, LiquidationStatus::Soumis);
    assert_eq!(result.audit.action, ActionKind::UnmarkUrgent);
    assert_eq!(result.audit.action.as_str(), "REMOVE_URGENT");

    let err = machine
        .transition(
            &result.liquidation,
            LiquidationAction::UnmarkUrgent,
            &dg,
            &Attachments::new(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        TransitionError::MissingPrecondition(Precondition::NotUrgent)
    ));
}

#[test]
fn test_urgency_survives_validation_but_not_on_rejected() {
    let machine = scenario_machine();
    let liq = submitted(&machine, 300_000);
    let daaf = actor(&[Role::Daaf]);
    let marked = machine
        .transition(&liq, mark_urgent("Paiement des salaires"), &daaf, &Attachments::new())
        .unwrap()
        .liquidation;
    let validated = machine
        .transition(&marked, LiquidationAction::ValidateDaaf, &daaf, &full_attachments())
        .unwrap()
        .liquidation;
    assert!(validated.is_validation_complete());
    assert!(validated.is_urgent());
    assert_eq!(
        machine.available_actions(&validated, &daaf),
        vec![ActionKind::MarkUrgent, ActionKind::UnmarkUrgent]
    );

    let rejected = machine
        .transition(
            &submitted(&machine, 300_000),
            LiquidationAction::Reject {
                motif: "Pièces illisibles".to_string(),
            },
            &daaf,
            &full_attachments(),
        )
        .unwrap()
        .liquidation;
    let err = machine
        .transition(&rejected, mark_urgent("Relance"), &daaf, &Attachments::new())
        .unwrap_err();
    assert!(matches!(err, TransitionError::InvalidState { .. }));
}

#[rstest]
#[case(Role::Agent, false)]
#[case(Role::Tresorerie, false)]
#[case(Role::Direction, false)]
#[case(Role::Sdct, true)]
#[case(Role::Dg, true)]
fn test_mark_urgent_roles(#[case] role: Role, #[case] allowed: bool) {
    let machine = scenario_machine();
    let liq = submitted(&machine, 100_000);
    let result = machine.transition(&liq, mark_urgent("Urgent"), &actor(&[role]), &Attachments::new());
    assert_eq!(result.is_ok(), allowed);
    if !allowed {
        assert!(matches!(result, Err(TransitionError::Unauthorized { .. })));
    }
}

#[test]
fn test_stamps_are_at_microsecond_precision() {
    let machine = scenario_machine();
    let liq = submitted(&machine, 300_000);
    let liq = machine
        .transition(&liq, LiquidationAction::ValidateDaaf, &actor(&[Role::Daaf]), &full_attachments())
        .unwrap()
        .liquidation;
    let stamps = [
        Some(liq.created_at),
        Some(liq.updated_at),
        liq.certified_at,
        liq.submitted_at,
        liq.daaf_validated_at,
        liq.validated_at,
    ];
    for stamp in stamps {
        let stamp = stamp.expect("stamp set along the chain");
        assert_eq!(stamp.timestamp_subsec_nanos() % 1_000, 0, "{stamp}");
    }
}

#[test]
fn test_create_audit_has_no_old_values() {
    let machine = scenario_machine();
    let engagement = engagement(1_000);
    let progress = EngagementProgress::compute(engagement.montant, &[]).unwrap();
    let result = machine
        .create(
            NewLiquidation {
                numero: "LIQ-2026-0004".to_string(),
                engagement,
                amounts: amounts(1_000),
                reference_facture: None,
            },
            &progress,
            &actor(&[Role::Direction]),
        )
        .unwrap();
    assert_eq!(result.liquidation.status, LiquidationStatus::Brouillon);
    assert_eq!(result.audit.action, ActionKind::Create);
    assert!(result.audit.old_values.is_none());
}

#[test]
fn test_amounts_from_rates() {
    let taux = TauxRetenues {
        airsi: dec!(5),
        retenue_source: dec!(0),
        bic: dec!(2),
        bnc: dec!(0),
    };
    let amounts = LiquidationAmounts::from_rates(
        Montant::new(1_000_000),
        TAUX_TVA_STANDARD,
        &taux,
        Penalites::Journalieres {
            taux_journalier: dec!(0.1),
            nb_jours: 3,
        },
    )
    .unwrap();
    assert_eq!(amounts.tva_montant, Montant::new(180_000));
    assert_eq!(amounts.montant_ttc, Montant::new(1_180_000));
    assert_eq!(amounts.retenues.airsi, Montant::new(50_000));
    assert_eq!(amounts.retenues.bic, Montant::new(20_000));
    assert_eq!(amounts.retenues.penalites, Montant::new(3_540));
    assert_eq!(amounts.total_retenues, Montant::new(73_540));
    assert_eq!(amounts.net_a_payer, Montant::new(1_106_460));
}

#[test]
fn test_amounts_rounding_half_away_from_zero() {
    let taux = TauxRetenues {
        airsi: dec!(2.5),
        ..TauxRetenues::default()
    };
    let amounts =
        LiquidationAmounts::from_rates(Montant::new(101), dec!(0), &taux, Penalites::Aucune)
            .unwrap();
    // 101 * 2.5% = 2.525 -> 3
    assert_eq!(amounts.retenues.airsi, Montant::new(3));
    assert_eq!(amounts.net_a_payer, Montant::new(98));
}

#[test]
fn test_retenues_cannot_exceed_ttc() {
    let retenues = Retenues {
        penalites: Montant::new(1_001),
        ..Retenues::default()
    };
    let err = LiquidationAmounts::new(Montant::new(1_000), Montant::ZERO, retenues).unwrap_err();
    assert!(matches!(err, TransitionError::ExceedsRemaining { .. }));
}

#[test]
fn test_negative_amount_rejected() {
    let err = LiquidationAmounts::new(Montant::new(-1), Montant::ZERO, Retenues::default())
        .unwrap_err();
    assert!(matches!(err, TransitionError::InvalidAmount(m) if m == Montant::new(-1)));
}

#[test]
fn test_status_parse_accepts_unaccented() {
    assert_eq!(
        LiquidationStatus::parse("valide_daaf"),
        Some(LiquidationStatus::ValideDaaf)
    );
    assert_eq!(
        LiquidationStatus::parse("certifié_sf"),
        Some(LiquidationStatus::CertifieSf)
    );
    assert_eq!(LiquidationStatus::parse("paye"), None);
}

#[test]
fn test_matrix_is_enumerable() {
    let rules = LIQUIDATION_MATRIX.rules();
    assert_eq!(rules.len(), 22);
    assert!(
        LIQUIDATION_MATRIX
            .rule(ActionKind::ValidateDg, LiquidationStatus::ValideDaaf)
            .is_some()
    );
    assert!(
        LIQUIDATION_MATRIX
            .rule(ActionKind::ValidateDg, LiquidationStatus::Soumis)
            .is_none()
    );
}

//! Liquidation chain against the database: transitions, ledger posting
//! and audit trail committed together.

mod common;

use sygfp_core::liquidation::{LiquidationAction, LiquidationStatus};
use sygfp_core::workflow::{ActionKind, EntityKind, Precondition, Role, TransitionError};
use sygfp_db::{AuditRepository, BudgetLedgerRepository, CreateLiquidationInput, LiquidationRepository};
use sygfp_shared::types::Montant;

use common::{
    actor, amounts, connect, liquidation_machine, numero, seed_engagement, seed_line,
    submitted_liquidation,
};

#[tokio::test]
#[ignore = "Requires database"]
async fn test_dg_validated_liquidation_posts_net_once() {
    let db = connect().await;
    let line = seed_line(&db, 10_000_000).await;
    let engagement_id = seed_engagement(&db, line.id, 5_000_000).await;
    let repo = LiquidationRepository::new(db.clone(), liquidation_machine());
    let ledger = BudgetLedgerRepository::new(db.clone());

    let liquidation = submitted_liquidation(&repo, &db, engagement_id, 1_000_000).await;
    assert_eq!(liquidation.status, LiquidationStatus::Soumis);

    let step1 = repo
        .transition(liquidation.id, LiquidationAction::ValidateDaaf, &actor(&[Role::Daaf]))
        .await
        .unwrap();
    assert_eq!(step1.liquidation.current_step, 2);
    assert!(step1.ledger_effect.is_none());
    assert_eq!(
        ledger.find_line(line.id).await.unwrap().totals.total_liquide,
        Montant::ZERO
    );

    let step2 = repo
        .transition(liquidation.id, LiquidationAction::ValidateDg, &actor(&[Role::Dg]))
        .await
        .unwrap();
    assert_eq!(step2.liquidation.status, LiquidationStatus::ValideDg);

    let stored = repo.find(liquidation.id).await.unwrap();
    assert_eq!(stored, step2.liquidation);
    assert!(stored.is_validation_complete());

    let line_after = ledger.find_line(line.id).await.unwrap();
    assert_eq!(line_after.totals.total_liquide, Montant::new(1_000_000));
    assert_eq!(ledger.replay_totals(line.id).await.unwrap(), line_after.totals);

    let trail = AuditRepository::new(db.clone())
        .list_for_entity(EntityKind::Liquidation, liquidation.id.into_inner())
        .await
        .unwrap();
    let actions: Vec<ActionKind> = trail.iter().map(|r| r.action).collect();
    assert_eq!(
        actions,
        vec![
            ActionKind::Create,
            ActionKind::CertifyServiceFait,
            ActionKind::Submit,
            ActionKind::ValidateDaaf,
            ActionKind::ValidateDg,
        ]
    );
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_certify_requires_documents() {
    let db = connect().await;
    let line = seed_line(&db, 10_000_000).await;
    let engagement_id = seed_engagement(&db, line.id, 200_000).await;
    let repo = LiquidationRepository::new(db.clone(), liquidation_machine());
    let author = actor(&[Role::Sdct]);

    let liquidation = repo
        .create(
            CreateLiquidationInput {
                numero: numero("LIQ"),
                engagement_id,
                amounts: amounts(200_000),
                reference_facture: None,
            },
            &author,
        )
        .await
        .unwrap();

    let err = repo
        .transition(liquidation.id, LiquidationAction::CertifyServiceFait, &author)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TransitionError::MissingPrecondition(Precondition::Documents(_))
    ));
    assert_eq!(
        repo.find(liquidation.id).await.unwrap().status,
        LiquidationStatus::Brouillon
    );
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_create_respects_restant_a_liquider() {
    let db = connect().await;
    let line = seed_line(&db, 10_000_000).await;
    let engagement_id = seed_engagement(&db, line.id, 300_000).await;
    let repo = LiquidationRepository::new(db.clone(), liquidation_machine());
    let author = actor(&[Role::Sdct]);

    repo.create(
        CreateLiquidationInput {
            numero: numero("LIQ"),
            engagement_id,
            amounts: amounts(200_000),
            reference_facture: None,
        },
        &author,
    )
    .await
    .unwrap();

    let progress = repo.engagement_progress(engagement_id).await.unwrap();
    assert_eq!(progress.restant_a_liquider, Montant::new(100_000));

    let err = repo
        .create(
            CreateLiquidationInput {
                numero: numero("LIQ"),
                engagement_id,
                amounts: amounts(150_000),
                reference_facture: None,
            },
            &author,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TransitionError::ExceedsRemaining { .. }));
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_reject_then_resume_returns_to_draft() {
    let db = connect().await;
    let line = seed_line(&db, 10_000_000).await;
    let engagement_id = seed_engagement(&db, line.id, 400_000).await;
    let repo = LiquidationRepository::new(db.clone(), liquidation_machine());
    let liquidation = submitted_liquidation(&repo, &db, engagement_id, 400_000).await;
    let daaf = actor(&[Role::Daaf]);

    let rejected = repo
        .transition(
            liquidation.id,
            LiquidationAction::Reject {
                motif: "Facture non conforme".to_string(),
            },
            &daaf,
        )
        .await
        .unwrap()
        .liquidation;
    assert_eq!(rejected.status, LiquidationStatus::Rejete);
    assert_eq!(
        rejected.rejection.as_ref().map(|r| r.motif.as_str()),
        Some("Facture non conforme")
    );

    let resumed = repo
        .transition(liquidation.id, LiquidationAction::Resume, &actor(&[Role::Admin]))
        .await
        .unwrap()
        .liquidation;
    assert_eq!(resumed.status, LiquidationStatus::Brouillon);
    assert_eq!(resumed.current_step, 0);
    assert_eq!(resumed.version, rejected.version + 1);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_urgent_flag_is_persisted_and_audited() {
    let db = connect().await;
    let line = seed_line(&db, 10_000_000).await;
    let engagement_id = seed_engagement(&db, line.id, 250_000).await;
    let repo = LiquidationRepository::new(db.clone(), liquidation_machine());
    let liquidation = submitted_liquidation(&repo, &db, engagement_id, 250_000).await;
    let dg = actor(&[Role::Dg]);

    let marked = repo
        .transition(
            liquidation.id,
            LiquidationAction::MarkUrgent {
                motif: "Fournisseur en rupture de trésorerie".to_string(),
            },
            &dg,
        )
        .await
        .unwrap();
    assert!(marked.ledger_effect.is_none());

    let stored = repo.find(liquidation.id).await.unwrap();
    assert_eq!(stored, marked.liquidation);
    assert_eq!(stored.status, LiquidationStatus::Soumis);
    let urgence = stored.urgence.as_ref().unwrap();
    assert_eq!(urgence.motif, "Fournisseur en rupture de trésorerie");
    assert_eq!(urgence.marked_by, dg.user_id);

    let queue = repo.urgent(line.id).await.unwrap();
    assert_eq!(queue.iter().map(|l| l.id).collect::<Vec<_>>(), vec![liquidation.id]);

    let unmarked = repo
        .transition(liquidation.id, LiquidationAction::UnmarkUrgent, &dg)
        .await
        .unwrap()
        .liquidation;
    assert!(!unmarked.is_urgent());
    assert!(repo.find(liquidation.id).await.unwrap().urgence.is_none());
    assert!(repo.urgent(line.id).await.unwrap().is_empty());

    let trail = AuditRepository::new(db.clone())
        .list_for_entity(EntityKind::Liquidation, liquidation.id.into_inner())
        .await
        .unwrap();
    let urgency: Vec<_> = trail
        .iter()
        .filter(|r| matches!(r.action, ActionKind::MarkUrgent | ActionKind::UnmarkUrgent))
        .collect();
    assert_eq!(urgency.len(), 2);
    assert_eq!(urgency[0].action, ActionKind::MarkUrgent);
    assert_eq!(
        urgency[0].motif.as_deref(),
        Some("Fournisseur en rupture de trésorerie")
    );
    assert_eq!(urgency[1].action, ActionKind::UnmarkUrgent);

    let err = repo
        .transition(liquidation.id, LiquidationAction::UnmarkUrgent, &dg)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TransitionError::MissingPrecondition(Precondition::NotUrgent)
    ));
}

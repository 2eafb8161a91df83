//! Payment registration against the database.

mod common;

use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use sygfp_core::budget::LedgerEntryKind;
use sygfp_core::ordonnancement::ModePaiement;
use sygfp_core::settlement::{
    BordereauNumber, NewPayment, PaymentCancellation, ReglementStatus, RenvoiTarget, SettlementError,
    SettlementStatus,
};
use sygfp_core::workflow::{ActionKind, EntityKind, Precondition, Role};
use sygfp_db::entities::ordonnancement_signatures;
use sygfp_db::{AuditRepository, BudgetLedgerRepository, SettlementRepository};
use sygfp_shared::types::Montant;
use tokio::sync::Barrier;
use uuid::Uuid;

use common::{actor, connect, numero, payable_ordonnancement};

/// An exercice no other run has numbered bordereaux in.
fn fresh_exercice() -> u16 {
    u16::try_from(3000 + Uuid::new_v4().as_u128() % 6000).unwrap()
}

fn payment(montant: i64) -> NewPayment {
    NewPayment {
        numero: numero("REG"),
        montant: Montant::new(montant),
        mode_paiement: ModePaiement::Virement,
        reference: Some("VIR-778812".to_string()),
        compte_bancaire: Some("CI0010100100123456789012".to_string()),
        date_paiement: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
    }
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_partial_then_full_settlement() {
    let db = connect().await;
    let ord = payable_ordonnancement(&db, 300_000).await;
    let repo = SettlementRepository::new(db.clone());
    let tresorier = actor(&[Role::Tresorerie]);

    let first = repo
        .register_payment(ord.id, payment(100_000), &tresorier)
        .await
        .unwrap();
    assert_eq!(first.status, SettlementStatus::Partiel);
    assert_eq!(first.ordonnancement.montant_paye, Montant::new(100_000));

    let second = repo
        .register_payment(ord.id, payment(200_000), &tresorier)
        .await
        .unwrap();
    assert_eq!(second.status, SettlementStatus::Solde);
    assert_eq!(second.ordonnancement.montant_paye, Montant::new(300_000));

    let err = repo
        .register_payment(ord.id, payment(1), &tresorier)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SettlementError::ExceedsRemaining { remaining, .. } if remaining == Montant::ZERO
    ));

    let line = BudgetLedgerRepository::new(db.clone())
        .find_line(ord.budget_line_id)
        .await
        .unwrap();
    assert_eq!(line.totals.total_paye, Montant::new(300_000));

    let summary = repo.summary(ord.id).await.unwrap();
    assert_eq!(summary.restant, Montant::ZERO);
    assert_eq!(summary.reglements_actifs, 2);

    let trail = AuditRepository::new(db.clone())
        .list_for_entity(EntityKind::Reglement, first.reglement.id.into_inner())
        .await
        .unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].action, ActionKind::RegisterPayment);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_payment_refused_once_a_signature_is_withdrawn() {
    let db = connect().await;
    let ord = payable_ordonnancement(&db, 300_000).await;
    let repo = SettlementRepository::new(db.clone());

    ordonnancement_signatures::Entity::update_many()
        .col_expr(
            ordonnancement_signatures::Column::SignedBy,
            Expr::value(Option::<Uuid>::None),
        )
        .filter(ordonnancement_signatures::Column::OrdonnancementId.eq(ord.id.into_inner()))
        .filter(ordonnancement_signatures::Column::SignatureOrder.eq(2))
        .exec(&db)
        .await
        .unwrap();

    let err = repo
        .register_payment(ord.id, payment(100_000), &actor(&[Role::Tresorerie]))
        .await
        .unwrap_err();
    assert!(
        matches!(err, SettlementError::MissingPrecondition(Precondition::Signatures)),
        "{err:?}"
    );

    let summary = repo.summary(ord.id).await.unwrap();
    assert_eq!(summary.montant_paye, Montant::ZERO);
    assert!(repo.reglements(ord.id).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_cancel_restores_remaining_and_ledger() {
    let db = connect().await;
    let ord = payable_ordonnancement(&db, 300_000).await;
    let repo = SettlementRepository::new(db.clone());
    let ledger = BudgetLedgerRepository::new(db.clone());
    let tresorier = actor(&[Role::Tresorerie]);

    let paid = repo
        .register_payment(ord.id, payment(120_000), &tresorier)
        .await
        .unwrap();

    let cancelled = repo
        .cancel_payment(
            paid.reglement.id,
            PaymentCancellation {
                motif: "Virement retourné par la banque".to_string(),
                renvoi: Some(RenvoiTarget::Engagement),
            },
            &tresorier,
        )
        .await
        .unwrap();
    assert_eq!(cancelled.ordonnancement.montant_paye, Montant::ZERO);
    assert_eq!(cancelled.reglement.status, ReglementStatus::Rejete);

    let movements = repo.reglements(ord.id).await.unwrap();
    assert_eq!(movements.len(), 1);
    assert!(!movements[0].is_active());
    assert_eq!(
        movements[0].rejection.as_ref().and_then(|r| r.renvoi),
        Some(RenvoiTarget::Engagement)
    );

    let paiements: Vec<i64> = ledger
        .entries(ord.budget_line_id)
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.kind == LedgerEntryKind::Paiement)
        .map(|e| e.montant.minor_units())
        .collect();
    assert_eq!(paiements, vec![120_000, -120_000]);
    assert_eq!(
        ledger.find_line(ord.budget_line_id).await.unwrap().totals.total_paye,
        Montant::ZERO
    );

    let again = repo
        .cancel_payment(
            paid.reglement.id,
            PaymentCancellation {
                motif: "Doublon".to_string(),
                renvoi: None,
            },
            &tresorier,
        )
        .await
        .unwrap_err();
    assert!(matches!(again, SettlementError::InvalidState { .. }));
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_concurrent_payments_never_exceed_ceiling() {
    let db = connect().await;
    let ord = payable_ordonnancement(&db, 300_000).await;
    let repo = SettlementRepository::new(db.clone());

    let count = 8;
    let barrier = Arc::new(Barrier::new(count));
    let tasks = (0..count).map(|_| {
        let repo = repo.clone();
        let barrier = Arc::clone(&barrier);
        let id = ord.id;
        tokio::spawn(async move {
            let tresorier = actor(&[Role::Tresorerie]);
            barrier.wait().await;
            repo.register_payment(id, payment(50_000), &tresorier).await
        })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(accepted, 6);
    for refused in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(
            matches!(refused, SettlementError::ExceedsRemaining { .. }),
            "unexpected refusal: {refused:?}"
        );
    }

    let summary = repo.summary(ord.id).await.unwrap();
    assert_eq!(summary.montant_paye, Montant::new(300_000));
    assert_eq!(summary.status, SettlementStatus::Solde);
    assert_eq!(summary.reglements_actifs, 6);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_bordereau_keeps_selection_order_and_skips_rejected() {
    let db = connect().await;
    let ord = payable_ordonnancement(&db, 300_000).await;
    let repo = SettlementRepository::new(db.clone());
    let tresorier = actor(&[Role::Tresorerie]);

    let a = repo.register_payment(ord.id, payment(50_000), &tresorier).await.unwrap();
    let b = repo.register_payment(ord.id, payment(70_000), &tresorier).await.unwrap();
    let c = repo.register_payment(ord.id, payment(30_000), &tresorier).await.unwrap();
    repo.cancel_payment(
        b.reglement.id,
        PaymentCancellation {
            motif: "Erreur de RIB".to_string(),
            renvoi: None,
        },
        &tresorier,
    )
    .await
    .unwrap();

    let exercice = fresh_exercice();
    let bordereau = repo
        .bordereau(exercice, &[c.reglement.id, b.reglement.id, a.reglement.id], &tresorier)
        .await
        .unwrap();
    assert_eq!(bordereau.reglements, vec![c.reglement.id, a.reglement.id]);
    assert_eq!(bordereau.excluded, vec![b.reglement.id]);
    assert_eq!(bordereau.total, Montant::new(80_000));
    assert_eq!(bordereau.numero, BordereauNumber::new(exercice, 1).unwrap());

    let stored = repo.find_bordereau(bordereau.numero).await.unwrap();
    assert_eq!(stored, Some(bordereau));
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_bordereaux_of_one_exercice_get_distinct_numbers() {
    let db = connect().await;
    let ord = payable_ordonnancement(&db, 300_000).await;
    let repo = SettlementRepository::new(db.clone());
    let tresorier = actor(&[Role::Tresorerie]);
    let paid = repo
        .register_payment(ord.id, payment(100_000), &tresorier)
        .await
        .unwrap();
    let exercice = fresh_exercice();

    let count = 8;
    let barrier = Arc::new(Barrier::new(count));
    let tasks = (0..count).map(|_| {
        let repo = repo.clone();
        let barrier = Arc::clone(&barrier);
        let selection = [paid.reglement.id];
        tokio::spawn(async move {
            let tresorier = actor(&[Role::Tresorerie]);
            barrier.wait().await;
            repo.bordereau(exercice, &selection, &tresorier).await
        })
    });
    let mut sequences: Vec<u16> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked").unwrap().numero.sequence())
        .collect();
    sequences.sort_unstable();
    assert_eq!(sequences, (1..=8).collect::<Vec<u16>>());

    // A refused batch does not consume a number.
    let err = repo
        .bordereau(exercice, &[], &tresorier)
        .await
        .unwrap_err();
    assert!(matches!(err, SettlementError::EmptyBordereau));
    let next = repo
        .bordereau(exercice, &[paid.reglement.id], &tresorier)
        .await
        .unwrap();
    assert_eq!(next.numero.sequence(), 9);
}

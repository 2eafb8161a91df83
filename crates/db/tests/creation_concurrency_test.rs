//! Concurrent creations against one parent document.
//!
//! The remaining amount of an engagement (or of a liquidation) is read
//! and checked inside the creating transaction, so creations racing on
//! the same parent must never overshoot it.

mod common;

use std::sync::Arc;

use futures::future::join_all;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use sygfp_core::liquidation::Liquidation;
use sygfp_core::ordonnancement::{Ordonnancement, OrdonnancementMachine};
use sygfp_core::workflow::{Role, TransitionError};
use sygfp_db::entities::ordonnancements;
use sygfp_db::{CreateLiquidationInput, LiquidationRepository, OrdonnancementRepository};
use sygfp_shared::types::Montant;
use tokio::sync::Barrier;

use common::{
    actor, amounts, connect, liquidation_machine, new_ordonnancement, numero, seed_engagement,
    seed_line, validated_liquidation,
};

fn assert_only_exceeds_remaining<T: std::fmt::Debug>(results: &[Result<T, TransitionError>]) {
    for refused in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(
            matches!(refused, TransitionError::ExceedsRemaining { .. }),
            "unexpected refusal: {refused:?}"
        );
    }
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_concurrent_ordonnancements_never_exceed_liquidation_net() {
    let db = connect().await;
    let liquidation = validated_liquidation(&db, 300_000).await;
    assert_eq!(liquidation.amounts.net_a_payer, Montant::new(300_000));
    let repo = OrdonnancementRepository::new(db.clone(), OrdonnancementMachine::default());

    let count = 6;
    let barrier = Arc::new(Barrier::new(count));
    let tasks = (0..count).map(|_| {
        let repo = repo.clone();
        let barrier = Arc::clone(&barrier);
        let daaf = actor(&[Role::Daaf]);
        tokio::spawn(async move {
            barrier.wait().await;
            repo.create(liquidation.id, new_ordonnancement(300_000), &daaf)
                .await
        })
    });
    let results: Vec<Result<Ordonnancement, TransitionError>> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1, "{results:?}");
    assert_only_exceeds_remaining(&results);

    let stored = ordonnancements::Entity::find()
        .filter(ordonnancements::Column::LiquidationId.eq(liquidation.id.into_inner()))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].montant, 300_000);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_concurrent_liquidations_never_exceed_engagement() {
    let db = connect().await;
    let line = seed_line(&db, 10_000_000).await;
    let engagement_id = seed_engagement(&db, line.id, 300_000).await;
    let repo = LiquidationRepository::new(db.clone(), liquidation_machine());

    let count = 6;
    let barrier = Arc::new(Barrier::new(count));
    let tasks = (0..count).map(|_| {
        let repo = repo.clone();
        let barrier = Arc::clone(&barrier);
        let author = actor(&[Role::Sdct]);
        tokio::spawn(async move {
            barrier.wait().await;
            repo.create(
                CreateLiquidationInput {
                    numero: numero("LIQ"),
                    engagement_id,
                    amounts: amounts(100_000),
                    reference_facture: None,
                },
                &author,
            )
            .await
        })
    });
    let results: Vec<Result<Liquidation, TransitionError>> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 3, "{results:?}");
    assert_only_exceeds_remaining(&results);

    let progress = repo.engagement_progress(engagement_id).await.unwrap();
    assert_eq!(progress.montant_liquide, Montant::new(300_000));
    assert_eq!(progress.restant_a_liquider, Montant::ZERO);
}

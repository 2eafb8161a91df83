//! Property tests for the payment ceiling and cancellation symmetry.

use proptest::prelude::*;
use sygfp_shared::types::Montant;

use super::service::SettlementService;
use super::tests::{payable, payment, tresorier};
use super::types::SettlementStatus;
use super::{PaymentCancellation, SettlementError};

fn ceiling_and_paid() -> impl Strategy<Value = (i64, i64)> {
    (1i64..10_000_000_000).prop_flat_map(|montant| (Just(montant), 0..=montant))
}

proptest! {
    #[test]
    fn prop_over_remaining_always_fails(
        (montant, paye) in ceiling_and_paid(),
        excess in 1i64..1_000_000,
    ) {
        let ord = payable(montant, paye);
        let restant = montant - paye;
        let result = SettlementService::register_payment(&ord, payment(restant + excess), &tresorier());
        let failed_on_ceiling = matches!(result, Err(SettlementError::ExceedsRemaining { .. }));
        prop_assert!(failed_on_ceiling);
        prop_assert_eq!(ord.montant_paye, Montant::new(paye));
    }

    #[test]
    fn prop_exact_remaining_settles((montant, paye) in ceiling_and_paid()) {
        prop_assume!(paye < montant);
        let ord = payable(montant, paye);
        let outcome =
            SettlementService::register_payment(&ord, payment(montant - paye), &tresorier()).unwrap();
        prop_assert_eq!(outcome.status, SettlementStatus::Solde);
        prop_assert_eq!(outcome.ordonnancement.montant_paye, ord.montant);
    }

    #[test]
    fn prop_cancel_restores_paid_total(
        (montant, paye) in ceiling_and_paid(),
        share in 1u32..=100,
    ) {
        prop_assume!(paye < montant);
        let restant = montant - paye;
        let amount = (restant * i64::from(share) / 100).max(1);
        let actor = tresorier();
        let ord = payable(montant, paye);

        let registered = SettlementService::register_payment(&ord, payment(amount), &actor).unwrap();
        let cancelled = SettlementService::cancel_payment(
            &registered.ordonnancement,
            &registered.reglement,
            PaymentCancellation { motif: "Annulation".to_string(), renvoi: None },
            &actor,
        )
        .unwrap();

        prop_assert_eq!(cancelled.ordonnancement.montant_paye, ord.montant_paye);
        prop_assert_eq!(
            registered.ledger_effect.montant.checked_add(cancelled.ledger_effect.montant).unwrap(),
            Montant::ZERO
        );
    }
}

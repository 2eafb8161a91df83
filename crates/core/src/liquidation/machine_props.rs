//! Property-based tests for the liquidation state machine.

use proptest::prelude::*;
use sygfp_shared::types::Montant;

use super::machine::{DAAF_ROLES, LiquidationAction, LiquidationMachine};
use super::tests::{actor, full_attachments, submitted};
use super::types::LiquidationStatus;
use crate::threshold::DgThreshold;
use crate::workflow::error::TransitionError;
use crate::workflow::types::Role;

fn arb_role() -> impl Strategy<Value = Role> {
    proptest::sample::select(Role::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// DAAF control enters step 2 exactly when the net amount is above the ceiling.
    #[test]
    fn prop_threshold_gate(
        seuil in 1i64..10_000_000,
        net in 1i64..20_000_000,
    ) {
        let machine = LiquidationMachine::new(DgThreshold::new(Montant::new(seuil)));
        let liq = submitted(&machine, net);
        let result = machine
            .transition(&liq, LiquidationAction::ValidateDaaf, &actor(&[Role::Daaf]), &full_attachments())
            .unwrap();

        prop_assert_eq!(result.liquidation.status, LiquidationStatus::ValideDaaf);
        if net > seuil {
            prop_assert_eq!(result.liquidation.current_step, 2);
            prop_assert!(result.ledger_effect.is_none());
        } else {
            prop_assert_eq!(result.liquidation.current_step, 1);
            prop_assert!(result.liquidation.is_validation_complete());
            prop_assert_eq!(result.ledger_effect.map(|e| e.montant), Some(Montant::new(net)));
        }
    }

    /// An actor outside the DAAF roles never validates, and nothing changes.
    #[test]
    fn prop_daaf_role_gating(roles in proptest::collection::vec(arb_role(), 0..3)) {
        let machine = LiquidationMachine::default();
        let liq = submitted(&machine, 1_000);
        let validator = actor(&roles);
        let result = machine.transition(&liq, LiquidationAction::ValidateDaaf, &validator, &full_attachments());

        if validator.has_any_role(DAAF_ROLES) {
            prop_assert!(result.is_ok());
        } else {
            let is_unauthorized = matches!(result, Err(TransitionError::Unauthorized { .. }));
            prop_assert!(is_unauthorized);
            prop_assert_eq!(liq.status, LiquidationStatus::Soumis);
        }
    }
}

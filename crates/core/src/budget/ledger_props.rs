//! Property-based tests for the budget ledger.

use proptest::prelude::*;
use sygfp_shared::types::{BudgetLineId, LiquidationId, Montant, ReglementId};

use super::ledger::BudgetLedger;
use super::types::{LedgerEntry, LedgerEntryKind, LedgerTotals};
use crate::workflow::types::EntityKind;

fn arb_amounts() -> impl Strategy<Value = Vec<i64>> {
    proptest::collection::vec(1i64..10_000_000, 1..12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The liquidated total is the same whatever the order in which
    /// validations are applied.
    #[test]
    fn prop_liquidation_order_does_not_matter(
        amounts in arb_amounts(),
        seed in any::<u64>(),
    ) {
        let id = BudgetLineId::new();
        let entries: Vec<LedgerEntry> = amounts
            .iter()
            .map(|a| LedgerEntry::liquidation_validated(id, LiquidationId::new(), Montant::new(*a)))
            .collect();

        let mut shuffled = entries.clone();
        let len = shuffled.len();
        #[allow(clippy::cast_possible_truncation)]
        shuffled.rotate_left((seed % len as u64) as usize);
        shuffled.reverse();

        let forward = LedgerTotals::fold(&entries).unwrap();
        let backward = LedgerTotals::fold(&shuffled).unwrap();
        prop_assert_eq!(forward, backward);
        prop_assert_eq!(forward.total_liquide.minor_units(), amounts.iter().sum::<i64>());
    }

    /// Guarded appends never leave `paye <= liquide <= engage` broken.
    #[test]
    fn prop_guards_hold(
        engaged in 1i64..100_000_000,
        liquidations in arb_amounts(),
        payments in arb_amounts(),
    ) {
        let id = BudgetLineId::new();
        let mut ledger = BudgetLedger::new(id);
        ledger
            .append(LedgerEntry::new(
                id,
                LedgerEntryKind::Engagement,
                Montant::new(engaged),
                EntityKind::Engagement,
                uuid::Uuid::nil(),
            ))
            .unwrap();
        for amount in liquidations {
            let _ = ledger.append(LedgerEntry::liquidation_validated(
                id,
                LiquidationId::new(),
                Montant::new(amount),
            ));
        }
        for amount in payments {
            let _ = ledger.append(LedgerEntry::payment(id, ReglementId::new(), Montant::new(amount)));
        }

        let totals = ledger.totals().unwrap();
        prop_assert!(totals.total_liquide <= totals.total_engage);
        prop_assert!(totals.total_paye <= totals.total_liquide);
        prop_assert!(!totals.total_paye.is_negative());
    }
}

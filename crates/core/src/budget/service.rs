//! Budget ledger operations triggered by chain transitions.

use sygfp_shared::types::{Montant, MoneyError};
use uuid::Uuid;

use super::error::BudgetError;
use super::impact::{BudgetImpact, compute_impact};
use super::types::{BudgetLine, LedgerEntry};

/// Stateless budget ledger service.
pub struct BudgetService;

impl BudgetService {
    /// Adds a validated liquidation's net amount to the line's liquidated total.
    ///
    /// Returns the updated line and the ledger entry to persist with it.
    pub fn apply_liquidation_validated(
        line: &BudgetLine,
        liquidation_id: impl Into<Uuid>,
        net_a_payer: Montant,
    ) -> Result<(BudgetLine, LedgerEntry), BudgetError> {
        let entry = LedgerEntry::liquidation_validated(line.id, liquidation_id, net_a_payer);
        let updated = line.apply(&entry)?;
        Ok((updated, entry))
    }

    /// Applies any entry produced by a transition.
    pub fn post(line: &BudgetLine, entry: &LedgerEntry) -> Result<BudgetLine, BudgetError> {
        line.apply(entry)
    }

    /// Projects the effect of validating the current liquidation.
    pub fn impact(
        line: &BudgetLine,
        validated_excluding_current: &[Montant],
        net_a_payer_courant: Montant,
    ) -> Result<BudgetImpact, MoneyError> {
        compute_impact(line, validated_excluding_current, net_a_payer_courant)
    }
}

//! Budget line and ledger entry types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sygfp_shared::types::{timestamp, BudgetLineId, LedgerEntryId, Montant, MoneyError};
use uuid::Uuid;

use crate::budget::error::BudgetError;
use crate::workflow::types::EntityKind;

/// Kind of consumption recorded by a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryKind {
    /// Engaged amount.
    Engagement,
    /// Liquidated amount (validated liquidation).
    Liquidation,
    /// Paid amount (registered payment).
    Paiement,
}

impl LedgerEntryKind {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Engagement => "engagement",
            Self::Liquidation => "liquidation",
            Self::Paiement => "paiement",
        }
    }

    /// Parses a ledger entry kind.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "engagement" => Some(Self::Engagement),
            "liquidation" => Some(Self::Liquidation),
            "paiement" => Some(Self::Paiement),
            _ => None,
        }
    }
}

impl fmt::Display for LedgerEntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signed consumption entry on a budget line.
///
/// Positive amounts consume, negative amounts reverse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry ID.
    pub id: LedgerEntryId,
    /// Budget line concerned.
    pub budget_line_id: BudgetLineId,
    /// Counter affected.
    pub kind: LedgerEntryKind,
    /// Signed amount.
    pub montant: Montant,
    /// Entity type that produced the entry.
    pub source_type: EntityKind,
    /// Entity ID that produced the entry.
    pub source_id: Uuid,
    /// When the entry was produced.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Creates an entry stamped now.
    pub fn new(
        budget_line_id: BudgetLineId,
        kind: LedgerEntryKind,
        montant: Montant,
        source_type: EntityKind,
        source_id: impl Into<Uuid>,
    ) -> Self {
        Self {
            id: LedgerEntryId::new(),
            budget_line_id,
            kind,
            montant,
            source_type,
            source_id: source_id.into(),
            created_at: timestamp::now(),
        }
    }

    /// Entry posted when a liquidation completes its validation chain.
    pub fn liquidation_validated(
        budget_line_id: BudgetLineId,
        liquidation_id: impl Into<Uuid>,
        net_a_payer: Montant,
    ) -> Self {
        Self::new(
            budget_line_id,
            LedgerEntryKind::Liquidation,
            net_a_payer,
            EntityKind::Liquidation,
            liquidation_id,
        )
    }

    /// Entry posted when a payment is registered.
    pub fn payment(
        budget_line_id: BudgetLineId,
        reglement_id: impl Into<Uuid>,
        montant: Montant,
    ) -> Self {
        Self::new(
            budget_line_id,
            LedgerEntryKind::Paiement,
            montant,
            EntityKind::Reglement,
            reglement_id,
        )
    }

    /// Entry posted when a payment is cancelled.
    pub fn payment_reversal(
        budget_line_id: BudgetLineId,
        reglement_id: impl Into<Uuid>,
        montant: Montant,
    ) -> Result<Self, MoneyError> {
        Ok(Self::new(
            budget_line_id,
            LedgerEntryKind::Paiement,
            montant.checked_neg()?,
            EntityKind::Reglement,
            reglement_id,
        ))
    }

    /// Returns true if the entry reverses earlier consumption.
    #[must_use]
    pub const fn is_reversal(&self) -> bool {
        self.montant.is_negative()
    }
}

/// Consumption counters of a budget line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    /// Total engaged.
    pub total_engage: Montant,
    /// Total liquidated.
    pub total_liquide: Montant,
    /// Total paid.
    pub total_paye: Montant,
}

impl LedgerTotals {
    /// Folds entries without guards (history may predate the guards).
    pub fn fold<'a, I>(entries: I) -> Result<Self, MoneyError>
    where
        I: IntoIterator<Item = &'a LedgerEntry>,
    {
        entries
            .into_iter()
            .try_fold(Self::default(), |totals, entry| totals.add(entry))
    }

    fn add(self, entry: &LedgerEntry) -> Result<Self, MoneyError> {
        let mut next = self;
        match entry.kind {
            LedgerEntryKind::Engagement => {
                next.total_engage = next.total_engage.checked_add(entry.montant)?;
            }
            LedgerEntryKind::Liquidation => {
                next.total_liquide = next.total_liquide.checked_add(entry.montant)?;
            }
            LedgerEntryKind::Paiement => {
                next.total_paye = next.total_paye.checked_add(entry.montant)?;
            }
        }
        Ok(next)
    }

    /// Applies an entry, refusing any result that breaks
    /// `paye <= liquide <= engage` or goes below zero.
    pub fn apply(self, entry: &LedgerEntry) -> Result<Self, BudgetError> {
        if entry.montant.is_zero() {
            return Err(BudgetError::ZeroAmount);
        }
        let next = self.add(entry)?;

        let counter = match entry.kind {
            LedgerEntryKind::Engagement => ("total_engage", next.total_engage),
            LedgerEntryKind::Liquidation => ("total_liquide", next.total_liquide),
            LedgerEntryKind::Paiement => ("total_paye", next.total_paye),
        };
        if counter.1.is_negative() {
            return Err(BudgetError::NegativeTotal { counter: counter.0 });
        }

        let touches_engaged = matches!(
            entry.kind,
            LedgerEntryKind::Engagement | LedgerEntryKind::Liquidation
        );
        if touches_engaged && next.total_liquide > next.total_engage {
            return Err(BudgetError::ExceedsEngaged {
                engage: next.total_engage,
                liquide: next.total_liquide,
            });
        }

        let touches_liquidated = matches!(
            entry.kind,
            LedgerEntryKind::Liquidation | LedgerEntryKind::Paiement
        );
        if touches_liquidated && next.total_paye > next.total_liquide {
            return Err(BudgetError::ExceedsLiquidated {
                liquide: next.total_liquide,
                paye: next.total_paye,
            });
        }

        Ok(next)
    }
}

/// A budget line with its consumption counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetLine {
    /// Line ID.
    pub id: BudgetLineId,
    /// Budget code.
    pub code: String,
    /// Label.
    pub libelle: String,
    /// Budget year.
    pub exercice: i32,
    /// Initial allocation.
    pub dotation_initiale: Montant,
    /// Transfers received.
    pub virements_entrants: Montant,
    /// Transfers sent.
    pub virements_sortants: Montant,
    /// Consumption counters.
    pub totals: LedgerTotals,
    /// Optimistic lock version.
    pub version: i64,
}

impl BudgetLine {
    /// Current allocation: initial plus transfers in minus transfers out.
    pub fn dotation(&self) -> Result<Montant, MoneyError> {
        self.dotation_initiale
            .checked_add(self.virements_entrants)?
            .checked_sub(self.virements_sortants)
    }

    /// Allocation not yet engaged.
    pub fn disponible(&self) -> Result<Montant, MoneyError> {
        self.dotation()?.checked_sub(self.totals.total_engage)
    }

    /// Applies a ledger entry and bumps the version.
    pub fn apply(&self, entry: &LedgerEntry) -> Result<Self, BudgetError> {
        if entry.budget_line_id != self.id {
            return Err(BudgetError::LineMismatch {
                line: self.id,
                entry: entry.budget_line_id,
            });
        }
        let mut next = self.clone();
        next.totals = self.totals.apply(entry)?;
        next.version += 1;
        Ok(next)
    }
}

//! In-memory budget ledger for one line.
//!
//! The storage layer keeps the same entries in a table and mirrors the totals
//! in counter columns; replaying the table must reproduce the counters.

use sygfp_shared::types::{BudgetLineId, MoneyError};

use crate::budget::error::BudgetError;
use crate::budget::types::{LedgerEntry, LedgerTotals};

/// Append-only list of entries on one budget line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetLedger {
    budget_line_id: BudgetLineId,
    entries: Vec<LedgerEntry>,
}

impl BudgetLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub const fn new(budget_line_id: BudgetLineId) -> Self {
        Self {
            budget_line_id,
            entries: Vec::new(),
        }
    }

    /// Rebuilds a ledger from stored history without re-running the guards.
    pub fn from_entries(
        budget_line_id: BudgetLineId,
        entries: Vec<LedgerEntry>,
    ) -> Result<Self, BudgetError> {
        if let Some(entry) = entries.iter().find(|e| e.budget_line_id != budget_line_id) {
            return Err(BudgetError::LineMismatch {
                line: budget_line_id,
                entry: entry.budget_line_id,
            });
        }
        Ok(Self {
            budget_line_id,
            entries,
        })
    }

    /// The line this ledger belongs to.
    #[must_use]
    pub const fn budget_line_id(&self) -> BudgetLineId {
        self.budget_line_id
    }

    /// Every entry, in append order.
    #[must_use]
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Current totals.
    pub fn totals(&self) -> Result<LedgerTotals, MoneyError> {
        LedgerTotals::fold(&self.entries)
    }

    /// Appends an entry if the guarded totals accept it.
    pub fn append(&mut self, entry: LedgerEntry) -> Result<LedgerTotals, BudgetError> {
        if entry.budget_line_id != self.budget_line_id {
            return Err(BudgetError::LineMismatch {
                line: self.budget_line_id,
                entry: entry.budget_line_id,
            });
        }
        let totals = self.totals()?.apply(&entry)?;
        self.entries.push(entry);
        Ok(totals)
    }
}

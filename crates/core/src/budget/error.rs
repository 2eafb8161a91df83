//! Budget ledger error types.

use sygfp_shared::AppError;
use sygfp_shared::types::{BudgetLineId, Montant, MoneyError};
use thiserror::Error;

/// Budget ledger errors.
#[derive(Debug, Error)]
pub enum BudgetError {
    /// Budget line not found.
    #[error("Budget line not found: {0}")]
    NotFound(BudgetLineId),

    /// The entry would push the liquidated total above the engaged total.
    #[error("Liquidated total {liquide} would exceed engaged total {engage}")]
    ExceedsEngaged {
        /// Engaged total after the entry.
        engage: Montant,
        /// Liquidated total after the entry.
        liquide: Montant,
    },

    /// The entry would push the paid total above the liquidated total.
    #[error("Paid total {paye} would exceed liquidated total {liquide}")]
    ExceedsLiquidated {
        /// Liquidated total after the entry.
        liquide: Montant,
        /// Paid total after the entry.
        paye: Montant,
    },

    /// A reversal would push a counter below zero.
    #[error("Counter {counter} would become negative")]
    NegativeTotal {
        /// Name of the counter.
        counter: &'static str,
    },

    /// Ledger entries must carry a non-zero amount.
    #[error("Ledger entry amount cannot be zero")]
    ZeroAmount,

    /// The entry targets another budget line.
    #[error("Entry targets budget line {entry}, not {line}")]
    LineMismatch {
        /// The line being updated.
        line: BudgetLineId,
        /// The line named by the entry.
        entry: BudgetLineId,
    },

    /// The line changed between read and commit.
    #[error("Concurrent modification of budget line {0}")]
    ConcurrentModification(BudgetLineId),

    /// Money arithmetic failed.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl BudgetError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::ExceedsEngaged { .. }
            | Self::ExceedsLiquidated { .. }
            | Self::NegativeTotal { .. } => 422,
            Self::ZeroAmount | Self::LineMismatch { .. } => 400,
            Self::ConcurrentModification(_) => 409,
            Self::Money(_) | Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "BUDGET_LINE_NOT_FOUND",
            Self::ExceedsEngaged { .. } => "EXCEEDS_ENGAGED",
            Self::ExceedsLiquidated { .. } => "EXCEEDS_LIQUIDATED",
            Self::NegativeTotal { .. } => "NEGATIVE_TOTAL",
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::LineMismatch { .. } => "LINE_MISMATCH",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::Money(_) => "MONEY_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns true if the caller may re-read and re-evaluate automatically.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification(_))
    }
}

impl From<BudgetError> for AppError {
    fn from(err: BudgetError) -> Self {
        let message = err.to_string();
        match err {
            BudgetError::NotFound(_) => Self::NotFound(message),
            BudgetError::ExceedsEngaged { .. }
            | BudgetError::ExceedsLiquidated { .. }
            | BudgetError::NegativeTotal { .. } => Self::BusinessRule(message),
            BudgetError::ZeroAmount | BudgetError::LineMismatch { .. } => {
                Self::Validation(message)
            }
            BudgetError::ConcurrentModification(_) => Self::Conflict(message),
            BudgetError::Money(_) => Self::Internal(message),
            BudgetError::Database(_) => Self::Database(message),
        }
    }
}

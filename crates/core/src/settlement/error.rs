//! Settlement reconciliation error types.

use sygfp_shared::AppError;
use sygfp_shared::types::{Montant, MoneyError, OrdonnancementId, ReglementId};
use thiserror::Error;

use crate::budget::BudgetError;
use crate::workflow::error::Precondition;
use crate::workflow::types::{ActionKind, EntityKind, RoleSet};

/// Errors returned by payment registration, cancellation and bordereaux.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// The actor holds none of the treasury roles.
    #[error("Action {action} requires one of the roles {required}")]
    Unauthorized {
        /// The attempted action.
        action: ActionKind,
        /// Roles allowed to perform it.
        required: RoleSet,
    },

    /// The entity is not in a state that accepts the action.
    #[error("{entity} in status {from} does not accept this action")]
    InvalidState {
        /// The entity type.
        entity: EntityKind,
        /// The current status code.
        from: String,
    },

    /// A motif or signatures are missing.
    #[error("Missing precondition: {0}")]
    MissingPrecondition(Precondition),

    /// The amount is zero or negative.
    #[error("Payment amount must be positive, got {0}")]
    InvalidAmount(Montant),

    /// The payment exceeds the remaining amount of the ordonnancement.
    #[error("Payment {amount} exceeds remaining {remaining}")]
    ExceedsRemaining {
        /// The requested amount.
        amount: Montant,
        /// The remaining amount.
        remaining: Montant,
    },

    /// A cancellation would make the paid total negative.
    #[error("Paid total would become negative ({montant_paye})")]
    NegativeBalance {
        /// The paid total the cancellation would produce.
        montant_paye: Montant,
    },

    /// The movement belongs to another ordonnancement.
    #[error("Reglement {reglement} does not belong to ordonnancement {ordonnancement}")]
    ForeignReglement {
        /// The movement.
        reglement: ReglementId,
        /// The ordonnancement addressed.
        ordonnancement: OrdonnancementId,
    },

    /// A bordereau needs at least one active movement.
    #[error("A bordereau needs at least one active reglement")]
    EmptyBordereau,

    /// A bordereau number is malformed.
    #[error("Invalid bordereau number: {0}")]
    InvalidBordereauNumber(String),

    /// The ordonnancement changed between read and commit.
    #[error("Concurrent modification of ordonnancement {0}")]
    ConcurrentModification(OrdonnancementId),

    /// Entity not found.
    #[error("{entity} {id} not found")]
    NotFound {
        /// The entity type.
        entity: EntityKind,
        /// The entity ID.
        id: uuid::Uuid,
    },

    /// Budget ledger guard failed.
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// Money arithmetic failed.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl SettlementError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized { .. } => 403,
            Self::MissingPrecondition(_)
            | Self::InvalidAmount(_)
            | Self::ForeignReglement { .. }
            | Self::EmptyBordereau
            | Self::InvalidBordereauNumber(_) => 400,
            Self::InvalidState { .. }
            | Self::ExceedsRemaining { .. }
            | Self::NegativeBalance { .. } => 422,
            Self::ConcurrentModification(_) => 409,
            Self::NotFound { .. } => 404,
            Self::Budget(err) => err.status_code(),
            Self::Money(_) | Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::MissingPrecondition(_) => "MISSING_PRECONDITION",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::ExceedsRemaining { .. } => "EXCEEDS_REMAINING",
            Self::NegativeBalance { .. } => "NEGATIVE_BALANCE",
            Self::ForeignReglement { .. } => "FOREIGN_REGLEMENT",
            Self::EmptyBordereau => "EMPTY_BORDEREAU",
            Self::InvalidBordereauNumber(_) => "INVALID_BORDEREAU_NUMBER",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Budget(err) => err.error_code(),
            Self::Money(_) => "MONEY_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns true if the caller may re-read and re-evaluate automatically.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConcurrentModification(_) => true,
            Self::Budget(err) => err.is_retryable(),
            _ => false,
        }
    }
}

impl From<SettlementError> for AppError {
    fn from(err: SettlementError) -> Self {
        let message = err.to_string();
        match err {
            SettlementError::Unauthorized { .. } => Self::Forbidden(message),
            SettlementError::MissingPrecondition(_)
            | SettlementError::InvalidAmount(_)
            | SettlementError::ForeignReglement { .. }
            | SettlementError::EmptyBordereau
            | SettlementError::InvalidBordereauNumber(_) => Self::Validation(message),
            SettlementError::InvalidState { .. }
            | SettlementError::ExceedsRemaining { .. }
            | SettlementError::NegativeBalance { .. } => Self::BusinessRule(message),
            SettlementError::ConcurrentModification(_) => Self::Conflict(message),
            SettlementError::NotFound { .. } => Self::NotFound(message),
            SettlementError::Budget(err) => err.into(),
            SettlementError::Money(_) => Self::Internal(message),
            SettlementError::Database(_) => Self::Database(message),
        }
    }
}

//! Transition error taxonomy for the expenditure chain state machines.
//!
//! Each variant is a distinct, typed reason so the caller can render a
//! precise message. None of them is produced after a partial mutation.

use std::fmt;

use sygfp_shared::AppError;
use sygfp_shared::types::{Montant, MoneyError};
use thiserror::Error;
use uuid::Uuid;

use crate::budget::BudgetError;
use crate::workflow::types::{ActionKind, DocumentType, EntityKind, RoleSet};

/// A precondition that must hold before a transition is allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// A non-blank motif is required (reject, defer).
    Motif,
    /// Required supporting documents are absent.
    Documents(Vec<DocumentType>),
    /// Every required signature must be present.
    Signatures,
    /// The parent entity has not completed its validation.
    ParentNotValidated,
    /// The liquidation carries no urgent-settlement flag.
    NotUrgent,
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Motif => f.write_str("a motif is required"),
            Self::Documents(docs) => {
                let codes: Vec<&str> = docs.iter().map(DocumentType::as_str).collect();
                write!(f, "missing documents: {}", codes.join(", "))
            }
            Self::Signatures => f.write_str("signatures are incomplete"),
            Self::ParentNotValidated => f.write_str("the parent entity is not fully validated"),
            Self::NotUrgent => f.write_str("the liquidation is not marked urgent"),
        }
    }
}

/// Errors returned by a state machine transition.
#[derive(Debug, Error)]
pub enum TransitionError {
    /// The actor holds none of the roles required for the action.
    #[error("Action {action} requires one of the roles {required}")]
    Unauthorized {
        /// The attempted action.
        action: ActionKind,
        /// Roles allowed to perform it.
        required: RoleSet,
    },

    /// The action is not legal from the current status.
    #[error("Action {action} is not allowed on {entity} in status {from}")]
    InvalidState {
        /// The entity type.
        entity: EntityKind,
        /// The attempted action.
        action: ActionKind,
        /// The current status code.
        from: String,
    },

    /// The step addressed is not the current step.
    #[error("Wrong step: expected step {expected}, got {got}")]
    WrongStep {
        /// The current step.
        expected: u8,
        /// The step addressed by the caller.
        got: u8,
    },

    /// A signature was attempted before an earlier one was completed.
    #[error("Signature {order} cannot be applied before signature {pending}")]
    OutOfOrder {
        /// The signature order attempted.
        order: u8,
        /// The first signature still pending.
        pending: u8,
    },

    /// A required motif, document or signature is absent.
    #[error("Missing precondition: {0}")]
    MissingPrecondition(Precondition),

    /// The amount exceeds the remaining authorized amount.
    #[error("Amount {amount} exceeds remaining {remaining}")]
    ExceedsRemaining {
        /// The requested amount.
        amount: Montant,
        /// The remaining amount.
        remaining: Montant,
    },

    /// The amount is zero or negative where a positive amount is required.
    #[error("Invalid amount: {0}")]
    InvalidAmount(Montant),

    /// The entity changed between read and commit.
    #[error("Concurrent modification of {entity} {id}")]
    ConcurrentModification {
        /// The entity type.
        entity: EntityKind,
        /// The entity ID.
        id: Uuid,
    },

    /// Entity not found.
    #[error("{entity} {id} not found")]
    NotFound {
        /// The entity type.
        entity: EntityKind,
        /// The entity ID.
        id: Uuid,
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

impl TransitionError {
    /// Shorthand for a missing-motif error.
    #[must_use]
    pub const fn missing_motif() -> Self {
        Self::MissingPrecondition(Precondition::Motif)
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized { .. } => 403,
            Self::MissingPrecondition(_) | Self::InvalidAmount(_) => 400,
            Self::InvalidState { .. }
            | Self::WrongStep { .. }
            | Self::OutOfOrder { .. }
            | Self::ExceedsRemaining { .. } => 422,
            Self::ConcurrentModification { .. } => 409,
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
            Self::WrongStep { .. } => "WRONG_STEP",
            Self::OutOfOrder { .. } => "OUT_OF_ORDER",
            Self::MissingPrecondition(_) => "MISSING_PRECONDITION",
            Self::ExceedsRemaining { .. } => "EXCEEDS_REMAINING",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
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
            Self::ConcurrentModification { .. } => true,
            Self::Budget(err) => err.is_retryable(),
            _ => false,
        }
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        let message = err.to_string();
        match err {
            TransitionError::Unauthorized { .. } => Self::Forbidden(message),
            TransitionError::MissingPrecondition(_) | TransitionError::InvalidAmount(_) => {
                Self::Validation(message)
            }
            TransitionError::InvalidState { .. }
            | TransitionError::WrongStep { .. }
            | TransitionError::OutOfOrder { .. }
            | TransitionError::ExceedsRemaining { .. } => Self::BusinessRule(message),
            TransitionError::ConcurrentModification { .. } => Self::Conflict(message),
            TransitionError::NotFound { .. } => Self::NotFound(message),
            TransitionError::Budget(err) => err.into(),
            TransitionError::Money(_) => Self::Internal(message),
            TransitionError::Database(_) => Self::Database(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::Role;

    #[test]
    fn test_unauthorized_error() {
        let err = TransitionError::Unauthorized {
            action: ActionKind::ValidateDg,
            required: RoleSet::of(&[Role::Admin, Role::Dg]),
        };
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "UNAUTHORIZED");
        assert!(err.to_string().contains("VALIDATE_DG"));
        assert!(err.to_string().contains("DG"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_invalid_state_error() {
        let err = TransitionError::InvalidState {
            entity: EntityKind::Liquidation,
            action: ActionKind::ValidateDg,
            from: "brouillon".to_string(),
        };
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_code(), "INVALID_STATE");
        assert!(err.to_string().contains("brouillon"));
    }

    #[test]
    fn test_step_errors() {
        let wrong = TransitionError::WrongStep { expected: 1, got: 2 };
        assert_eq!(wrong.error_code(), "WRONG_STEP");
        let order = TransitionError::OutOfOrder { order: 2, pending: 1 };
        assert_eq!(order.error_code(), "OUT_OF_ORDER");
        assert_eq!(order.status_code(), 422);
    }

    #[test]
    fn test_missing_precondition_error() {
        let err = TransitionError::MissingPrecondition(Precondition::Documents(vec![
            DocumentType::Facture,
            DocumentType::BonLivraison,
        ]));
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "MISSING_PRECONDITION");
        assert!(err.to_string().contains("facture, bon_livraison"));
        assert_eq!(
            TransitionError::missing_motif().to_string(),
            "Missing precondition: a motif is required"
        );
    }

    #[test]
    fn test_only_concurrent_modification_is_retryable() {
        let err = TransitionError::ConcurrentModification {
            entity: EntityKind::Ordonnancement,
            id: Uuid::nil(),
        };
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), 409);
        assert!(
            !TransitionError::ExceedsRemaining {
                amount: Montant::new(2),
                remaining: Montant::new(1),
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = TransitionError::missing_motif().into();
        assert_eq!(app.error_code(), "VALIDATION_ERROR");

        let app: AppError = TransitionError::ConcurrentModification {
            entity: EntityKind::Liquidation,
            id: Uuid::nil(),
        }
        .into();
        assert!(app.is_retryable());

        let app: AppError = TransitionError::Unauthorized {
            action: ActionKind::Sign,
            required: RoleSet::of(&[Role::Dg]),
        }
        .into();
        assert_eq!(app.status_code(), 403);
    }
}

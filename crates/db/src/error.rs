//! Repository error type and its conversions into the domain errors.

use sea_orm::DbErr;
use sygfp_core::budget::BudgetError;
use sygfp_core::settlement::SettlementError;
use sygfp_core::workflow::TransitionError;
use thiserror::Error;

use crate::mapping::MappingError;

/// Errors raised while reading or writing rows.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// A stored row does not map to a domain value.
    #[error("Corrupt row: {0}")]
    Mapping(#[from] MappingError),
}

impl From<RepositoryError> for TransitionError {
    fn from(err: RepositoryError) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<RepositoryError> for SettlementError {
    fn from(err: RepositoryError) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<RepositoryError> for BudgetError {
    fn from(err: RepositoryError) -> Self {
        Self::Database(err.to_string())
    }
}

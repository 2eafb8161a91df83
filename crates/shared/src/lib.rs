//! Shared types, errors, and configuration for SYGFP.
//!
//! This crate provides common types used across all other crates:
//! - `Montant`, an exact integer amount in minor currency units
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Configuration management (database and workflow circuits)

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, StepConfig, WorkflowConfig};
pub use error::{AppError, AppResult};

//! Workflow primitives shared by every state machine of the expenditure chain.
//!
//! # Modules
//!
//! - `types` - Roles, actors, action kinds, documents, rejection and deferral stamps
//! - `error` - The transition error taxonomy
//! - `authz` - Static authorization matrices and the gate function
//! - `circuit` - Ordered role-gated step circuits

pub mod authz;
pub mod circuit;
pub mod error;
pub mod types;

#[cfg(test)]
mod authz_props;

pub use authz::{AuthorizationMatrix, Gate, TransitionRule};
pub use circuit::{Circuit, CircuitError, CircuitStep};
pub use error::{Precondition, TransitionError};
pub use types::{
    ActionKind, Actor, Attachments, Deferral, DocumentType, EntityKind, Rejection, Role, RoleSet,
    non_empty_motif,
};

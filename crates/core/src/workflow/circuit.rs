//! Ordered, role-gated step circuits (validation and signature).

use sygfp_shared::StepConfig;
use thiserror::Error;

use crate::workflow::types::Role;

/// Errors raised while building a circuit from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitError {
    /// The circuit has no step.
    #[error("Circuit must contain at least one step")]
    Empty,

    /// Step orders are not contiguous from 1.
    #[error("Circuit step orders must be contiguous from 1, found {found} at position {position}")]
    NonContiguous {
        /// 1-based position in the sorted list.
        position: usize,
        /// The order found at that position.
        found: u8,
    },

    /// A step names an unknown role.
    #[error("Unknown role in circuit: {0}")]
    UnknownRole(String),
}

impl From<CircuitError> for sygfp_shared::AppError {
    fn from(err: CircuitError) -> Self {
        Self::Config(err.to_string())
    }
}

/// One step of a circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitStep {
    /// 1-based order.
    pub order: u8,
    /// Role allowed to act on this step.
    pub role: Role,
    /// Display label.
    pub label: String,
}

impl CircuitStep {
    /// Creates a step.
    pub fn new(order: u8, role: Role, label: impl Into<String>) -> Self {
        Self {
            order,
            role,
            label: label.into(),
        }
    }
}

/// A validated circuit: non-empty, orders `1..=n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Circuit {
    steps: Vec<CircuitStep>,
}

impl Circuit {
    /// Builds a circuit, sorting steps by order.
    pub fn new(mut steps: Vec<CircuitStep>) -> Result<Self, CircuitError> {
        if steps.is_empty() {
            return Err(CircuitError::Empty);
        }
        steps.sort_by_key(|step| step.order);
        for (index, step) in steps.iter().enumerate() {
            let position = index + 1;
            if usize::from(step.order) != position {
                return Err(CircuitError::NonContiguous {
                    position,
                    found: step.order,
                });
            }
        }
        Ok(Self { steps })
    }

    /// Builds a circuit from configured steps.
    pub fn from_config(steps: &[StepConfig]) -> Result<Self, CircuitError> {
        let steps = steps
            .iter()
            .map(|step| {
                Role::parse(&step.role)
                    .map(|role| CircuitStep::new(step.order, role, step.label.clone()))
                    .ok_or_else(|| CircuitError::UnknownRole(step.role.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(steps)
    }

    /// The two-step DAAF then DG validation circuit.
    #[must_use]
    pub fn default_validation() -> Self {
        Self {
            steps: vec![
                CircuitStep::new(1, Role::Daaf, "Directeur Administratif et Financier"),
                CircuitStep::new(2, Role::Dg, "Directeur Général"),
            ],
        }
    }

    /// The two-step DAAF then DG signature circuit.
    #[must_use]
    pub fn default_signature() -> Self {
        Self {
            steps: vec![
                CircuitStep::new(1, Role::Daaf, "Directeur Administratif et Financier"),
                CircuitStep::new(2, Role::Dg, "Directeur Général (Ordonnateur)"),
            ],
        }
    }

    /// All steps, in order.
    #[must_use]
    pub fn steps(&self) -> &[CircuitStep] {
        &self.steps
    }

    /// The step with the given order.
    #[must_use]
    pub fn step(&self, order: u8) -> Option<&CircuitStep> {
        self.steps.iter().find(|step| step.order == order)
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for a validated circuit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The order of the last step.
    #[must_use]
    pub fn last_order(&self) -> u8 {
        self.steps.last().map_or(0, |step| step.order)
    }

    /// Returns true if `order` is the last step.
    #[must_use]
    pub fn is_last(&self, order: u8) -> bool {
        order == self.last_order()
    }
}

//! Authorization matrix: `(entity, action, from status) -> gate`.
//!
//! Every state machine owns a static table of the transitions it accepts.
//! A single gate function answers both questions a caller asks before a
//! transition: is the action legal from this status, and may this actor
//! perform it.

use std::fmt;

use sygfp_shared::types::UserId;

use crate::workflow::error::TransitionError;
use crate::workflow::types::{ActionKind, Actor, EntityKind, RoleSet};

/// Who may fire a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Any actor holding one of the roles.
    Roles(RoleSet),
    /// The entity's author, or any actor holding one of the roles.
    AuthorOr(RoleSet),
    /// The role assigned to the current circuit step; checked by the machine.
    Circuit,
}

/// One row of an authorization matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule<S: 'static> {
    /// The action.
    pub action: ActionKind,
    /// The status the action is legal from.
    pub from: S,
    /// Who may fire it.
    pub gate: Gate,
}

impl<S> TransitionRule<S> {
    /// Creates a rule.
    pub const fn new(action: ActionKind, from: S, gate: Gate) -> Self {
        Self { action, from, gate }
    }
}

/// A static authorization table for one entity type.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationMatrix<S: 'static> {
    entity: EntityKind,
    rules: &'static [TransitionRule<S>],
}

impl<S> AuthorizationMatrix<S>
where
    S: Copy + PartialEq + fmt::Display,
{
    /// Creates a matrix over a static rule table.
    pub const fn new(entity: EntityKind, rules: &'static [TransitionRule<S>]) -> Self {
        Self { entity, rules }
    }

    /// The entity type this matrix governs.
    #[must_use]
    pub const fn entity(&self) -> EntityKind {
        self.entity
    }

    /// Every rule in the table.
    #[must_use]
    pub const fn rules(&self) -> &'static [TransitionRule<S>] {
        self.rules
    }

    /// Finds the rule for `action` from `from`, if any.
    #[must_use]
    pub fn rule(&self, action: ActionKind, from: S) -> Option<&'static TransitionRule<S>> {
        self.rules
            .iter()
            .find(|rule| rule.action == action && rule.from == from)
    }

    /// Checks that `action` is legal from `from` and that `actor` may fire it.
    ///
    /// Fails `InvalidState` when no row matches, `Unauthorized` when a row
    /// matches but its gate rejects the actor. A `Circuit` gate always passes
    /// here; the machine checks the step role itself.
    pub fn authorize(
        &self,
        action: ActionKind,
        from: S,
        actor: &Actor,
        author: Option<UserId>,
    ) -> Result<&'static TransitionRule<S>, TransitionError> {
        let rule = self
            .rule(action, from)
            .ok_or_else(|| TransitionError::InvalidState {
                entity: self.entity,
                action,
                from: from.to_string(),
            })?;

        let allowed = match rule.gate {
            Gate::Roles(roles) => actor.has_any_role(roles),
            Gate::AuthorOr(roles) => {
                author == Some(actor.user_id) || actor.has_any_role(roles)
            }
            Gate::Circuit => true,
        };

        if allowed {
            Ok(rule)
        } else {
            let required = match rule.gate {
                Gate::Roles(roles) | Gate::AuthorOr(roles) => roles,
                Gate::Circuit => RoleSet::EMPTY,
            };
            Err(TransitionError::Unauthorized { action, required })
        }
    }

    /// Actions the actor may attempt from `from`.
    #[must_use]
    pub fn available_actions(
        &self,
        from: S,
        actor: &Actor,
        author: Option<UserId>,
    ) -> Vec<ActionKind> {
        self.rules
            .iter()
            .filter(|rule| rule.from == from)
            .filter(|rule| self.authorize(rule.action, from, actor, author).is_ok())
            .map(|rule| rule.action)
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::workflow::types::Role;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) enum Door {
        Closed,
        Open,
    }

    impl fmt::Display for Door {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(match self {
                Self::Closed => "closed",
                Self::Open => "open",
            })
        }
    }

    pub(crate) const OPENERS: RoleSet = RoleSet::of(&[Role::Admin, Role::Daaf]);

    const DOOR_RULES: &[TransitionRule<Door>] = &[
        TransitionRule::new(ActionKind::Submit, Door::Closed, Gate::Roles(OPENERS)),
        TransitionRule::new(ActionKind::Resume, Door::Open, Gate::AuthorOr(OPENERS)),
        TransitionRule::new(ActionKind::ValidateStep, Door::Open, Gate::Circuit),
    ];

    pub(crate) const DOOR_MATRIX: AuthorizationMatrix<Door> =
        AuthorizationMatrix::new(EntityKind::Engagement, DOOR_RULES);

    #[test]
    fn test_no_rule_is_invalid_state() {
        let actor = Actor::new(UserId::new(), [Role::Admin]);
        let err = DOOR_MATRIX
            .authorize(ActionKind::Submit, Door::Open, &actor, None)
            .unwrap_err();
        match err {
            TransitionError::InvalidState { entity, action, from } => {
                assert_eq!(entity, EntityKind::Engagement);
                assert_eq!(action, ActionKind::Submit);
                assert_eq!(from, "open");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_role_mismatch_is_unauthorized() {
        let actor = Actor::new(UserId::new(), [Role::Agent]);
        let err = DOOR_MATRIX
            .authorize(ActionKind::Submit, Door::Closed, &actor, None)
            .unwrap_err();
        assert!(matches!(
            err,
            TransitionError::Unauthorized { required, .. } if required == OPENERS
        ));
    }

    #[test]
    fn test_author_gate_accepts_author_without_role() {
        let actor = Actor::new(UserId::new(), [Role::Agent]);
        assert!(
            DOOR_MATRIX
                .authorize(ActionKind::Resume, Door::Open, &actor, Some(actor.user_id))
                .is_ok()
        );
        assert!(
            DOOR_MATRIX
                .authorize(ActionKind::Resume, Door::Open, &actor, Some(UserId::new()))
                .is_err()
        );
    }

    #[test]
    fn test_circuit_gate_defers_to_machine() {
        let actor = Actor::new(UserId::new(), [Role::Agent]);
        assert!(
            DOOR_MATRIX
                .authorize(ActionKind::ValidateStep, Door::Open, &actor, None)
                .is_ok()
        );
    }

    #[test]
    fn test_available_actions() {
        let daaf = Actor::new(UserId::new(), [Role::Daaf]);
        assert_eq!(
            DOOR_MATRIX.available_actions(Door::Closed, &daaf, None),
            vec![ActionKind::Submit]
        );
        let agent = Actor::new(UserId::new(), [Role::Agent]);
        assert_eq!(
            DOOR_MATRIX.available_actions(Door::Open, &agent, None),
            vec![ActionKind::ValidateStep]
        );
    }
}

//! Property-based tests for the authorization gate.

use proptest::prelude::*;
use sygfp_shared::types::UserId;

use crate::workflow::authz::tests::{DOOR_MATRIX, Door, OPENERS};
use crate::workflow::error::TransitionError;
use crate::workflow::types::{ActionKind, Actor, Role};

fn arb_role() -> impl Strategy<Value = Role> {
    proptest::sample::select(Role::ALL.to_vec())
}

fn arb_roles() -> impl Strategy<Value = Vec<Role>> {
    proptest::collection::vec(arb_role(), 0..4)
}

fn arb_action() -> impl Strategy<Value = ActionKind> {
    prop_oneof![
        Just(ActionKind::Submit),
        Just(ActionKind::Resume),
        Just(ActionKind::ValidateStep),
        Just(ActionKind::Sign),
    ]
}

fn arb_door() -> impl Strategy<Value = Door> {
    prop_oneof![Just(Door::Closed), Just(Door::Open)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// An actor without any of the gate's roles is always refused.
    #[test]
    fn prop_role_gating(roles in arb_roles()) {
        let actor = Actor::new(UserId::new(), roles);
        let result = DOOR_MATRIX.authorize(ActionKind::Submit, Door::Closed, &actor, None);
        if actor.has_any_role(OPENERS) {
            prop_assert!(result.is_ok());
        } else {
            let is_unauthorized = matches!(result, Err(TransitionError::Unauthorized { .. }));
            prop_assert!(is_unauthorized);
        }
    }

    /// A missing row is reported as InvalidState whatever the actor holds.
    #[test]
    fn prop_missing_row_is_invalid_state(
        roles in arb_roles(),
        action in arb_action(),
        door in arb_door(),
    ) {
        let actor = Actor::new(UserId::new(), roles);
        if DOOR_MATRIX.rule(action, door).is_none() {
            let result = DOOR_MATRIX.authorize(action, door, &actor, Some(actor.user_id));
            let is_invalid_state = matches!(result, Err(TransitionError::InvalidState { .. }));
            prop_assert!(is_invalid_state);
        }
    }
}

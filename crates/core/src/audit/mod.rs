//! Immutable audit records.
//!
//! Every accepted transition yields exactly one record carrying the old and
//! new snapshots. The record is built here and persisted by the storage layer
//! in the same database transaction as the state change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sygfp_shared::types::{timestamp, AuditEventId, UserId};
use uuid::Uuid;

use crate::workflow::types::{ActionKind, Actor, EntityKind};

/// One audit trail entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Record ID.
    pub id: AuditEventId,
    /// Entity type concerned.
    pub entity_type: EntityKind,
    /// Entity ID concerned.
    pub entity_id: Uuid,
    /// Action performed.
    pub action: ActionKind,
    /// Who performed it.
    pub actor_id: UserId,
    /// Snapshot before the action (`None` on creation).
    pub old_values: Option<Value>,
    /// Snapshot after the action.
    pub new_values: Option<Value>,
    /// Motif given with the action (reject, defer, cancel).
    pub motif: Option<String>,
    /// When the action happened.
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Attaches a motif.
    #[must_use]
    pub fn with_motif(mut self, motif: impl Into<String>) -> Self {
        self.motif = Some(motif.into());
        self
    }

    /// Top-level keys whose values differ between the two snapshots.
    #[must_use]
    pub fn changed_fields(&self) -> Vec<String> {
        let empty = serde_json::Map::new();
        let old = self
            .old_values
            .as_ref()
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        let new = self
            .new_values
            .as_ref()
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        let mut keys: Vec<String> = old
            .keys()
            .chain(new.keys())
            .filter(|key| old.get(*key) != new.get(*key))
            .cloned()
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

/// Builds audit records.
pub struct AuditEmitter;

impl AuditEmitter {
    /// Builds a record stamped now.
    pub fn emit(
        entity_type: EntityKind,
        entity_id: impl Into<Uuid>,
        action: ActionKind,
        actor: &Actor,
        old_values: Option<Value>,
        new_values: Option<Value>,
    ) -> AuditRecord {
        AuditRecord {
            id: AuditEventId::new(),
            entity_type,
            entity_id: entity_id.into(),
            action,
            actor_id: actor.user_id,
            old_values,
            new_values,
            motif: None,
            created_at: timestamp::now(),
        }
    }
}

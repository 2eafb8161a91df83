//! Audit sink: append-only `audit_logs` rows written inside the caller's
//! transaction.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use sygfp_core::audit::AuditRecord;
use sygfp_core::workflow::EntityKind;
use uuid::Uuid;

use crate::entities::audit_logs;
use crate::error::RepositoryError;
use crate::mapping;

/// Audit log repository.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    db: DatabaseConnection,
}

impl AuditRepository {
    /// Creates a new audit repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records an audit event outside any transition (manual entries, imports).
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn record(&self, record: &AuditRecord) -> Result<(), RepositoryError> {
        record_in(&self.db, record).await
    }

    /// Lists the audit trail of one entity, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt.
    pub async fn list_for_entity(
        &self,
        entity_type: EntityKind,
        entity_id: Uuid,
    ) -> Result<Vec<AuditRecord>, RepositoryError> {
        let models = audit_logs::Entity::find()
            .filter(audit_logs::Column::EntityType.eq(entity_type.as_str()))
            .filter(audit_logs::Column::EntityId.eq(entity_id))
            .order_by_asc(audit_logs::Column::CreatedAt)
            .order_by_asc(audit_logs::Column::Id)
            .all(&self.db)
            .await?;

        models
            .into_iter()
            .map(|model| mapping::audit_record(model).map_err(RepositoryError::from))
            .collect()
    }
}

/// Inserts an audit record on `conn` (usually an open transaction).
pub(crate) async fn record_in<C: ConnectionTrait>(
    conn: &C,
    record: &AuditRecord,
) -> Result<(), RepositoryError> {
    mapping::audit_active(record).insert(conn).await?;
    tracing::debug!(
        entity_type = %record.entity_type,
        entity_id = %record.entity_id,
        action = %record.action,
        actor_id = %record.actor_id,
        "audit record stored"
    );
    Ok(())
}

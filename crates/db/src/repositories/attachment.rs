//! Attachment presence lookups used as transition preconditions.
//!
//! Files live in the document store; this table only records which
//! document types exist for an entity.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};
use sygfp_core::workflow::{Attachments, DocumentType, EntityKind};
use sygfp_shared::types::{timestamp, UserId};
use uuid::Uuid;

use crate::entities::attachments;
use crate::error::RepositoryError;
use crate::mapping;

/// Attachment repository.
#[derive(Debug, Clone)]
pub struct AttachmentRepository {
    db: DatabaseConnection,
}

impl AttachmentRepository {
    /// Creates a new attachment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records that a document of `document_type` exists for the entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn add(
        &self,
        entity_type: EntityKind,
        entity_id: Uuid,
        document_type: DocumentType,
        file_name: &str,
        uploaded_by: UserId,
    ) -> Result<Uuid, RepositoryError> {
        let id = Uuid::now_v7();
        attachments::ActiveModel {
            id: Set(id),
            entity_type: Set(entity_type.as_str().to_string()),
            entity_id: Set(entity_id),
            document_type: Set(document_type.as_str().to_string()),
            file_name: Set(file_name.to_string()),
            uploaded_by: Set(uploaded_by.into_inner()),
            created_at: Set(timestamp::now().into()),
        }
        .insert(&self.db)
        .await?;
        Ok(id)
    }

    /// Document types present for the entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a type is unknown.
    pub async fn documents(
        &self,
        entity_type: EntityKind,
        entity_id: Uuid,
    ) -> Result<Attachments, RepositoryError> {
        documents_in(&self.db, entity_type, entity_id).await
    }

    /// Returns true if a document of `document_type` exists for the entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a type is unknown.
    pub async fn exists(
        &self,
        entity_type: EntityKind,
        entity_id: Uuid,
        document_type: DocumentType,
    ) -> Result<bool, RepositoryError> {
        Ok(self
            .documents(entity_type, entity_id)
            .await?
            .contains(document_type))
    }
}

pub(crate) async fn documents_in<C: ConnectionTrait>(
    conn: &C,
    entity_type: EntityKind,
    entity_id: Uuid,
) -> Result<Attachments, RepositoryError> {
    let models = attachments::Entity::find()
        .filter(attachments::Column::EntityType.eq(entity_type.as_str()))
        .filter(attachments::Column::EntityId.eq(entity_id))
        .all(conn)
        .await?;

    models
        .iter()
        .map(|model| mapping::document_type(&model.document_type).map_err(RepositoryError::from))
        .collect()
}

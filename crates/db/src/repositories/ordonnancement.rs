//! Ordonnancement repository: creation, validation steps and signatures.
//!
//! The header row is updated under optimistic versioning; step and
//! signature rows are rewritten in the same transaction whenever the
//! machine changed them.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use sygfp_core::ordonnancement::{
    NewOrdonnancement, Ordonnancement, OrdonnancementAction, OrdonnancementMachine,
    OrdonnancementStatus, OrdonnancementTransition,
};
use sygfp_core::workflow::{Actor, EntityKind, TransitionError};
use sygfp_shared::types::{LiquidationId, Montant, OrdonnancementId};

use crate::entities::{ordonnancement_signatures, ordonnancement_steps, ordonnancements};
use crate::error::RepositoryError;
use crate::mapping;
use crate::repositories::{audit, liquidation};

/// Ordonnancement repository.
#[derive(Debug, Clone)]
pub struct OrdonnancementRepository {
    db: DatabaseConnection,
    machine: OrdonnancementMachine,
}

impl OrdonnancementRepository {
    /// Creates a new ordonnancement repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, machine: OrdonnancementMachine) -> Self {
        Self { db, machine }
    }

    /// Reads an ordonnancement with its steps and signatures.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if it does not exist.
    pub async fn find(&self, id: OrdonnancementId) -> Result<Ordonnancement, TransitionError> {
        load(&self.db, id).await?.ok_or(TransitionError::NotFound {
            entity: EntityKind::Ordonnancement,
            id: id.into_inner(),
        })
    }

    /// Creates a draft ordonnancement on a fully validated liquidation.
    ///
    /// # Errors
    ///
    /// Returns an error if the liquidation is unknown or not validated, or
    /// the amount exceeds what remains to be ordered on it.
    pub async fn create(
        &self,
        liquidation_id: LiquidationId,
        input: NewOrdonnancement,
        actor: &Actor,
    ) -> Result<Ordonnancement, TransitionError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| TransitionError::Database(e.to_string()))?;

        // Creations on one liquidation serialize on its row, so the sibling
        // sum below cannot be stale when the insert commits.
        let parent = liquidation::lock(&txn, liquidation_id).await?;
        let siblings: Vec<i64> = ordonnancements::Entity::find()
            .select_only()
            .column(ordonnancements::Column::Montant)
            .filter(ordonnancements::Column::LiquidationId.eq(liquidation_id.into_inner()))
            .filter(ordonnancements::Column::Statut.ne(OrdonnancementStatus::Rejete.as_str()))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(|e| TransitionError::Database(e.to_string()))?;
        let siblings: Vec<Montant> = siblings.into_iter().map(Montant::new).collect();

        let transition = self.machine.create(input, &parent, &siblings, actor)?;
        mapping::ordonnancement_active(&transition.ordonnancement)
            .insert(&txn)
            .await
            .map_err(|e| TransitionError::Database(e.to_string()))?;
        audit::record_in(&txn, &transition.audit).await?;
        txn.commit()
            .await
            .map_err(|e| TransitionError::Database(e.to_string()))?;

        tracing::info!(
            ordonnancement_id = %transition.ordonnancement.id,
            liquidation_id = %liquidation_id,
            montant = %transition.ordonnancement.montant,
            "ordonnancement created"
        );
        Ok(transition.ordonnancement)
    }

    /// Applies `action` and commits header, steps, signatures and audit
    /// record together.
    ///
    /// # Errors
    ///
    /// Returns the machine's refusal, or `ConcurrentModification` when the
    /// row changed since it was read.
    pub async fn transition(
        &self,
        id: OrdonnancementId,
        action: OrdonnancementAction,
        actor: &Actor,
    ) -> Result<OrdonnancementTransition, TransitionError> {
        let current = self.find(id).await?;
        let kind = action.kind();

        let transition = match self.machine.transition(&current, action, actor) {
            Ok(transition) => transition,
            Err(err) => {
                tracing::warn!(
                    ordonnancement_id = %id,
                    action = %kind,
                    from = %current.status,
                    error_code = err.error_code(),
                    "ordonnancement transition refused"
                );
                return Err(err);
            }
        };
        let next = &transition.ordonnancement;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| TransitionError::Database(e.to_string()))?;

        let updated = ordonnancements::Entity::update_many()
            .set(mapping::ordonnancement_active(next))
            .filter(ordonnancements::Column::Id.eq(id.into_inner()))
            .filter(ordonnancements::Column::Version.eq(current.version))
            .exec(&txn)
            .await
            .map_err(|e| TransitionError::Database(e.to_string()))?;
        if updated.rows_affected == 0 {
            tracing::warn!(ordonnancement_id = %id, action = %kind, "ordonnancement lost a concurrent update");
            return Err(TransitionError::ConcurrentModification {
                entity: EntityKind::Ordonnancement,
                id: id.into_inner(),
            });
        }

        if next.steps != current.steps {
            replace_steps(&txn, next).await?;
        }
        if next.signatures != current.signatures {
            replace_signatures(&txn, next).await?;
        }
        audit::record_in(&txn, &transition.audit).await?;
        txn.commit()
            .await
            .map_err(|e| TransitionError::Database(e.to_string()))?;

        tracing::info!(
            ordonnancement_id = %id,
            action = %kind,
            from = %current.status,
            to = %next.status,
            step = next.current_step,
            "ordonnancement transition committed"
        );
        Ok(transition)
    }
}

/// Reads an ordonnancement with its step and signature rows on `conn`.
pub(crate) async fn load<C: ConnectionTrait>(
    conn: &C,
    id: OrdonnancementId,
) -> Result<Option<Ordonnancement>, RepositoryError> {
    let Some(model) = ordonnancements::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await?
    else {
        return Ok(None);
    };
    let steps = ordonnancement_steps::Entity::find()
        .filter(ordonnancement_steps::Column::OrdonnancementId.eq(id.into_inner()))
        .order_by_asc(ordonnancement_steps::Column::StepOrder)
        .all(conn)
        .await?;
    let signatures = ordonnancement_signatures::Entity::find()
        .filter(ordonnancement_signatures::Column::OrdonnancementId.eq(id.into_inner()))
        .order_by_asc(ordonnancement_signatures::Column::SignatureOrder)
        .all(conn)
        .await?;
    Ok(Some(mapping::ordonnancement(model, steps, signatures)?))
}

async fn replace_steps<C: ConnectionTrait>(
    conn: &C,
    ordonnancement: &Ordonnancement,
) -> Result<(), RepositoryError> {
    ordonnancement_steps::Entity::delete_many()
        .filter(ordonnancement_steps::Column::OrdonnancementId.eq(ordonnancement.id.into_inner()))
        .exec(conn)
        .await?;
    if !ordonnancement.steps.is_empty() {
        ordonnancement_steps::Entity::insert_many(
            ordonnancement
                .steps
                .iter()
                .map(|step| mapping::step_active(ordonnancement.id, step)),
        )
        .exec(conn)
        .await?;
    }
    Ok(())
}

async fn replace_signatures<C: ConnectionTrait>(
    conn: &C,
    ordonnancement: &Ordonnancement,
) -> Result<(), RepositoryError> {
    ordonnancement_signatures::Entity::delete_many()
        .filter(
            ordonnancement_signatures::Column::OrdonnancementId.eq(ordonnancement.id.into_inner()),
        )
        .exec(conn)
        .await?;
    if !ordonnancement.signatures.is_empty() {
        ordonnancement_signatures::Entity::insert_many(
            ordonnancement
                .signatures
                .iter()
                .map(|slot| mapping::signature_active(ordonnancement.id, slot)),
        )
        .exec(conn)
        .await?;
    }
    Ok(())
}

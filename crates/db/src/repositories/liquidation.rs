//! Liquidation repository: creation, state transitions and the
//! urgent-settlement queue.
//!
//! A transition is evaluated by [`LiquidationMachine`] against the row as
//! read, then committed with `UPDATE ... WHERE version = <read version>`.
//! If another request committed in between, no row matches and the caller
//! gets `ConcurrentModification`, which it may retry after re-reading.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use sygfp_core::budget::{EngagementProgress, EngagementSnapshot};
use sygfp_core::liquidation::{
    Liquidation, LiquidationAction, LiquidationAmounts, LiquidationMachine, LiquidationStatus,
    LiquidationTransition, NewLiquidation,
};
use sygfp_core::workflow::{ActionKind, Actor, EntityKind, TransitionError};
use sygfp_shared::types::{BudgetLineId, EngagementId, LiquidationId, Montant};

use crate::entities::{engagements, liquidations};
use crate::mapping;
use crate::repositories::{attachment, audit, budget_ledger};

/// Input for a new liquidation.
#[derive(Debug, Clone)]
pub struct CreateLiquidationInput {
    /// Human-readable number.
    pub numero: String,
    /// Parent engagement.
    pub engagement_id: EngagementId,
    /// Monetary breakdown.
    pub amounts: LiquidationAmounts,
    /// Supplier invoice reference.
    pub reference_facture: Option<String>,
}

/// Liquidation repository.
#[derive(Debug, Clone)]
pub struct LiquidationRepository {
    db: DatabaseConnection,
    machine: LiquidationMachine,
}

impl LiquidationRepository {
    /// Creates a new liquidation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, machine: LiquidationMachine) -> Self {
        Self { db, machine }
    }

    /// Reads a liquidation.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if it does not exist.
    pub async fn find(&self, id: LiquidationId) -> Result<Liquidation, TransitionError> {
        load(&self.db, id).await
    }

    /// Liquidations flagged for urgent settlement on a budget line, most
    /// recently flagged first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt.
    pub async fn urgent(
        &self,
        budget_line_id: BudgetLineId,
    ) -> Result<Vec<Liquidation>, TransitionError> {
        liquidations::Entity::find()
            .filter(liquidations::Column::BudgetLineId.eq(budget_line_id.into_inner()))
            .filter(liquidations::Column::ReglementUrgent.eq(true))
            .order_by_desc(liquidations::Column::UrgenceDate)
            .all(&self.db)
            .await
            .map_err(|e| TransitionError::Database(e.to_string()))?
            .into_iter()
            .map(|model| {
                mapping::liquidation(model).map_err(|e| TransitionError::Database(e.to_string()))
            })
            .collect()
    }

    /// Progress of an engagement: engaged amount against its non-rejected
    /// liquidations.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the engagement does not exist.
    pub async fn engagement_progress(
        &self,
        engagement_id: EngagementId,
    ) -> Result<EngagementProgress, TransitionError> {
        let engagement = load_engagement(&self.db, engagement_id).await?;
        progress(&self.db, engagement_id, engagement.montant).await
    }

    /// Creates a draft liquidation against a validated engagement.
    ///
    /// # Errors
    ///
    /// Returns an error if the engagement is unknown or not validated, the
    /// actor may not create, or the amount exceeds the restant à liquider.
    pub async fn create(
        &self,
        input: CreateLiquidationInput,
        actor: &Actor,
    ) -> Result<Liquidation, TransitionError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| TransitionError::Database(e.to_string()))?;

        // Creations on one engagement serialize on its row, so the sibling
        // sum below cannot be stale when the insert commits.
        let engagement = lock_engagement(&txn, input.engagement_id).await?;
        let progress = progress(&txn, input.engagement_id, engagement.montant).await?;
        let transition = self.machine.create(
            NewLiquidation {
                numero: input.numero,
                engagement,
                amounts: input.amounts,
                reference_facture: input.reference_facture,
            },
            &progress,
            actor,
        )?;

        mapping::liquidation_active(&transition.liquidation)
            .insert(&txn)
            .await
            .map_err(|e| TransitionError::Database(e.to_string()))?;
        audit::record_in(&txn, &transition.audit).await?;
        txn.commit()
            .await
            .map_err(|e| TransitionError::Database(e.to_string()))?;

        tracing::info!(
            liquidation_id = %transition.liquidation.id,
            engagement_id = %transition.liquidation.engagement_id,
            net_a_payer = %transition.liquidation.amounts.net_a_payer,
            "liquidation created"
        );
        Ok(transition.liquidation)
    }

    /// Applies `action` and commits status, ledger entry and audit record
    /// together.
    ///
    /// # Errors
    ///
    /// Returns the machine's refusal, a ledger guard failure, or
    /// `ConcurrentModification` when the row changed since it was read.
    pub async fn transition(
        &self,
        id: LiquidationId,
        action: LiquidationAction,
        actor: &Actor,
    ) -> Result<LiquidationTransition, TransitionError> {
        let current = load(&self.db, id).await?;
        let documents =
            attachment::documents_in(&self.db, EntityKind::Liquidation, id.into_inner()).await?;
        let kind = action.kind();

        let transition = match self.machine.transition(&current, action, actor, &documents) {
            Ok(transition) => transition,
            Err(err) => {
                tracing::warn!(
                    liquidation_id = %id,
                    action = %kind,
                    from = %current.status,
                    error_code = err.error_code(),
                    "liquidation transition refused"
                );
                return Err(err);
            }
        };

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| TransitionError::Database(e.to_string()))?;

        let updated = liquidations::Entity::update_many()
            .set(mapping::liquidation_active(&transition.liquidation))
            .filter(liquidations::Column::Id.eq(id.into_inner()))
            .filter(liquidations::Column::Version.eq(current.version))
            .exec(&txn)
            .await
            .map_err(|e| TransitionError::Database(e.to_string()))?;
        if updated.rows_affected == 0 {
            tracing::warn!(liquidation_id = %id, action = %kind, "liquidation lost a concurrent update");
            return Err(TransitionError::ConcurrentModification {
                entity: EntityKind::Liquidation,
                id: id.into_inner(),
            });
        }

        if let Some(entry) = &transition.ledger_effect {
            budget_ledger::post_entry(&txn, entry).await?;
        }
        audit::record_in(&txn, &transition.audit).await?;
        txn.commit()
            .await
            .map_err(|e| TransitionError::Database(e.to_string()))?;

        tracing::info!(
            liquidation_id = %id,
            action = %kind,
            from = %current.status,
            to = %transition.liquidation.status,
            step = transition.liquidation.current_step,
            ledger = transition.ledger_effect.is_some(),
            "liquidation transition committed"
        );
        Ok(transition)
    }

    /// Actions `actor` may attempt on the liquidation.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if it does not exist.
    pub async fn available_actions(
        &self,
        id: LiquidationId,
        actor: &Actor,
    ) -> Result<Vec<ActionKind>, TransitionError> {
        let current = load(&self.db, id).await?;
        Ok(self.machine.available_actions(&current, actor))
    }
}

/// Reads a liquidation on `conn`.
pub(crate) async fn load<C: ConnectionTrait>(
    conn: &C,
    id: LiquidationId,
) -> Result<Liquidation, TransitionError> {
    let model = liquidations::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await
        .map_err(|e| TransitionError::Database(e.to_string()))?;
    liquidation_found(model, id)
}

/// Reads a liquidation with `SELECT ... FOR UPDATE`; the row stays locked
/// until the transaction behind `conn` ends.
pub(crate) async fn lock<C: ConnectionTrait>(
    conn: &C,
    id: LiquidationId,
) -> Result<Liquidation, TransitionError> {
    let model = liquidations::Entity::find_by_id(id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(|e| TransitionError::Database(e.to_string()))?;
    liquidation_found(model, id)
}

fn liquidation_found(
    model: Option<liquidations::Model>,
    id: LiquidationId,
) -> Result<Liquidation, TransitionError> {
    let model = model.ok_or(TransitionError::NotFound {
        entity: EntityKind::Liquidation,
        id: id.into_inner(),
    })?;
    mapping::liquidation(model).map_err(|e| TransitionError::Database(e.to_string()))
}

async fn load_engagement<C: ConnectionTrait>(
    conn: &C,
    id: EngagementId,
) -> Result<EngagementSnapshot, TransitionError> {
    let model = engagements::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await
        .map_err(|e| TransitionError::Database(e.to_string()))?;
    engagement_found(model, id)
}

async fn lock_engagement<C: ConnectionTrait>(
    conn: &C,
    id: EngagementId,
) -> Result<EngagementSnapshot, TransitionError> {
    let model = engagements::Entity::find_by_id(id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(|e| TransitionError::Database(e.to_string()))?;
    engagement_found(model, id)
}

fn engagement_found(
    model: Option<engagements::Model>,
    id: EngagementId,
) -> Result<EngagementSnapshot, TransitionError> {
    let model = model.ok_or(TransitionError::NotFound {
        entity: EntityKind::Engagement,
        id: id.into_inner(),
    })?;
    mapping::engagement(model).map_err(|e| TransitionError::Database(e.to_string()))
}

async fn progress<C: ConnectionTrait>(
    conn: &C,
    engagement_id: EngagementId,
    montant_engage: Montant,
) -> Result<EngagementProgress, TransitionError> {
    let siblings: Vec<i64> = liquidations::Entity::find()
        .select_only()
        .column(liquidations::Column::MontantTtc)
        .filter(liquidations::Column::EngagementId.eq(engagement_id.into_inner()))
        .filter(liquidations::Column::Statut.ne(LiquidationStatus::Rejete.as_str()))
        .into_tuple()
        .all(conn)
        .await
        .map_err(|e| TransitionError::Database(e.to_string()))?;
    let siblings: Vec<Montant> = siblings.into_iter().map(Montant::new).collect();
    Ok(EngagementProgress::compute(montant_engage, &siblings)?)
}

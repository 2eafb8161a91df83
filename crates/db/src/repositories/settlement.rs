//! Settlement repository: payment registration and cancellation.
//!
//! `montant_paye` is moved only by the conditional updates below, so two
//! concurrent partial payments cannot jointly overshoot the ceiling: the
//! second one re-evaluates the `WHERE` clause against the committed value
//! of the first.

use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    QueryFilter, QueryOrder, Statement, TransactionTrait,
};
use sygfp_core::ordonnancement::Ordonnancement;
use sygfp_core::settlement::{
    Bordereau, BordereauNumber, NewPayment, PaymentCancellation, PaymentOutcome, Reglement,
    ReglementStatus, SettlementError, SettlementService, SettlementSummary, settlement_status,
};
use sygfp_core::workflow::{Actor, EntityKind};
use sygfp_shared::types::{timestamp, Montant, OrdonnancementId, ReglementId};
use uuid::Uuid;

use crate::entities::{bordereau_reglements, bordereaux, reglements};
use crate::error::RepositoryError;
use crate::mapping;
use crate::repositories::{audit, budget_ledger, ordonnancement};

const REGISTER_PAYMENT_SQL: &str = r"
UPDATE ordonnancements
SET montant_paye = montant_paye + $1, version = version + 1, updated_at = now()
WHERE id = $2
  AND montant_paye + $1 <= montant
  AND statut IN ('valide', 'transmis')
  AND EXISTS (
      SELECT 1 FROM ordonnancement_signatures s WHERE s.ordonnancement_id = $2
  )
  AND NOT EXISTS (
      SELECT 1 FROM ordonnancement_signatures s
      WHERE s.ordonnancement_id = $2 AND s.signed_by IS NULL
  )
";

const NEXT_BORDEREAU_SQL: &str = r"
INSERT INTO bordereau_sequences (exercice, last_sequence)
VALUES ($1, 1)
ON CONFLICT (exercice)
DO UPDATE SET last_sequence = bordereau_sequences.last_sequence + 1
RETURNING last_sequence
";

const CANCEL_PAYMENT_SQL: &str = r"
UPDATE ordonnancements
SET montant_paye = montant_paye - $1, version = version + 1, updated_at = now()
WHERE id = $2
  AND montant_paye - $1 >= 0
";

/// Settlement repository.
#[derive(Debug, Clone)]
pub struct SettlementRepository {
    db: DatabaseConnection,
}

impl SettlementRepository {
    /// Creates a new settlement repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Registers a payment movement on an ordonnancement.
    ///
    /// # Errors
    ///
    /// Returns `ExceedsRemaining` when the amount is above what remains to
    /// pay at commit time, `MissingPrecondition` when a signature is no
    /// longer in place, or the service's refusal.
    pub async fn register_payment(
        &self,
        ordonnancement_id: OrdonnancementId,
        input: NewPayment,
        actor: &Actor,
    ) -> Result<PaymentOutcome, SettlementError> {
        let current = find_ordonnancement(&self.db, ordonnancement_id).await?;
        let mut outcome = match SettlementService::register_payment(&current, input, actor) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(
                    ordonnancement_id = %ordonnancement_id,
                    montant_paye = %current.montant_paye,
                    error_code = err.error_code(),
                    "payment refused"
                );
                return Err(err);
            }
        };
        let montant = outcome.reglement.montant;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| SettlementError::Database(e.to_string()))?;

        let result = txn
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                REGISTER_PAYMENT_SQL,
                [montant.minor_units().into(), ordonnancement_id.into_inner().into()],
            ))
            .await
            .map_err(|e| SettlementError::Database(e.to_string()))?;
        if result.rows_affected() == 0 {
            let latest = find_ordonnancement(&txn, ordonnancement_id).await?;
            if let Err(err) = SettlementService::check_payable(&latest) {
                tracing::warn!(
                    ordonnancement_id = %ordonnancement_id,
                    statut = %latest.status,
                    error_code = err.error_code(),
                    "ordonnancement no longer payable"
                );
                return Err(err);
            }
            let remaining = latest.restant()?.max(Montant::ZERO);
            tracing::warn!(
                ordonnancement_id = %ordonnancement_id,
                montant = %montant,
                remaining = %remaining,
                "payment lost the race for the ceiling"
            );
            return Err(if montant > remaining {
                SettlementError::ExceedsRemaining {
                    amount: montant,
                    remaining,
                }
            } else {
                SettlementError::ConcurrentModification(ordonnancement_id)
            });
        }

        mapping::reglement_active(&outcome.reglement)
            .insert(&txn)
            .await
            .map_err(|e| SettlementError::Database(e.to_string()))?;
        budget_ledger::post_entry(&txn, &outcome.ledger_effect).await?;
        audit::record_in(&txn, &outcome.audit).await?;

        let committed = find_ordonnancement(&txn, ordonnancement_id).await?;
        txn.commit()
            .await
            .map_err(|e| SettlementError::Database(e.to_string()))?;

        outcome.status = settlement_status(&committed);
        outcome.ordonnancement = committed;
        tracing::info!(
            ordonnancement_id = %ordonnancement_id,
            reglement_id = %outcome.reglement.id,
            montant = %montant,
            montant_paye = %outcome.ordonnancement.montant_paye,
            status = %outcome.status,
            "payment registered"
        );
        Ok(outcome)
    }

    /// Cancels a registered payment; the movement is kept as `rejete`.
    ///
    /// # Errors
    ///
    /// Returns the service's refusal, or `ConcurrentModification` when the
    /// movement was cancelled by another request first.
    pub async fn cancel_payment(
        &self,
        reglement_id: ReglementId,
        cancellation: PaymentCancellation,
        actor: &Actor,
    ) -> Result<PaymentOutcome, SettlementError> {
        let reglement = find_reglement(&self.db, reglement_id).await?;
        let current = find_ordonnancement(&self.db, reglement.ordonnancement_id).await?;
        let mut outcome =
            SettlementService::cancel_payment(&current, &reglement, cancellation, actor)?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| SettlementError::Database(e.to_string()))?;

        let rejected = reglements::Entity::update_many()
            .set(mapping::reglement_active(&outcome.reglement))
            .filter(reglements::Column::Id.eq(reglement_id.into_inner()))
            .filter(reglements::Column::Statut.eq(ReglementStatus::Enregistre.as_str()))
            .exec(&txn)
            .await
            .map_err(|e| SettlementError::Database(e.to_string()))?;
        if rejected.rows_affected == 0 {
            return Err(SettlementError::ConcurrentModification(current.id));
        }

        let result = txn
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                CANCEL_PAYMENT_SQL,
                [
                    reglement.montant.minor_units().into(),
                    current.id.into_inner().into(),
                ],
            ))
            .await
            .map_err(|e| SettlementError::Database(e.to_string()))?;
        if result.rows_affected() == 0 {
            let latest = find_ordonnancement(&txn, current.id).await?;
            return Err(SettlementError::NegativeBalance {
                montant_paye: latest.montant_paye.checked_sub(reglement.montant)?,
            });
        }

        budget_ledger::post_entry(&txn, &outcome.ledger_effect).await?;
        audit::record_in(&txn, &outcome.audit).await?;
        let committed = find_ordonnancement(&txn, current.id).await?;
        txn.commit()
            .await
            .map_err(|e| SettlementError::Database(e.to_string()))?;

        outcome.status = settlement_status(&committed);
        outcome.ordonnancement = committed;
        tracing::info!(
            ordonnancement_id = %current.id,
            reglement_id = %reglement_id,
            montant = %reglement.montant,
            montant_paye = %outcome.ordonnancement.montant_paye,
            "payment cancelled"
        );
        Ok(outcome)
    }

    /// Movements of an ordonnancement, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt.
    pub async fn reglements(
        &self,
        ordonnancement_id: OrdonnancementId,
    ) -> Result<Vec<Reglement>, SettlementError> {
        let models = reglements::Entity::find()
            .filter(reglements::Column::OrdonnancementId.eq(ordonnancement_id.into_inner()))
            .order_by_asc(reglements::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| SettlementError::Database(e.to_string()))?;
        models
            .into_iter()
            .map(|model| mapping::reglement(model).map_err(|e| SettlementError::Database(e.to_string())))
            .collect()
    }

    /// Payment position of an ordonnancement.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the ordonnancement does not exist.
    pub async fn summary(
        &self,
        ordonnancement_id: OrdonnancementId,
    ) -> Result<SettlementSummary, SettlementError> {
        let ordonnancement = find_ordonnancement(&self.db, ordonnancement_id).await?;
        let reglements = self.reglements(ordonnancement_id).await?;
        Ok(SettlementSummary::compute(&ordonnancement, &reglements)?)
    }

    /// Builds and stores a bordereau over the selected movements, in
    /// selection order.
    ///
    /// The number is the next sequence of `exercice`; a refused batch
    /// leaves the sequence untouched.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown movement, `EmptyBordereau` when
    /// no selected movement is active, and `InvalidBordereauNumber` once
    /// the year has used its 9999 numbers.
    pub async fn bordereau(
        &self,
        exercice: u16,
        selection: &[ReglementId],
        actor: &Actor,
    ) -> Result<Bordereau, SettlementError> {
        let ids: Vec<Uuid> = selection.iter().map(|id| id.into_inner()).collect();
        let models = reglements::Entity::find()
            .filter(reglements::Column::Id.is_in(ids))
            .all(&self.db)
            .await
            .map_err(|e| SettlementError::Database(e.to_string()))?;
        let mut by_id = HashMap::with_capacity(models.len());
        for model in models {
            let reglement =
                mapping::reglement(model).map_err(|e| SettlementError::Database(e.to_string()))?;
            by_id.insert(reglement.id, reglement);
        }

        let ordered = selection
            .iter()
            .map(|id| {
                by_id.get(id).cloned().ok_or(SettlementError::NotFound {
                    entity: EntityKind::Reglement,
                    id: id.into_inner(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| SettlementError::Database(e.to_string()))?;

        // The counter row stays locked until commit, so batches of one
        // exercice are numbered one after the other.
        let row = txn
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                NEXT_BORDEREAU_SQL,
                [i32::from(exercice).into()],
            ))
            .await
            .map_err(|e| SettlementError::Database(e.to_string()))?
            .ok_or_else(|| SettlementError::Database("no bordereau sequence returned".into()))?;
        let sequence: i64 = row
            .try_get("", "last_sequence")
            .map_err(|e| SettlementError::Database(e.to_string()))?;

        let numero = BordereauNumber::allocated(exercice, sequence)?;
        let bordereau = Bordereau::aggregate(numero, &ordered)?;

        let id = Uuid::now_v7();
        mapping::bordereau_active(id, &bordereau, actor.user_id, timestamp::now())
            .insert(&txn)
            .await
            .map_err(|e| SettlementError::Database(e.to_string()))?;
        bordereau_reglements::Entity::insert_many(mapping::bordereau_links(id, &bordereau))
            .exec(&txn)
            .await
            .map_err(|e| SettlementError::Database(e.to_string()))?;
        txn.commit()
            .await
            .map_err(|e| SettlementError::Database(e.to_string()))?;

        tracing::info!(
            numero = %bordereau.numero,
            reglements = bordereau.reglements.len(),
            excluded = bordereau.excluded.len(),
            total = %bordereau.total,
            "bordereau recorded"
        );
        Ok(bordereau)
    }

    /// Loads a stored bordereau by number.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt.
    pub async fn find_bordereau(
        &self,
        numero: BordereauNumber,
    ) -> Result<Option<Bordereau>, SettlementError> {
        let found = bordereaux::Entity::find()
            .filter(bordereaux::Column::Numero.eq(numero.to_string()))
            .find_with_related(bordereau_reglements::Entity)
            .all(&self.db)
            .await
            .map_err(|e| SettlementError::Database(e.to_string()))?
            .into_iter()
            .next();
        found
            .map(|(model, links)| mapping::bordereau(model, links))
            .transpose()
            .map_err(|e| RepositoryError::from(e).into())
    }
}

async fn find_ordonnancement<C: ConnectionTrait>(
    conn: &C,
    id: OrdonnancementId,
) -> Result<Ordonnancement, SettlementError> {
    ordonnancement::load(conn, id)
        .await?
        .ok_or(SettlementError::NotFound {
            entity: EntityKind::Ordonnancement,
            id: id.into_inner(),
        })
}

async fn find_reglement<C: ConnectionTrait>(
    conn: &C,
    id: ReglementId,
) -> Result<Reglement, SettlementError> {
    let model = reglements::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await
        .map_err(RepositoryError::from)?
        .ok_or(SettlementError::NotFound {
            entity: EntityKind::Reglement,
            id: id.into_inner(),
        })?;
    mapping::reglement(model).map_err(|e| RepositoryError::from(e).into())
}

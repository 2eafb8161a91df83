//! Budget ledger repository.
//!
//! Each posting inserts a `budget_ledger_entries` row and moves the
//! matching counter of `budget_lines` with one conditional `UPDATE`. The
//! guard lives in the `WHERE` clause, so two concurrent validations on the
//! same line are serialized by the row lock and neither update is lost.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Statement, TransactionTrait,
};
use sygfp_core::budget::{
    BudgetError, BudgetImpact, BudgetLine, BudgetService, LedgerEntry, LedgerEntryKind,
    LedgerTotals,
};
use sygfp_core::liquidation::Liquidation;
use sygfp_shared::types::{BudgetLineId, LiquidationId, Montant};
use uuid::Uuid;

use crate::entities::{budget_ledger_entries, budget_lines, liquidations};
use crate::mapping;

const POST_ENGAGEMENT_SQL: &str = r"
UPDATE budget_lines
SET total_engage = total_engage + $1, version = version + 1, updated_at = now()
WHERE id = $2
  AND total_engage + $1 >= 0
  AND total_liquide <= total_engage + $1
";

const POST_LIQUIDATION_SQL: &str = r"
UPDATE budget_lines
SET total_liquide = total_liquide + $1, version = version + 1, updated_at = now()
WHERE id = $2
  AND total_liquide + $1 >= 0
  AND total_liquide + $1 <= total_engage
  AND total_paye <= total_liquide + $1
";

const POST_PAIEMENT_SQL: &str = r"
UPDATE budget_lines
SET total_paye = total_paye + $1, version = version + 1, updated_at = now()
WHERE id = $2
  AND total_paye + $1 >= 0
  AND total_paye + $1 <= total_liquide
";

/// Budget ledger repository.
#[derive(Debug, Clone)]
pub struct BudgetLedgerRepository {
    db: DatabaseConnection,
}

impl BudgetLedgerRepository {
    /// Creates a new budget ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts a budget line.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_line(&self, line: &BudgetLine) -> Result<BudgetLine, BudgetError> {
        let model = mapping::budget_line_active(line)
            .insert(&self.db)
            .await
            .map_err(|e| BudgetError::Database(e.to_string()))?;
        Ok(mapping::budget_line(model))
    }

    /// Reads a budget line with its current counters.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the line does not exist.
    pub async fn find_line(&self, id: BudgetLineId) -> Result<BudgetLine, BudgetError> {
        load_line(&self.db, id).await
    }

    /// Posts any ledger entry in its own transaction.
    ///
    /// # Errors
    ///
    /// Returns the guard that refused the entry, or `ConcurrentModification`
    /// when the line changed between the conditional update and the re-read.
    pub async fn post(&self, entry: &LedgerEntry) -> Result<BudgetLine, BudgetError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| BudgetError::Database(e.to_string()))?;
        post_entry(&txn, entry).await?;
        let line = load_line(&txn, entry.budget_line_id).await?;
        txn.commit()
            .await
            .map_err(|e| BudgetError::Database(e.to_string()))?;
        Ok(line)
    }

    /// Adds a validated liquidation's net amount to the line's liquidated total.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is unknown or the posting would push
    /// `total_liquide` above `total_engage`.
    pub async fn apply_liquidation_validated(
        &self,
        budget_line_id: BudgetLineId,
        liquidation_id: LiquidationId,
        net_a_payer: Montant,
    ) -> Result<BudgetLine, BudgetError> {
        let entry = LedgerEntry::liquidation_validated(budget_line_id, liquidation_id, net_a_payer);
        self.post(&entry).await
    }

    /// Ledger entries of a line, in posting order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt.
    pub async fn entries(&self, id: BudgetLineId) -> Result<Vec<LedgerEntry>, BudgetError> {
        let models = budget_ledger_entries::Entity::find()
            .filter(budget_ledger_entries::Column::BudgetLineId.eq(id.into_inner()))
            .order_by_asc(budget_ledger_entries::Column::CreatedAt)
            .order_by_asc(budget_ledger_entries::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| BudgetError::Database(e.to_string()))?;

        models
            .into_iter()
            .map(|model| {
                mapping::ledger_entry(model).map_err(|e| BudgetError::Database(e.to_string()))
            })
            .collect()
    }

    /// Totals recomputed from the entries, for reconciliation against the
    /// counter columns.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the fold overflows.
    pub async fn replay_totals(&self, id: BudgetLineId) -> Result<LedgerTotals, BudgetError> {
        let entries = self.entries(id).await?;
        Ok(LedgerTotals::fold(&entries)?)
    }

    /// Projects the consumption of the line if `liquidation` were validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is unknown or the query fails.
    pub async fn impact(&self, liquidation: &Liquidation) -> Result<BudgetImpact, BudgetError> {
        let line = load_line(&self.db, liquidation.budget_line_id).await?;
        let validated: Vec<i64> = liquidations::Entity::find()
            .select_only()
            .column(liquidations::Column::NetAPayer)
            .filter(liquidations::Column::BudgetLineId.eq(liquidation.budget_line_id.into_inner()))
            .filter(liquidations::Column::ValidatedAt.is_not_null())
            .filter(liquidations::Column::Id.ne(liquidation.id.into_inner()))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| BudgetError::Database(e.to_string()))?;
        let validated: Vec<Montant> = validated.into_iter().map(Montant::new).collect();

        Ok(BudgetService::impact(
            &line,
            &validated,
            liquidation.amounts.net_a_payer,
        )?)
    }
}

/// Reads a budget line on `conn`.
pub(crate) async fn load_line<C: ConnectionTrait>(
    conn: &C,
    id: BudgetLineId,
) -> Result<BudgetLine, BudgetError> {
    budget_lines::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await
        .map_err(|e| BudgetError::Database(e.to_string()))?
        .map(mapping::budget_line)
        .ok_or(BudgetError::NotFound(id))
}

/// Posts `entry` on `conn`: conditional counter increment, then the entry row.
///
/// When the conditional update matches no row, the line is re-read and the
/// domain guard is evaluated against it to report the precise refusal.
pub(crate) async fn post_entry<C: ConnectionTrait>(
    conn: &C,
    entry: &LedgerEntry,
) -> Result<(), BudgetError> {
    if entry.montant.is_zero() {
        return Err(BudgetError::ZeroAmount);
    }
    let sql = match entry.kind {
        LedgerEntryKind::Engagement => POST_ENGAGEMENT_SQL,
        LedgerEntryKind::Liquidation => POST_LIQUIDATION_SQL,
        LedgerEntryKind::Paiement => POST_PAIEMENT_SQL,
    };
    let line_id: Uuid = entry.budget_line_id.into_inner();
    let result = conn
        .execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [entry.montant.minor_units().into(), line_id.into()],
        ))
        .await
        .map_err(|e| BudgetError::Database(e.to_string()))?;

    if result.rows_affected() == 0 {
        let line = load_line(conn, entry.budget_line_id).await?;
        let refusal = match line.totals.apply(entry) {
            Err(err) => err,
            Ok(_) => BudgetError::ConcurrentModification(entry.budget_line_id),
        };
        tracing::warn!(
            budget_line_id = %entry.budget_line_id,
            kind = %entry.kind,
            montant = %entry.montant,
            error = %refusal,
            "ledger posting refused"
        );
        return Err(refusal);
    }

    mapping::ledger_entry_active(entry)
        .insert(conn)
        .await
        .map_err(|e| BudgetError::Database(e.to_string()))?;

    tracing::info!(
        budget_line_id = %entry.budget_line_id,
        kind = %entry.kind,
        montant = %entry.montant,
        source_type = %entry.source_type,
        source_id = %entry.source_id,
        "ledger entry posted"
    );
    Ok(())
}


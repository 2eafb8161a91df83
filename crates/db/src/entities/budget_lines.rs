//! `SeaORM` Entity for budget_lines table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub code: String,
    pub libelle: String,
    pub exercice: i32,
    pub dotation_initiale: i64,
    pub virements_entrants: i64,
    pub virements_sortants: i64,
    pub total_engage: i64,
    pub total_liquide: i64,
    pub total_paye: i64,
    pub version: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::budget_ledger_entries::Entity")]
    BudgetLedgerEntries,
    #[sea_orm(has_many = "super::engagements::Entity")]
    Engagements,
}

impl Related<super::budget_ledger_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetLedgerEntries.def()
    }
}

impl Related<super::engagements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Engagements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

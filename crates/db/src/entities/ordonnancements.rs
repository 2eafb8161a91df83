//! `SeaORM` Entity for ordonnancements table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "ordonnancements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub numero: String,
    pub liquidation_id: Uuid,
    pub budget_line_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub objet: String,
    pub beneficiaire: String,
    pub montant: i64,
    pub montant_paye: i64,
    pub mode_paiement: String,
    pub banque: Option<String>,
    pub rib: Option<String>,
    pub date_prevue_paiement: Option<Date>,
    pub statut: String,
    pub current_step: i16,
    #[sea_orm(column_type = "Text", nullable)]
    pub motif_rejet: Option<String>,
    pub rejected_by: Option<Uuid>,
    pub rejected_at: Option<DateTimeWithTimeZone>,
    pub rejected_step: Option<i16>,
    #[sea_orm(column_type = "Text", nullable)]
    pub motif_differe: Option<String>,
    pub deferred_by: Option<Uuid>,
    pub deferred_at: Option<DateTimeWithTimeZone>,
    pub date_reprise: Option<Date>,
    pub deferred_step: Option<i16>,
    pub transmitted_at: Option<DateTimeWithTimeZone>,
    pub created_by: Uuid,
    pub version: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::liquidations::Entity",
        from = "Column::LiquidationId",
        to = "super::liquidations::Column::Id"
    )]
    Liquidations,
    #[sea_orm(has_many = "super::ordonnancement_steps::Entity")]
    OrdonnancementSteps,
    #[sea_orm(has_many = "super::ordonnancement_signatures::Entity")]
    OrdonnancementSignatures,
    #[sea_orm(has_many = "super::reglements::Entity")]
    Reglements,
}

impl Related<super::liquidations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Liquidations.def()
    }
}

impl Related<super::ordonnancement_steps::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrdonnancementSteps.def()
    }
}

impl Related<super::ordonnancement_signatures::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrdonnancementSignatures.def()
    }
}

impl Related<super::reglements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reglements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

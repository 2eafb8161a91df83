//! `SeaORM` Entity for liquidations table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "liquidations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub numero: String,
    pub engagement_id: Uuid,
    pub budget_line_id: Uuid,
    pub montant_ht: i64,
    pub tva_montant: i64,
    pub montant_ttc: i64,
    pub airsi: i64,
    pub retenue_source: i64,
    pub bic: i64,
    pub bnc: i64,
    pub penalites: i64,
    pub total_retenues: i64,
    pub net_a_payer: i64,
    pub reference_facture: Option<String>,
    pub statut: String,
    pub current_step: i16,
    pub created_by: Uuid,
    pub certified_by: Option<Uuid>,
    pub certified_at: Option<DateTimeWithTimeZone>,
    pub submitted_at: Option<DateTimeWithTimeZone>,
    pub daaf_validated_by: Option<Uuid>,
    pub daaf_validated_at: Option<DateTimeWithTimeZone>,
    pub validated_by: Option<Uuid>,
    pub validated_at: Option<DateTimeWithTimeZone>,
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
    pub reglement_urgent: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub urgence_motif: Option<String>,
    pub urgence_date: Option<DateTimeWithTimeZone>,
    pub urgence_par: Option<Uuid>,
    pub version: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::engagements::Entity",
        from = "Column::EngagementId",
        to = "super::engagements::Column::Id"
    )]
    Engagements,
    #[sea_orm(has_many = "super::ordonnancements::Entity")]
    Ordonnancements,
}

impl Related<super::engagements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Engagements.def()
    }
}

impl Related<super::ordonnancements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ordonnancements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

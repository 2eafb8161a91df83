//! `SeaORM` Entity for reglements table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "reglements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub numero: String,
    pub ordonnancement_id: Uuid,
    pub budget_line_id: Uuid,
    pub montant: i64,
    pub mode_paiement: String,
    pub reference: Option<String>,
    pub compte_bancaire: Option<String>,
    pub date_paiement: Date,
    pub statut: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub motif_rejet: Option<String>,
    pub renvoi: Option<String>,
    pub rejected_by: Option<Uuid>,
    pub rejected_at: Option<DateTimeWithTimeZone>,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ordonnancements::Entity",
        from = "Column::OrdonnancementId",
        to = "super::ordonnancements::Column::Id"
    )]
    Ordonnancements,
}

impl Related<super::ordonnancements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ordonnancements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! `SeaORM` Entity for ordonnancement_signatures table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "ordonnancement_signatures")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub ordonnancement_id: Uuid,
    pub signature_order: i16,
    pub role: String,
    pub label: String,
    pub signed_by: Option<Uuid>,
    pub signed_at: Option<DateTimeWithTimeZone>,
    pub signature_hash: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ordonnancements::Entity",
        from = "Column::OrdonnancementId",
        to = "super::ordonnancements::Column::Id",
        on_delete = "Cascade"
    )]
    Ordonnancements,
}

impl Related<super::ordonnancements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ordonnancements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! `SeaORM` Entity for bordereaux table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "bordereaux")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub numero: String,
    pub exercice: i32,
    pub sequence: i32,
    pub total: i64,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bordereau_reglements::Entity")]
    BordereauReglements,
}

impl Related<super::bordereau_reglements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BordereauReglements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! `SeaORM` Entity for bordereau_reglements table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "bordereau_reglements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub bordereau_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub reglement_id: Uuid,
    pub position: i32,
    pub excluded: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bordereaux::Entity",
        from = "Column::BordereauId",
        to = "super::bordereaux::Column::Id",
        on_delete = "Cascade"
    )]
    Bordereaux,
    #[sea_orm(
        belongs_to = "super::reglements::Entity",
        from = "Column::ReglementId",
        to = "super::reglements::Column::Id"
    )]
    Reglements,
}

impl Related<super::bordereaux::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bordereaux.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

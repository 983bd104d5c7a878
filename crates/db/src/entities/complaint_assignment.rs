//! Complaint assignment entity - tracks which officials a complaint is assigned to.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "complaint_assignment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub complaint_id: String,

    #[sea_orm(primary_key, auto_increment = false)]
    pub official_id: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::complaint::Entity",
        from = "Column::ComplaintId",
        to = "super::complaint::Column::Id",
        on_delete = "Cascade"
    )]
    Complaint,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OfficialId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Official,
}

impl Related<super::complaint::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Complaint.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Official.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

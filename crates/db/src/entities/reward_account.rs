//! Reward account entity - the per-user reward ledger.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per user. Mutated only by the complaint lifecycle engine.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reward_account")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,

    /// Reward balance, credited on approval/resolution, debited on spam crossings
    #[sea_orm(default_value = 0)]
    pub points: i32,

    /// Cumulative count of spam-marked submissions. Only ever increases.
    #[sea_orm(default_value = 0)]
    pub spam_count: i32,

    /// Contribution tally, reset to zero when the account freezes
    #[sea_orm(default_value = 0)]
    pub contributions: i32,

    /// Freeze flag; the effective state is computed against `freeze_until`
    #[sea_orm(default_value = false)]
    pub frozen: bool,

    /// Date the freeze lapses. Checked lazily, never swept.
    #[sea_orm(nullable)]
    pub freeze_until: Option<Date>,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

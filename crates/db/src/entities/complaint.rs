//! Complaint entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Review state of a complaint.
///
/// A complaint is in exactly one state. Transitions are validated by
/// [`ComplaintStatus::can_transition`]; anything outside that table is
/// rejected by the lifecycle engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ComplaintStatus {
    /// Filed by a citizen, awaiting triage.
    #[sea_orm(string_value = "filed")]
    Filed,
    /// Declined or ignored by an official.
    #[sea_orm(string_value = "declined")]
    Declined,
    /// Marked spam; the record is tombstoned.
    #[sea_orm(string_value = "spam")]
    Spam,
    /// Approved as genuine; filer credited.
    #[sea_orm(string_value = "verified")]
    Verified,
    /// Resolved by official action; filer credited.
    #[sea_orm(string_value = "resolved")]
    Resolved,
    /// Settled after verification.
    #[sea_orm(string_value = "settled")]
    Settled,
}

impl Default for ComplaintStatus {
    fn default() -> Self {
        Self::Filed
    }
}

impl ComplaintStatus {
    /// Whether a transition from `self` to `next` is allowed.
    ///
    /// `Filed` fans out to every terminal-ish state; only `Verified`
    /// complaints may be settled, and resolution is reachable from either.
    #[must_use]
    pub fn can_transition(self, next: Self) -> bool {
        match self {
            Self::Filed => matches!(
                next,
                Self::Declined | Self::Spam | Self::Verified | Self::Resolved
            ),
            Self::Verified => matches!(next, Self::Settled | Self::Resolved),
            Self::Declined | Self::Spam | Self::Resolved | Self::Settled => false,
        }
    }

    /// Human-readable status label shown to filers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Filed => "Filed",
            Self::Declined => "Declined",
            Self::Spam => "Spam",
            Self::Verified => "Verified",
            Self::Resolved => "Resolved",
            Self::Settled => "Solved",
        }
    }

    /// Whether this state marks the end of the review lifecycle.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Declined | Self::Spam | Self::Resolved | Self::Settled)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "complaint")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Reference number; the first 8 chars are quoted in messages
    #[sea_orm(unique)]
    pub token: String,

    /// The citizen who filed the complaint
    pub filer_id: String,

    /// Department currently responsible, set by forwarding
    #[sea_orm(nullable)]
    pub department_id: Option<String>,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub body: String,

    /// Free-form location description
    #[sea_orm(nullable)]
    pub location: Option<String>,

    pub status: ComplaintStatus,

    /// Progress reports are triaged on a separate dashboard
    #[sea_orm(default_value = false)]
    pub progress_report: bool,

    /// An official travelled to the site; doubles the resolution reward
    #[sea_orm(default_value = false)]
    pub was_travelled: bool,

    /// Tombstone set when the complaint is spam-marked
    #[sea_orm(nullable)]
    pub deleted_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FilerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Filer,

    #[sea_orm(
        belongs_to = "super::department::Entity",
        from = "Column::DepartmentId",
        to = "super::department::Column::Id",
        on_delete = "SetNull"
    )]
    Department,

    #[sea_orm(has_many = "super::complaint_assignment::Entity")]
    Assignments,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Filer.def()
    }
}

impl Related<super::department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl Related<super::complaint_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filed_fan_out() {
        assert!(ComplaintStatus::Filed.can_transition(ComplaintStatus::Declined));
        assert!(ComplaintStatus::Filed.can_transition(ComplaintStatus::Spam));
        assert!(ComplaintStatus::Filed.can_transition(ComplaintStatus::Verified));
        assert!(ComplaintStatus::Filed.can_transition(ComplaintStatus::Resolved));
        assert!(!ComplaintStatus::Filed.can_transition(ComplaintStatus::Settled));
    }

    #[test]
    fn test_settle_requires_verified() {
        assert!(ComplaintStatus::Verified.can_transition(ComplaintStatus::Settled));
        assert!(!ComplaintStatus::Resolved.can_transition(ComplaintStatus::Settled));
        assert!(!ComplaintStatus::Declined.can_transition(ComplaintStatus::Settled));
    }

    #[test]
    fn test_terminal_states_are_dead_ends() {
        for terminal in [
            ComplaintStatus::Declined,
            ComplaintStatus::Spam,
            ComplaintStatus::Resolved,
            ComplaintStatus::Settled,
        ] {
            assert!(terminal.is_terminal());
            for next in [
                ComplaintStatus::Filed,
                ComplaintStatus::Declined,
                ComplaintStatus::Spam,
                ComplaintStatus::Verified,
                ComplaintStatus::Resolved,
                ComplaintStatus::Settled,
            ] {
                assert!(!terminal.can_transition(next));
            }
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(ComplaintStatus::Verified.label(), "Verified");
        assert_eq!(ComplaintStatus::Settled.label(), "Solved");
    }
}

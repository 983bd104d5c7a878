//! Complaint repository.

use std::sync::Arc;

use crate::entities::{
    Complaint, ComplaintAssignment, complaint, complaint::ComplaintStatus, complaint_assignment,
};
use civica_common::{AppError, AppResult};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order,
    QueryFilter, QueryOrder, Set,
};

/// Complaint repository for database operations.
///
/// Plain reads go through the pooled connection; mutations that take part in
/// a lifecycle transition are associated functions generic over
/// [`ConnectionTrait`] so the engine can drive them inside one transaction.
#[derive(Clone)]
pub struct ComplaintRepository {
    db: Arc<DatabaseConnection>,
}

impl ComplaintRepository {
    /// Create a new complaint repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a complaint by ID, tombstoned or not.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<complaint::Model>> {
        Complaint::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a live (non-tombstoned) complaint by ID, or `ComplaintNotFound`.
    pub async fn get_active_by_id(&self, id: &str) -> AppResult<complaint::Model> {
        Complaint::find_by_id(id)
            .filter(complaint::Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::ComplaintNotFound(id.to_string()))
    }

    /// Create a new complaint.
    pub async fn create(&self, model: complaint::ActiveModel) -> AppResult<complaint::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new complaint inside a transaction.
    pub async fn create_in<C: ConnectionTrait>(
        conn: &C,
        model: complaint::ActiveModel,
    ) -> AppResult<complaint::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Complaints assigned to an official, awaiting triage.
    ///
    /// `progress_report` selects between the complaint and progress
    /// dashboards.
    pub async fn find_assigned(
        &self,
        official_id: &str,
        progress_report: bool,
    ) -> AppResult<Vec<complaint::Model>> {
        let assignments = ComplaintAssignment::find()
            .filter(complaint_assignment::Column::OfficialId.eq(official_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let complaint_ids: Vec<String> =
            assignments.into_iter().map(|a| a.complaint_id).collect();

        if complaint_ids.is_empty() {
            return Ok(vec![]);
        }

        Complaint::find()
            .filter(complaint::Column::Id.is_in(complaint_ids))
            .filter(complaint::Column::Status.eq(ComplaintStatus::Filed))
            .filter(complaint::Column::ProgressReport.eq(progress_report))
            .filter(complaint::Column::DeletedAt.is_null())
            .order_by(complaint::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Complaints filed by a citizen, newest first.
    pub async fn find_by_filer(&self, filer_id: &str) -> AppResult<Vec<complaint::Model>> {
        Complaint::find()
            .filter(complaint::Column::FilerId.eq(filer_id))
            .filter(complaint::Column::DeletedAt.is_null())
            .order_by(complaint::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Complaints in a given state, newest first.
    pub async fn find_by_status(&self, status: ComplaintStatus) -> AppResult<Vec<complaint::Model>> {
        Complaint::find()
            .filter(complaint::Column::Status.eq(status))
            .filter(complaint::Column::DeletedAt.is_null())
            .order_by(complaint::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// IDs of the officials a complaint is assigned to.
    pub async fn assigned_official_ids(&self, complaint_id: &str) -> AppResult<Vec<String>> {
        let assignments = ComplaintAssignment::find()
            .filter(complaint_assignment::Column::ComplaintId.eq(complaint_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(assignments.into_iter().map(|a| a.official_id).collect())
    }

    // ==================== Transactional operations ====================

    /// Conditionally move a complaint from `from` to `to`.
    ///
    /// The status guard is part of the UPDATE itself, so two officials racing
    /// on the same complaint serialize on the row: exactly one caller sees
    /// `true`, everyone else `false`.
    pub async fn transition<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        from: ComplaintStatus,
        to: ComplaintStatus,
    ) -> AppResult<bool> {
        let now: chrono::DateTime<chrono::FixedOffset> = chrono::Utc::now().into();
        let result = Complaint::update_many()
            .col_expr(complaint::Column::Status, to.into())
            .col_expr(complaint::Column::UpdatedAt, Some(now).into())
            .filter(complaint::Column::Id.eq(id))
            .filter(complaint::Column::Status.eq(from))
            .filter(complaint::Column::DeletedAt.is_null())
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Tombstone a complaint (spam soft delete).
    pub async fn tombstone<C: ConnectionTrait>(conn: &C, id: &str) -> AppResult<()> {
        let now: chrono::DateTime<chrono::FixedOffset> = chrono::Utc::now().into();
        Complaint::update_many()
            .col_expr(complaint::Column::DeletedAt, Some(now).into())
            .filter(complaint::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Record that an official travelled to the complaint site.
    pub async fn set_travelled<C: ConnectionTrait>(conn: &C, id: &str) -> AppResult<()> {
        let now: chrono::DateTime<chrono::FixedOffset> = chrono::Utc::now().into();
        Complaint::update_many()
            .col_expr(complaint::Column::WasTravelled, true.into())
            .col_expr(complaint::Column::UpdatedAt, Some(now).into())
            .filter(complaint::Column::Id.eq(id))
            .filter(complaint::Column::DeletedAt.is_null())
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Point a complaint at a department.
    pub async fn set_department<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        department_id: &str,
    ) -> AppResult<()> {
        Complaint::update_many()
            .col_expr(
                complaint::Column::DepartmentId,
                Some(department_id.to_string()).into(),
            )
            .filter(complaint::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Assign an official to a complaint (idempotent).
    pub async fn assign<C: ConnectionTrait>(
        conn: &C,
        complaint_id: &str,
        official_id: &str,
    ) -> AppResult<()> {
        let model = complaint_assignment::ActiveModel {
            complaint_id: Set(complaint_id.to_string()),
            official_id: Set(official_id.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };

        ComplaintAssignment::insert(model)
            .on_conflict(
                OnConflict::columns([
                    complaint_assignment::Column::ComplaintId,
                    complaint_assignment::Column::OfficialId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Remove an official from a complaint's assignment set.
    pub async fn unassign<C: ConnectionTrait>(
        conn: &C,
        complaint_id: &str,
        official_id: &str,
    ) -> AppResult<()> {
        ComplaintAssignment::delete_many()
            .filter(complaint_assignment::Column::ComplaintId.eq(complaint_id))
            .filter(complaint_assignment::Column::OfficialId.eq(official_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_complaint(id: &str, filer_id: &str, status: ComplaintStatus) -> complaint::Model {
        complaint::Model {
            id: id.to_string(),
            token: format!("{id}token0000000000"),
            filer_id: filer_id.to_string(),
            department_id: None,
            title: "Streetlight out".to_string(),
            body: "The light at 5th and Main has been dark for a week".to_string(),
            location: Some("5th and Main".to_string()),
            status,
            progress_report: false,
            was_travelled: false,
            deleted_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_active_by_id() {
        let model = create_test_complaint("c1", "user1", ComplaintStatus::Filed);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[model]])
                .into_connection(),
        );

        let repo = ComplaintRepository::new(db);
        let result = repo.get_active_by_id("c1").await.unwrap();

        assert_eq!(result.id, "c1");
        assert_eq!(result.status, ComplaintStatus::Filed);
    }

    #[tokio::test]
    async fn test_get_active_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<complaint::Model>::new()])
                .into_connection(),
        );

        let repo = ComplaintRepository::new(db);
        let result = repo.get_active_by_id("missing").await;

        assert!(matches!(result, Err(AppError::ComplaintNotFound(_))));
    }

    #[tokio::test]
    async fn test_transition_claims_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let claimed = ComplaintRepository::transition(
            &db,
            "c1",
            ComplaintStatus::Filed,
            ComplaintStatus::Verified,
        )
        .await
        .unwrap();

        assert!(claimed);
    }

    #[tokio::test]
    async fn test_transition_lost_race() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let claimed = ComplaintRepository::transition(
            &db,
            "c1",
            ComplaintStatus::Filed,
            ComplaintStatus::Verified,
        )
        .await
        .unwrap();

        assert!(!claimed);
    }

    #[tokio::test]
    async fn test_find_assigned_no_assignments() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<complaint_assignment::Model>::new()])
                .into_connection(),
        );

        let repo = ComplaintRepository::new(db);
        let result = repo.find_assigned("official1", false).await.unwrap();

        assert!(result.is_empty());
    }
}

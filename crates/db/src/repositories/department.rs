//! Department repository.

use std::sync::Arc;

use crate::entities::{Department, DepartmentMember, department, department_member};
use civica_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter, QueryOrder,
    Set,
};

/// Department repository for database operations.
#[derive(Clone)]
pub struct DepartmentRepository {
    db: Arc<DatabaseConnection>,
}

impl DepartmentRepository {
    /// Create a new department repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a department by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<department::Model>> {
        Department::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a department by its unique name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<department::Model>> {
        Department::find()
            .filter(department::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a department by name, returning an error if not found.
    pub async fn get_by_name(&self, name: &str) -> AppResult<department::Model> {
        self.find_by_name(name)
            .await?
            .ok_or_else(|| AppError::DepartmentNotFound(name.to_string()))
    }

    /// List all departments.
    pub async fn list_all(&self) -> AppResult<Vec<department::Model>> {
        Department::find()
            .order_by(department::Column::Name, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new department.
    pub async fn create(&self, model: department::ActiveModel) -> AppResult<department::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the user IDs of all members of a department.
    pub async fn member_ids(&self, department_id: &str) -> AppResult<Vec<String>> {
        let members = DepartmentMember::find()
            .filter(department_member::Column::DepartmentId.eq(department_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(members.into_iter().map(|m| m.user_id).collect())
    }

    /// Check whether a user belongs to a department.
    pub async fn is_member(&self, department_id: &str, user_id: &str) -> AppResult<bool> {
        let found = DepartmentMember::find_by_id((department_id.to_string(), user_id.to_string()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(found.is_some())
    }

    /// Add an official to a department.
    pub async fn add_member(&self, department_id: &str, user_id: &str) -> AppResult<()> {
        let model = department_member::ActiveModel {
            department_id: Set(department_id.to_string()),
            user_id: Set(user_id.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Remove an official from a department.
    pub async fn remove_member(&self, department_id: &str, user_id: &str) -> AppResult<()> {
        DepartmentMember::delete_by_id((department_id.to_string(), user_id.to_string()))
            .exec(self.db.as_ref())
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
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_department(id: &str, name: &str) -> department::Model {
        department::Model {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_by_name() {
        let dept = create_test_department("dept1", "Sanitation");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[dept]])
                .into_connection(),
        );

        let repo = DepartmentRepository::new(db);
        let result = repo.get_by_name("Sanitation").await.unwrap();

        assert_eq!(result.id, "dept1");
    }

    #[tokio::test]
    async fn test_get_by_name_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<department::Model>::new()])
                .into_connection(),
        );

        let repo = DepartmentRepository::new(db);
        let result = repo.get_by_name("Unknown").await;

        assert!(matches!(result, Err(AppError::DepartmentNotFound(_))));
    }

    #[tokio::test]
    async fn test_member_ids() {
        let members = vec![
            department_member::Model {
                department_id: "dept1".to_string(),
                user_id: "official1".to_string(),
                created_at: Utc::now().into(),
            },
            department_member::Model {
                department_id: "dept1".to_string(),
                user_id: "official2".to_string(),
                created_at: Utc::now().into(),
            },
        ];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([members])
                .into_connection(),
        );

        let repo = DepartmentRepository::new(db);
        let result = repo.member_ids("dept1").await.unwrap();

        assert_eq!(result, vec!["official1", "official2"]);
    }
}

//! Department service.

use civica_common::{AppError, AppResult, IdGenerator};
use civica_db::{
    entities::{department, user},
    repositories::{DepartmentRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Department service for business logic.
#[derive(Clone)]
pub struct DepartmentService {
    department_repo: DepartmentRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for creating a department.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDepartmentInput {
    #[validate(length(min = 1, max = 128))]
    pub name: String,

    #[validate(length(max = 2048))]
    pub description: Option<String>,
}

impl DepartmentService {
    /// Create a new department service.
    #[must_use]
    pub const fn new(department_repo: DepartmentRepository, user_repo: UserRepository) -> Self {
        Self {
            department_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new department.
    pub async fn create(&self, input: CreateDepartmentInput) -> AppResult<department::Model> {
        input.validate()?;

        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Department name is required".to_string()));
        }

        if self.department_repo.find_by_name(name).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Department already exists: {name}"
            )));
        }

        let model = department::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name.to_string()),
            description: Set(input.description),
            created_at: Set(chrono::Utc::now().into()),
        };

        self.department_repo.create(model).await
    }

    /// List all departments.
    pub async fn list(&self) -> AppResult<Vec<department::Model>> {
        self.department_repo.list_all().await
    }

    /// Get a department by name.
    pub async fn get_by_name(&self, name: &str) -> AppResult<department::Model> {
        self.department_repo.get_by_name(name).await
    }

    /// The officials belonging to a department.
    pub async fn members(&self, department_name: &str) -> AppResult<Vec<user::Model>> {
        let department = self.department_repo.get_by_name(department_name).await?;
        let member_ids = self.department_repo.member_ids(&department.id).await?;
        self.user_repo.find_by_ids(&member_ids).await
    }

    /// Add an official to a department.
    ///
    /// The user is promoted to official standing if they are not already;
    /// department membership is what grants triage access.
    pub async fn add_member(&self, department_name: &str, user_id: &str) -> AppResult<()> {
        let department = self.department_repo.get_by_name(department_name).await?;
        let user = self.user_repo.get_by_id(user_id).await?;

        if self.department_repo.is_member(&department.id, &user.id).await? {
            return Err(AppError::Conflict("User is already a member".to_string()));
        }

        if !user.is_official {
            let mut active: user::ActiveModel = user.into();
            active.is_official = Set(true);
            active.updated_at = Set(Some(chrono::Utc::now().into()));
            self.user_repo.update(active).await?;
        }

        self.department_repo.add_member(&department.id, user_id).await
    }

    /// Remove an official from a department.
    pub async fn remove_member(&self, department_name: &str, user_id: &str) -> AppResult<()> {
        let department = self.department_repo.get_by_name(department_name).await?;
        self.department_repo.remove_member(&department.id, user_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_department(id: &str, name: &str) -> department::Model {
        department::Model {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_service(db: Arc<sea_orm::DatabaseConnection>) -> DepartmentService {
        DepartmentService::new(
            DepartmentRepository::new(Arc::clone(&db)),
            UserRepository::new(db),
        )
    }

    #[test]
    fn test_create_input_validation() {
        let input = CreateDepartmentInput {
            name: String::new(),
            description: None,
        };

        assert!(input.validate().is_err());
    }

    #[tokio::test]
    async fn test_create_duplicate_name() {
        let existing = create_test_department("dept1", "Sanitation");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );

        let service = create_test_service(db);
        let result = service
            .create(CreateDepartmentInput {
                name: "Sanitation".to_string(),
                description: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_get_by_name_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<department::Model>::new()])
                .into_connection(),
        );

        let service = create_test_service(db);
        let result = service.get_by_name("Unknown").await;

        assert!(matches!(result, Err(AppError::DepartmentNotFound(_))));
    }
}

//! Reward account repository.

use std::sync::Arc;

use crate::entities::{RewardAccount, reward_account};
use civica_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait};

/// Reward account repository for database operations.
#[derive(Clone)]
pub struct RewardAccountRepository {
    db: Arc<DatabaseConnection>,
}

impl RewardAccountRepository {
    /// Create a new reward account repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a reward account by user ID.
    pub async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<reward_account::Model>> {
        RewardAccount::find_by_id(user_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a reward account by user ID, returning an error if not found.
    pub async fn get_by_user_id(&self, user_id: &str) -> AppResult<reward_account::Model> {
        self.find_by_user_id(user_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))
    }

    /// Create a reward account.
    pub async fn create(&self, model: reward_account::ActiveModel) -> AppResult<reward_account::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ==================== Transactional operations ====================

    /// Load a reward account inside a transaction.
    pub async fn get_in<C: ConnectionTrait>(
        conn: &C,
        user_id: &str,
    ) -> AppResult<reward_account::Model> {
        RewardAccount::find_by_id(user_id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))
    }

    /// Persist ledger changes inside a transaction.
    pub async fn update_in<C: ConnectionTrait>(
        conn: &C,
        model: reward_account::ActiveModel,
    ) -> AppResult<reward_account::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_account(user_id: &str, points: i32, spam_count: i32) -> reward_account::Model {
        reward_account::Model {
            user_id: user_id.to_string(),
            points,
            spam_count,
            contributions: 0,
            frozen: false,
            freeze_until: None,
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_by_user_id() {
        let account = create_test_account("user1", 30, 2);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[account]])
                .into_connection(),
        );

        let repo = RewardAccountRepository::new(db);
        let result = repo.get_by_user_id("user1").await.unwrap();

        assert_eq!(result.points, 30);
        assert_eq!(result.spam_count, 2);
    }

    #[tokio::test]
    async fn test_get_by_user_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<reward_account::Model>::new()])
                .into_connection(),
        );

        let repo = RewardAccountRepository::new(db);
        let result = repo.get_by_user_id("missing").await;

        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }
}

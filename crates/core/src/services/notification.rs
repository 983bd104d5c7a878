//! Notification service.

use civica_common::{AppResult, IdGenerator};
use civica_db::{entities::notification, repositories::NotificationRepository};
use sea_orm::Set;

/// Notification service for business logic.
///
/// Rows are write-once; only the read flag ever changes after creation.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self {
            notification_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Record a notification for a user.
    pub async fn record(&self, user_id: &str, body: &str) -> AppResult<notification::Model> {
        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            body: Set(body.to_string()),
            is_read: Set(false),
            created_at: Set(chrono::Utc::now().into()),
        };

        self.notification_repo.create(model).await
    }

    /// Get notifications for a user.
    pub async fn get_notifications(
        &self,
        user_id: &str,
        limit: u64,
        until_id: Option<&str>,
        unread_only: bool,
    ) -> AppResult<Vec<notification::Model>> {
        self.notification_repo
            .find_by_user(user_id, limit, until_id, unread_only)
            .await
    }

    /// Mark a notification as read.
    pub async fn mark_as_read(&self, user_id: &str, notification_id: &str) -> AppResult<()> {
        // Verify the notification belongs to the user
        let notification = self.notification_repo.find_by_id(notification_id).await?;
        if let Some(n) = notification
            && n.user_id == user_id
        {
            self.notification_repo.mark_as_read(notification_id).await?;
        }
        Ok(())
    }

    /// Mark all notifications as read for a user.
    pub async fn mark_all_as_read(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.mark_all_as_read(user_id).await
    }

    /// Count unread notifications for a user.
    pub async fn count_unread(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(user_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_notification(id: &str, user_id: &str) -> notification::Model {
        notification::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            body: "Your complaint with ID abcd1234 is approved".to_string(),
            is_read: false,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_notifications() {
        let n1 = create_test_notification("n1", "user1");
        let n2 = create_test_notification("n2", "user1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[n1, n2]])
                .into_connection(),
        );

        let service = NotificationService::new(NotificationRepository::new(db));
        let result = service
            .get_notifications("user1", 10, None, false)
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_mark_as_read_ignores_other_users() {
        let n1 = create_test_notification("n1", "someone_else");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[n1]])
                .into_connection(),
        );

        let service = NotificationService::new(NotificationRepository::new(db));

        // No update is issued for a notification owned by another user; a
        // second query would panic the mock if one were attempted.
        service.mark_as_read("user1", "n1").await.unwrap();
    }
}

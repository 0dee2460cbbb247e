use crate::error::{AppError, AppResult};
use crate::models::{NewNotification, Notification};
use crate::pagination::{Page, PageQuery};
use crate::repositories::NotificationRepository;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

pub struct NotificationService {
    notification_repo: Arc<NotificationRepository>,
}

impl NotificationService {
    pub fn new(notification_repo: Arc<NotificationRepository>) -> Self {
        Self { notification_repo }
    }

    /// Deliver a notification; failures are logged only
    pub async fn notify(&self, notification: NewNotification) {
        if let Err(e) = self.notification_repo.create(&notification).await {
            warn!(
                "Failed to create {} notification for {}: {}",
                notification.kind, notification.user_id, e
            );
        }
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        query: &PageQuery,
    ) -> AppResult<Page<Notification>> {
        let items = self
            .notification_repo
            .list_for_user(user_id, unread_only, query.limit(), query.offset())
            .await?;
        let total = self
            .notification_repo
            .count_for_user(user_id, unread_only)
            .await?;
        Ok(Page::new(items, query, total))
    }

    pub async fn unread_count(&self, user_id: Uuid) -> AppResult<i64> {
        Ok(self.notification_repo.count_for_user(user_id, true).await?)
    }

    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        if !self.notification_repo.mark_read(user_id, id).await? {
            return Err(AppError::NotFound("Notification not found".to_string()));
        }
        Ok(())
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> AppResult<u64> {
        Ok(self.notification_repo.mark_all_read(user_id).await?)
    }
}

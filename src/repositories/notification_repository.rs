use crate::error::RepositoryError;
use crate::models::{NewNotification, Notification};
use sqlx::PgPool;
use uuid::Uuid;

const NOTIFICATION_COLUMNS: &str = "id, user_id, kind, title, body, link, read_at, created_at";

/// Repository for per-user notifications
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new NotificationRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: &NewNotification) -> Result<Notification, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO notifications (user_id, kind, title, body, link)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        );
        let notification = sqlx::query_as::<_, Notification>(&sql)
            .bind(new.user_id)
            .bind(new.kind)
            .bind(&new.title)
            .bind(&new.body)
            .bind(&new.link)
            .fetch_one(&self.pool)
            .await?;

        Ok(notification)
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR read_at IS NULL)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            NOTIFICATION_COLUMNS
        );
        let notifications = sqlx::query_as::<_, Notification>(&sql)
            .bind(user_id)
            .bind(unread_only)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(notifications)
    }

    pub async fn count_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND (NOT $2 OR read_at IS NULL)",
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Mark one notification read. Already-read notifications keep their timestamp.
    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, RepositoryError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE notifications
            SET read_at = COALESCE(read_at, NOW())
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Returns how many notifications changed
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, RepositoryError> {
        let rows_affected = sqlx::query(
            "UPDATE notifications SET read_at = NOW() WHERE user_id = $1 AND read_at IS NULL",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected)
    }
}

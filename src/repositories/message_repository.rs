use crate::error::RepositoryError;
use crate::models::Message;
use chrono::NaiveDateTime;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for trip chat messages
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    /// Create a new MessageRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Messages older than `before` (or the newest ones), newest first
    pub async fn list_for_trip(
        &self,
        trip_id: Uuid,
        before: Option<NaiveDateTime>,
        limit: i64,
    ) -> Result<Vec<Message>, RepositoryError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT m.id, m.trip_id, m.author_id, u.name AS author_name, m.content, m.created_at
            FROM messages m
            JOIN users u ON u.id = m.author_id
            WHERE m.trip_id = $1 AND m.deleted_at IS NULL
              AND ($2::timestamp IS NULL OR m.created_at < $2)
            ORDER BY m.created_at DESC
            LIMIT $3
            "#,
        )
        .bind(trip_id)
        .bind(before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    pub async fn find(&self, trip_id: Uuid, id: Uuid) -> Result<Option<Message>, RepositoryError> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            SELECT m.id, m.trip_id, m.author_id, u.name AS author_name, m.content, m.created_at
            FROM messages m
            JOIN users u ON u.id = m.author_id
            WHERE m.id = $1 AND m.trip_id = $2 AND m.deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(trip_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message)
    }

    /// Insert a message and return it with the author's display name
    pub async fn create(
        &self,
        trip_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<Message, RepositoryError> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            WITH inserted AS (
                INSERT INTO messages (trip_id, author_id, content)
                VALUES ($1, $2, $3)
                RETURNING id, trip_id, author_id, content, created_at
            )
            SELECT i.id, i.trip_id, i.author_id, u.name AS author_name, i.content, i.created_at
            FROM inserted i
            JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(trip_id)
        .bind(author_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    pub async fn soft_delete(&self, trip_id: Uuid, id: Uuid) -> Result<bool, RepositoryError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE messages
            SET deleted_at = NOW()
            WHERE id = $1 AND trip_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(trip_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }
}

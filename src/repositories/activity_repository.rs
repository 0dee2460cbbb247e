use crate::error::RepositoryError;
use crate::models::Activity;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for the append-only trip activity feed
pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    /// Create a new ActivityRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        trip_id: Uuid,
        actor_id: Option<Uuid>,
        kind: &str,
        summary: &str,
        metadata: &Value,
    ) -> Result<Activity, RepositoryError> {
        let activity = sqlx::query_as::<_, Activity>(
            r#"
            INSERT INTO activities (trip_id, actor_id, kind, summary, metadata)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, trip_id, actor_id, kind, summary, metadata, created_at
            "#,
        )
        .bind(trip_id)
        .bind(actor_id)
        .bind(kind)
        .bind(summary)
        .bind(metadata)
        .fetch_one(&self.pool)
        .await?;

        Ok(activity)
    }

    /// Newest entries first
    pub async fn list_for_trip(
        &self,
        trip_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Activity>, RepositoryError> {
        let activities = sqlx::query_as::<_, Activity>(
            r#"
            SELECT id, trip_id, actor_id, kind, summary, metadata, created_at
            FROM activities
            WHERE trip_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(trip_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(activities)
    }

    pub async fn count_for_trip(&self, trip_id: Uuid) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activities WHERE trip_id = $1")
            .bind(trip_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

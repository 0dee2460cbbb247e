use crate::error::RepositoryError;
use crate::models::idea::CreateIdea;
use crate::models::{Idea, IdeaStatus};
use sqlx::PgPool;
use uuid::Uuid;

/// Select list shared by every idea read; `$viewer` is the caller for `voted_by_me`
const IDEA_SELECT: &str = r#"
    SELECT i.id, i.trip_id, i.author_id, i.title, i.description, i.url, i.status,
           (SELECT COUNT(*) FROM idea_votes v WHERE v.idea_id = i.id) AS votes,
           EXISTS (SELECT 1 FROM idea_votes v WHERE v.idea_id = i.id AND v.user_id = $2)
               AS voted_by_me,
           i.created_at, i.updated_at
    FROM ideas i
"#;

/// Repository for trip ideas and their votes
pub struct IdeaRepository {
    pool: PgPool,
}

impl IdeaRepository {
    /// Create a new IdeaRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Live ideas of a trip, most voted first
    pub async fn list_for_trip(
        &self,
        trip_id: Uuid,
        viewer_id: Uuid,
    ) -> Result<Vec<Idea>, RepositoryError> {
        let sql = format!(
            "{} WHERE i.trip_id = $1 AND i.deleted_at IS NULL ORDER BY votes DESC, i.created_at DESC",
            IDEA_SELECT
        );
        let ideas = sqlx::query_as::<_, Idea>(&sql)
            .bind(trip_id)
            .bind(viewer_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(ideas)
    }

    pub async fn find(
        &self,
        trip_id: Uuid,
        id: Uuid,
        viewer_id: Uuid,
    ) -> Result<Option<Idea>, RepositoryError> {
        let sql = format!(
            "{} WHERE i.trip_id = $1 AND i.id = $3 AND i.deleted_at IS NULL",
            IDEA_SELECT
        );
        let idea = sqlx::query_as::<_, Idea>(&sql)
            .bind(trip_id)
            .bind(viewer_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(idea)
    }

    pub async fn create(
        &self,
        trip_id: Uuid,
        author_id: Uuid,
        input: &CreateIdea,
    ) -> Result<Idea, RepositoryError> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO ideas (trip_id, author_id, title, description, url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(trip_id)
        .bind(author_id)
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(&input.url)
        .fetch_one(&self.pool)
        .await?;

        self.find(trip_id, id, author_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("Idea not found".to_string()))
    }

    pub async fn set_status(
        &self,
        trip_id: Uuid,
        id: Uuid,
        status: IdeaStatus,
    ) -> Result<bool, RepositoryError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE ideas
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND trip_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(trip_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Add the user's vote, or remove it if already cast. Returns whether a vote now exists.
    pub async fn toggle_vote(&self, idea_id: Uuid, user_id: Uuid) -> Result<bool, RepositoryError> {
        let removed = sqlx::query("DELETE FROM idea_votes WHERE idea_id = $1 AND user_id = $2")
            .bind(idea_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if removed > 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO idea_votes (idea_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (idea_id, user_id) DO NOTHING
            "#,
        )
        .bind(idea_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    pub async fn soft_delete(&self, trip_id: Uuid, id: Uuid) -> Result<bool, RepositoryError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE ideas
            SET deleted_at = NOW(), updated_at = NOW()
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

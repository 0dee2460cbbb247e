use crate::error::RepositoryError;
use crate::models::poll::CreatePoll;
use crate::models::{Poll, PollOptionTally};
use sqlx::PgPool;
use uuid::Uuid;

const POLL_COLUMNS: &str =
    "id, trip_id, author_id, question, allow_multiple, closes_at, closed_at, created_at";

/// Repository for polls, their options and votes
pub struct PollRepository {
    pool: PgPool,
}

impl PollRepository {
    /// Create a new PollRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_trip(&self, trip_id: Uuid) -> Result<Vec<Poll>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM polls WHERE trip_id = $1 AND deleted_at IS NULL ORDER BY created_at DESC",
            POLL_COLUMNS
        );
        let polls = sqlx::query_as::<_, Poll>(&sql)
            .bind(trip_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(polls)
    }

    pub async fn find(&self, trip_id: Uuid, id: Uuid) -> Result<Option<Poll>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM polls WHERE id = $1 AND trip_id = $2 AND deleted_at IS NULL",
            POLL_COLUMNS
        );
        let poll = sqlx::query_as::<_, Poll>(&sql)
            .bind(id)
            .bind(trip_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(poll)
    }

    /// Insert the poll and its options atomically
    pub async fn create(
        &self,
        trip_id: Uuid,
        author_id: Uuid,
        input: &CreatePoll,
    ) -> Result<Poll, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO polls (trip_id, author_id, question, allow_multiple, closes_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            POLL_COLUMNS
        );
        let poll = sqlx::query_as::<_, Poll>(&sql)
            .bind(trip_id)
            .bind(author_id)
            .bind(input.question.trim())
            .bind(input.allow_multiple)
            .bind(input.closes_at)
            .fetch_one(&mut *tx)
            .await?;

        for (position, label) in input.options.iter().enumerate() {
            sqlx::query("INSERT INTO poll_options (poll_id, label, position) VALUES ($1, $2, $3)")
                .bind(poll.id)
                .bind(label.trim())
                .bind(position as i32)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(poll)
    }

    /// Options of a poll in display order with their vote counts
    pub async fn tallies(&self, poll_id: Uuid) -> Result<Vec<PollOptionTally>, RepositoryError> {
        let tallies = sqlx::query_as::<_, PollOptionTally>(
            r#"
            SELECT o.id, o.poll_id, o.label, o.position, COUNT(v.user_id) AS votes
            FROM poll_options o
            LEFT JOIN poll_votes v ON v.option_id = o.id
            WHERE o.poll_id = $1
            GROUP BY o.id
            ORDER BY o.position ASC
            "#,
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tallies)
    }

    /// Options the user currently has selected
    pub async fn user_votes(&self, poll_id: Uuid, user_id: Uuid) -> Result<Vec<Uuid>, RepositoryError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT option_id FROM poll_votes WHERE poll_id = $1 AND user_id = $2",
        )
        .bind(poll_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Replace the user's selections with `option_ids` in one transaction
    pub async fn replace_votes(
        &self,
        poll_id: Uuid,
        user_id: Uuid,
        option_ids: &[Uuid],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM poll_votes WHERE poll_id = $1 AND user_id = $2")
            .bind(poll_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for option_id in option_ids {
            sqlx::query("INSERT INTO poll_votes (poll_id, option_id, user_id) VALUES ($1, $2, $3)")
                .bind(poll_id)
                .bind(option_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Close a poll. Returns false when it was already closed.
    pub async fn close(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let rows_affected = sqlx::query(
            "UPDATE polls SET closed_at = NOW() WHERE id = $1 AND closed_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }
}

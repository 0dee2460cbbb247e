use crate::error::RepositoryError;
use crate::models::trip::{CreateTrip, UpdateTrip};
use crate::models::{Trip, TripStatusFilter};
use sqlx::PgPool;
use uuid::Uuid;

const TRIP_COLUMNS: &str = "t.id, t.owner_id, t.title, t.description, t.destination, t.start_date, \
    t.end_date, t.cover_image_url, t.tags, t.is_archived, t.archived_at, t.created_at, \
    t.updated_at, t.deleted_at";

/// Visibility predicate: owned by `$1` or shared with `$1` and accepted
const VISIBLE_TO_USER: &str = "(t.owner_id = $1 OR EXISTS (\
    SELECT 1 FROM collaborators c \
    WHERE c.trip_id = t.id AND c.user_id = $1 AND c.status = 'ACCEPTED'))";

/// Filters for listing a user's trips
#[derive(Debug, Clone, Default)]
pub struct TripListFilter {
    pub status: TripStatusFilter,
    pub search: Option<String>,
    pub tag: Option<String>,
}

/// Repository for trip data access. Soft-deleted trips are invisible to every read.
pub struct TripRepository {
    pool: PgPool,
}

impl TripRepository {
    /// Create a new TripRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new trip owned by `owner_id`
    pub async fn create(
        &self,
        owner_id: Uuid,
        input: &CreateTrip,
        tags: &[String],
    ) -> Result<Trip, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO trips AS t (owner_id, title, description, destination, start_date,
                                    end_date, cover_image_url, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            TRIP_COLUMNS
        );

        let trip = sqlx::query_as::<_, Trip>(&sql)
            .bind(owner_id)
            .bind(input.title.trim())
            .bind(&input.description)
            .bind(&input.destination)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(&input.cover_image_url)
            .bind(tags)
            .fetch_one(&self.pool)
            .await?;

        Ok(trip)
    }

    /// Find a live (not soft-deleted) trip by UUID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Trip>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM trips t WHERE t.id = $1 AND t.deleted_at IS NULL",
            TRIP_COLUMNS
        );

        let trip = sqlx::query_as::<_, Trip>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(trip)
    }

    /// Trips owned by or shared with `user_id`, most recently updated first
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        filter: &TripListFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Trip>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM trips t
            WHERE t.deleted_at IS NULL
              AND {}
              AND ($2::boolean IS NULL OR t.is_archived = $2)
              AND ($3::text IS NULL OR t.title ILIKE '%' || $3 || '%'
                   OR t.destination ILIKE '%' || $3 || '%')
              AND ($4::text IS NULL OR $4 = ANY(t.tags))
            ORDER BY t.updated_at DESC
            LIMIT $5 OFFSET $6
            "#,
            TRIP_COLUMNS, VISIBLE_TO_USER
        );

        let trips = sqlx::query_as::<_, Trip>(&sql)
            .bind(user_id)
            .bind(filter.status.archived_flag())
            .bind(&filter.search)
            .bind(&filter.tag)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(trips)
    }

    /// Count matching `list_for_user` without paging
    pub async fn count_for_user(
        &self,
        user_id: Uuid,
        filter: &TripListFilter,
    ) -> Result<i64, RepositoryError> {
        let sql = format!(
            r#"
            SELECT COUNT(*)
            FROM trips t
            WHERE t.deleted_at IS NULL
              AND {}
              AND ($2::boolean IS NULL OR t.is_archived = $2)
              AND ($3::text IS NULL OR t.title ILIKE '%' || $3 || '%'
                   OR t.destination ILIKE '%' || $3 || '%')
              AND ($4::text IS NULL OR $4 = ANY(t.tags))
            "#,
            VISIBLE_TO_USER
        );

        let count: i64 = sqlx::query_scalar(&sql)
            .bind(user_id)
            .bind(filter.status.archived_flag())
            .bind(&filter.search)
            .bind(&filter.tag)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Apply a partial update; `None` fields keep their stored value
    pub async fn update(
        &self,
        id: Uuid,
        changes: &UpdateTrip,
        tags: Option<&[String]>,
    ) -> Result<Trip, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE trips AS t
            SET title = COALESCE($2, t.title),
                description = COALESCE($3, t.description),
                destination = COALESCE($4, t.destination),
                start_date = COALESCE($5, t.start_date),
                end_date = COALESCE($6, t.end_date),
                cover_image_url = COALESCE($7, t.cover_image_url),
                tags = COALESCE($8, t.tags),
                is_archived = COALESCE($9, t.is_archived),
                archived_at = CASE
                    WHEN $9 IS NULL THEN t.archived_at
                    WHEN $9 AND NOT t.is_archived THEN NOW()
                    WHEN $9 THEN t.archived_at
                    ELSE NULL
                END,
                updated_at = NOW()
            WHERE t.id = $1 AND t.deleted_at IS NULL
            RETURNING {}
            "#,
            TRIP_COLUMNS
        );

        let trip = sqlx::query_as::<_, Trip>(&sql)
            .bind(id)
            .bind(changes.title.as_deref().map(str::trim))
            .bind(&changes.description)
            .bind(&changes.destination)
            .bind(changes.start_date)
            .bind(changes.end_date)
            .bind(&changes.cover_image_url)
            .bind(tags)
            .bind(changes.is_archived)
            .fetch_optional(&self.pool)
            .await?;

        trip.ok_or_else(|| RepositoryError::NotFound("Trip not found".to_string()))
    }

    /// Archive a trip. Returns false when it was already archived or is gone.
    pub async fn archive(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE trips
            SET is_archived = TRUE, archived_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL AND is_archived = FALSE
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Replace the tag set of a trip
    pub async fn set_tags(&self, id: Uuid, tags: &[String]) -> Result<bool, RepositoryError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE trips
            SET tags = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(tags)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Soft-delete a trip
    pub async fn soft_delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE trips
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Bump `updated_at` after a change to a child record
    pub async fn touch(&self, id: Uuid) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE trips SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

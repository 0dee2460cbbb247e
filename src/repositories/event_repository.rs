use crate::error::RepositoryError;
use crate::models::event::{CreateEvent, UpdateEvent};
use crate::models::{Event, EventCategory, EventPosition};
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

const EVENT_COLUMNS: &str = "id, trip_id, title, description, location, date, start_time, \
    end_time, category, cost, currency, order_index, created_by, created_at, updated_at, deleted_at";

/// Repository for itinerary events
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Create a new EventRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Live events of a trip, optionally for one day, in itinerary order
    pub async fn list_for_trip(
        &self,
        trip_id: Uuid,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Event>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM itinerary_events
            WHERE trip_id = $1 AND deleted_at IS NULL
              AND ($2::date IS NULL OR date = $2)
            ORDER BY date ASC, order_index ASC, start_time ASC NULLS LAST
            "#,
            EVENT_COLUMNS
        );
        let events = sqlx::query_as::<_, Event>(&sql)
            .bind(trip_id)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }

    /// Find a live event that belongs to `trip_id`
    pub async fn find(&self, trip_id: Uuid, id: Uuid) -> Result<Option<Event>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM itinerary_events WHERE id = $1 AND trip_id = $2 AND deleted_at IS NULL",
            EVENT_COLUMNS
        );
        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .bind(trip_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    /// Insert an event at the end of its day
    pub async fn create(
        &self,
        trip_id: Uuid,
        created_by: Uuid,
        input: &CreateEvent,
    ) -> Result<Event, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO itinerary_events (trip_id, title, description, location, date, start_time,
                                          end_time, category, cost, currency, order_index, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    (SELECT COALESCE(MAX(order_index) + 1, 0)
                     FROM itinerary_events
                     WHERE trip_id = $1 AND date = $5 AND deleted_at IS NULL),
                    $11)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        );
        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(trip_id)
            .bind(input.title.trim())
            .bind(&input.description)
            .bind(&input.location)
            .bind(input.date)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(input.category.unwrap_or(EventCategory::Activity).as_str())
            .bind(input.cost)
            .bind(input.currency.as_deref().unwrap_or("USD"))
            .bind(created_by)
            .fetch_one(&self.pool)
            .await?;

        Ok(event)
    }

    pub async fn update(
        &self,
        trip_id: Uuid,
        id: Uuid,
        changes: &UpdateEvent,
    ) -> Result<Event, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE itinerary_events
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                location = COALESCE($5, location),
                date = COALESCE($6, date),
                start_time = COALESCE($7, start_time),
                end_time = COALESCE($8, end_time),
                category = COALESCE($9, category),
                cost = COALESCE($10, cost),
                currency = COALESCE($11, currency),
                updated_at = NOW()
            WHERE id = $1 AND trip_id = $2 AND deleted_at IS NULL
            RETURNING {}
            "#,
            EVENT_COLUMNS
        );
        sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .bind(trip_id)
            .bind(changes.title.as_deref().map(str::trim))
            .bind(&changes.description)
            .bind(&changes.location)
            .bind(changes.date)
            .bind(changes.start_time)
            .bind(changes.end_time)
            .bind(changes.category.map(|c| c.as_str()))
            .bind(changes.cost)
            .bind(&changes.currency)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("Event not found".to_string()))
    }

    pub async fn soft_delete(&self, trip_id: Uuid, id: Uuid) -> Result<bool, RepositoryError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE itinerary_events
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

    /// Apply every position in one transaction. An id outside the trip aborts the
    /// whole batch with `InvalidInput` and nothing is written.
    pub async fn reorder(
        &self,
        trip_id: Uuid,
        positions: &[EventPosition],
    ) -> Result<Vec<Event>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for position in positions {
            let rows_affected = sqlx::query(
                r#"
                UPDATE itinerary_events
                SET order_index = $3,
                    date = COALESCE($4, date),
                    updated_at = NOW()
                WHERE id = $1 AND trip_id = $2 AND deleted_at IS NULL
                "#,
            )
            .bind(position.id)
            .bind(trip_id)
            .bind(position.order_index)
            .bind(position.date)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if rows_affected == 0 {
                // Dropping the transaction rolls back earlier updates
                return Err(RepositoryError::InvalidInput(format!(
                    "Event {} does not belong to this trip",
                    position.id
                )));
            }
        }

        tx.commit().await?;

        self.list_for_trip(trip_id, None).await
    }
}

use crate::error::RepositoryError;
use crate::models::budget::UpsertBudget;
use crate::models::Budget;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for the per-trip budget
pub struct BudgetRepository {
    pool: PgPool,
}

impl BudgetRepository {
    /// Create a new BudgetRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_for_trip(&self, trip_id: Uuid) -> Result<Option<Budget>, RepositoryError> {
        let budget = sqlx::query_as::<_, Budget>(
            r#"
            SELECT id, trip_id, total, currency, categories, updated_at
            FROM budgets
            WHERE trip_id = $1
            "#,
        )
        .bind(trip_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(budget)
    }

    /// Create or replace the budget of a trip
    pub async fn upsert(
        &self,
        trip_id: Uuid,
        input: &UpsertBudget,
    ) -> Result<Budget, RepositoryError> {
        let categories = serde_json::to_value(&input.categories)
            .map_err(|e| RepositoryError::InvalidInput(e.to_string()))?;

        let budget = sqlx::query_as::<_, Budget>(
            r#"
            INSERT INTO budgets (trip_id, total, currency, categories)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (trip_id) DO UPDATE
            SET total = EXCLUDED.total,
                currency = EXCLUDED.currency,
                categories = EXCLUDED.categories,
                updated_at = NOW()
            RETURNING id, trip_id, total, currency, categories, updated_at
            "#,
        )
        .bind(trip_id)
        .bind(input.total)
        .bind(input.currency.as_deref().unwrap_or("USD"))
        .bind(categories)
        .fetch_one(&self.pool)
        .await?;

        Ok(budget)
    }
}

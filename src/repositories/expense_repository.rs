use crate::error::RepositoryError;
use crate::models::expense::{CreateExpense, UpdateExpense};
use crate::models::Expense;
use sqlx::PgPool;
use uuid::Uuid;

const EXPENSE_COLUMNS: &str = "id, trip_id, description, amount, currency, category, date, \
    paid_by, split_among, created_by, created_at, updated_at, deleted_at";

/// Repository for trip expenses
pub struct ExpenseRepository {
    pool: PgPool,
}

impl ExpenseRepository {
    /// Create a new ExpenseRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One page of live expenses, newest date first
    pub async fn list_for_trip(
        &self,
        trip_id: Uuid,
        category: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Expense>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM expenses
            WHERE trip_id = $1 AND deleted_at IS NULL
              AND ($2::text IS NULL OR category = $2)
            ORDER BY date DESC, created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            EXPENSE_COLUMNS
        );
        let expenses = sqlx::query_as::<_, Expense>(&sql)
            .bind(trip_id)
            .bind(category)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(expenses)
    }

    pub async fn count_for_trip(
        &self,
        trip_id: Uuid,
        category: Option<&str>,
    ) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM expenses
            WHERE trip_id = $1 AND deleted_at IS NULL
              AND ($2::text IS NULL OR category = $2)
            "#,
        )
        .bind(trip_id)
        .bind(category)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Every live expense of a trip, for summaries and exports
    pub async fn all_for_trip(&self, trip_id: Uuid) -> Result<Vec<Expense>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM expenses
            WHERE trip_id = $1 AND deleted_at IS NULL
            ORDER BY date ASC, created_at ASC
            "#,
            EXPENSE_COLUMNS
        );
        let expenses = sqlx::query_as::<_, Expense>(&sql)
            .bind(trip_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(expenses)
    }

    pub async fn find(&self, trip_id: Uuid, id: Uuid) -> Result<Option<Expense>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM expenses WHERE id = $1 AND trip_id = $2 AND deleted_at IS NULL",
            EXPENSE_COLUMNS
        );
        let expense = sqlx::query_as::<_, Expense>(&sql)
            .bind(id)
            .bind(trip_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(expense)
    }

    pub async fn create(
        &self,
        trip_id: Uuid,
        created_by: Uuid,
        input: &CreateExpense,
    ) -> Result<Expense, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO expenses (trip_id, description, amount, currency, category, date,
                                  paid_by, split_among, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            EXPENSE_COLUMNS
        );
        let expense = sqlx::query_as::<_, Expense>(&sql)
            .bind(trip_id)
            .bind(input.description.trim())
            .bind(input.amount)
            .bind(input.currency.as_deref().unwrap_or("USD"))
            .bind(input.category.as_deref().unwrap_or("OTHER"))
            .bind(input.date)
            .bind(input.paid_by.unwrap_or(created_by))
            .bind(&input.split_among)
            .bind(created_by)
            .fetch_one(&self.pool)
            .await?;

        Ok(expense)
    }

    pub async fn update(
        &self,
        trip_id: Uuid,
        id: Uuid,
        changes: &UpdateExpense,
    ) -> Result<Expense, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE expenses
            SET description = COALESCE($3, description),
                amount = COALESCE($4, amount),
                currency = COALESCE($5, currency),
                category = COALESCE($6, category),
                date = COALESCE($7, date),
                paid_by = COALESCE($8, paid_by),
                split_among = COALESCE($9, split_among),
                updated_at = NOW()
            WHERE id = $1 AND trip_id = $2 AND deleted_at IS NULL
            RETURNING {}
            "#,
            EXPENSE_COLUMNS
        );
        sqlx::query_as::<_, Expense>(&sql)
            .bind(id)
            .bind(trip_id)
            .bind(changes.description.as_deref().map(str::trim))
            .bind(changes.amount)
            .bind(&changes.currency)
            .bind(&changes.category)
            .bind(changes.date)
            .bind(changes.paid_by)
            .bind(&changes.split_among)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("Expense not found".to_string()))
    }

    pub async fn soft_delete(&self, trip_id: Uuid, id: Uuid) -> Result<bool, RepositoryError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE expenses
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

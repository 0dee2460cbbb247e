use crate::error::RepositoryError;
use crate::models::crm::{CreateClient, UpdateClient};
use crate::models::CrmClient;
use sqlx::PgPool;
use uuid::Uuid;

const CLIENT_COLUMNS: &str =
    "id, owner_id, name, email, phone, company, notes, created_at, updated_at";

/// Repository for CRM clients. Every query is scoped to the owning planner.
pub struct ClientRepository {
    pool: PgPool,
}

impl ClientRepository {
    /// Create a new ClientRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        owner_id: Uuid,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CrmClient>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM crm_clients
            WHERE owner_id = $1 AND deleted_at IS NULL
              AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%'
                   OR email ILIKE '%' || $2 || '%' OR company ILIKE '%' || $2 || '%')
            ORDER BY name ASC
            LIMIT $3 OFFSET $4
            "#,
            CLIENT_COLUMNS
        );
        let clients = sqlx::query_as::<_, CrmClient>(&sql)
            .bind(owner_id)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(clients)
    }

    pub async fn count(&self, owner_id: Uuid, search: Option<&str>) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM crm_clients
            WHERE owner_id = $1 AND deleted_at IS NULL
              AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%'
                   OR email ILIKE '%' || $2 || '%' OR company ILIKE '%' || $2 || '%')
            "#,
        )
        .bind(owner_id)
        .bind(search)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn find(&self, owner_id: Uuid, id: Uuid) -> Result<Option<CrmClient>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM crm_clients WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL",
            CLIENT_COLUMNS
        );
        let client = sqlx::query_as::<_, CrmClient>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(client)
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        input: &CreateClient,
    ) -> Result<CrmClient, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO crm_clients (owner_id, name, email, phone, company, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            CLIENT_COLUMNS
        );
        let client = sqlx::query_as::<_, CrmClient>(&sql)
            .bind(owner_id)
            .bind(input.name.trim())
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.company)
            .bind(&input.notes)
            .fetch_one(&self.pool)
            .await?;

        Ok(client)
    }

    pub async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: &UpdateClient,
    ) -> Result<CrmClient, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE crm_clients
            SET name = COALESCE($3, name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                company = COALESCE($6, company),
                notes = COALESCE($7, notes),
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL
            RETURNING {}
            "#,
            CLIENT_COLUMNS
        );
        sqlx::query_as::<_, CrmClient>(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(changes.name.as_deref().map(str::trim))
            .bind(&changes.email)
            .bind(&changes.phone)
            .bind(&changes.company)
            .bind(&changes.notes)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("Client not found".to_string()))
    }

    pub async fn soft_delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, RepositoryError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE crm_clients
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }
}

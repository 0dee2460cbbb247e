use crate::error::RepositoryError;
use crate::models::crm::{CreateProposal, UpdateProposal};
use crate::models::{Proposal, ProposalStatus};
use sqlx::PgPool;
use uuid::Uuid;

const PROPOSAL_COLUMNS: &str = "id, owner_id, client_id, trip_id, title, content, total_amount, \
    currency, status, valid_until, sent_at, responded_at, created_at, updated_at";

/// Repository for CRM proposals
pub struct ProposalRepository {
    pool: PgPool,
}

impl ProposalRepository {
    /// Create a new ProposalRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        owner_id: Uuid,
        client_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Proposal>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM proposals
            WHERE owner_id = $1 AND deleted_at IS NULL
              AND ($2::uuid IS NULL OR client_id = $2)
            ORDER BY updated_at DESC
            LIMIT $3 OFFSET $4
            "#,
            PROPOSAL_COLUMNS
        );
        let proposals = sqlx::query_as::<_, Proposal>(&sql)
            .bind(owner_id)
            .bind(client_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(proposals)
    }

    pub async fn count(&self, owner_id: Uuid, client_id: Option<Uuid>) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM proposals
            WHERE owner_id = $1 AND deleted_at IS NULL
              AND ($2::uuid IS NULL OR client_id = $2)
            "#,
        )
        .bind(owner_id)
        .bind(client_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn find(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Proposal>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM proposals WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL",
            PROPOSAL_COLUMNS
        );
        let proposal = sqlx::query_as::<_, Proposal>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(proposal)
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        input: &CreateProposal,
    ) -> Result<Proposal, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO proposals (owner_id, client_id, trip_id, title, content, total_amount,
                                   currency, valid_until)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            PROPOSAL_COLUMNS
        );
        let proposal = sqlx::query_as::<_, Proposal>(&sql)
            .bind(owner_id)
            .bind(input.client_id)
            .bind(input.trip_id)
            .bind(input.title.trim())
            .bind(&input.content)
            .bind(input.total_amount)
            .bind(input.currency.as_deref().unwrap_or("USD"))
            .bind(input.valid_until)
            .fetch_one(&self.pool)
            .await?;

        Ok(proposal)
    }

    /// Edit a proposal that is still a draft. `None` when it is not (or no longer) a draft.
    pub async fn update_draft(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: &UpdateProposal,
    ) -> Result<Option<Proposal>, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE proposals
            SET trip_id = COALESCE($3, trip_id),
                title = COALESCE($4, title),
                content = COALESCE($5, content),
                total_amount = COALESCE($6, total_amount),
                currency = COALESCE($7, currency),
                valid_until = COALESCE($8, valid_until),
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL AND status = 'DRAFT'
            RETURNING {}
            "#,
            PROPOSAL_COLUMNS
        );
        let proposal = sqlx::query_as::<_, Proposal>(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(changes.trip_id)
            .bind(changes.title.as_deref().map(str::trim))
            .bind(&changes.content)
            .bind(changes.total_amount)
            .bind(&changes.currency)
            .bind(changes.valid_until)
            .fetch_optional(&self.pool)
            .await?;

        Ok(proposal)
    }

    /// Move `from` → `to`, stamping `sent_at` or `responded_at`. `None` when the
    /// proposal was not in `from`.
    pub async fn transition(
        &self,
        owner_id: Uuid,
        id: Uuid,
        from: ProposalStatus,
        to: ProposalStatus,
    ) -> Result<Option<Proposal>, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE proposals
            SET status = $4,
                sent_at = CASE WHEN $4 = 'SENT' THEN NOW() ELSE sent_at END,
                responded_at = CASE WHEN $4 IN ('ACCEPTED', 'DECLINED') THEN NOW() ELSE responded_at END,
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL AND status = $3
            RETURNING {}
            "#,
            PROPOSAL_COLUMNS
        );
        let proposal = sqlx::query_as::<_, Proposal>(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(from.as_str())
            .bind(to.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(proposal)
    }

    pub async fn soft_delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, RepositoryError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE proposals
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

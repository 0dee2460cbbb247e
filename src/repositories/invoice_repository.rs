use crate::error::RepositoryError;
use crate::models::crm::invoice_number;
use crate::models::{Invoice, InvoiceStatus, InvoiceTotals};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

const INVOICE_COLUMNS: &str = "id, owner_id, client_id, trip_id, number, line_items, subtotal, \
    tax_rate, tax_amount, total, currency, status, issue_date, due_date, notes, sent_at, paid_at, \
    created_at, updated_at";

/// Invoice fields after the service has computed totals
#[derive(Debug, Clone)]
pub struct InvoiceDraft {
    pub client_id: Uuid,
    pub trip_id: Option<Uuid>,
    pub line_items: Value,
    pub tax_rate: Decimal,
    pub totals: InvoiceTotals,
    pub currency: String,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Repository for CRM invoices
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    /// Create a new InvoiceRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        owner_id: Uuid,
        client_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Invoice>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM invoices
            WHERE owner_id = $1 AND deleted_at IS NULL
              AND ($2::uuid IS NULL OR client_id = $2)
            ORDER BY issue_date DESC, number DESC
            LIMIT $3 OFFSET $4
            "#,
            INVOICE_COLUMNS
        );
        let invoices = sqlx::query_as::<_, Invoice>(&sql)
            .bind(owner_id)
            .bind(client_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(invoices)
    }

    pub async fn count(&self, owner_id: Uuid, client_id: Option<Uuid>) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM invoices
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

    pub async fn find(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Invoice>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM invoices WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL",
            INVOICE_COLUMNS
        );
        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(invoice)
    }

    /// Insert an invoice, assigning the owner's next number for the issue year.
    /// Numbering is serialised per owner with a transaction-scoped advisory lock.
    pub async fn create(
        &self,
        owner_id: Uuid,
        draft: &InvoiceDraft,
    ) -> Result<Invoice, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1::text))")
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        let prefix = format!("INV-{}-%", draft.issue_date.year());
        let issued: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM invoices WHERE owner_id = $1 AND number LIKE $2",
        )
        .bind(owner_id)
        .bind(&prefix)
        .fetch_one(&mut *tx)
        .await?;

        let sql = format!(
            r#"
            INSERT INTO invoices (owner_id, client_id, trip_id, number, line_items, subtotal,
                                  tax_rate, tax_amount, total, currency, issue_date, due_date, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        );
        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(owner_id)
            .bind(draft.client_id)
            .bind(draft.trip_id)
            .bind(invoice_number(draft.issue_date, issued + 1))
            .bind(&draft.line_items)
            .bind(draft.totals.subtotal)
            .bind(draft.tax_rate)
            .bind(draft.totals.tax_amount)
            .bind(draft.totals.total)
            .bind(&draft.currency)
            .bind(draft.issue_date)
            .bind(draft.due_date)
            .bind(&draft.notes)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(invoice)
    }

    /// Rewrite a draft's contents. `None` when the invoice is not a draft.
    pub async fn update_draft(
        &self,
        owner_id: Uuid,
        id: Uuid,
        draft: &InvoiceDraft,
    ) -> Result<Option<Invoice>, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE invoices
            SET line_items = $3, subtotal = $4, tax_rate = $5, tax_amount = $6, total = $7,
                currency = $8, due_date = $9, notes = $10, updated_at = NOW()
            WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL AND status = 'DRAFT'
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        );
        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(&draft.line_items)
            .bind(draft.totals.subtotal)
            .bind(draft.tax_rate)
            .bind(draft.totals.tax_amount)
            .bind(draft.totals.total)
            .bind(&draft.currency)
            .bind(draft.due_date)
            .bind(&draft.notes)
            .fetch_optional(&self.pool)
            .await?;

        Ok(invoice)
    }

    /// Move to `to` when the stored status is one of `from`
    pub async fn transition(
        &self,
        owner_id: Uuid,
        id: Uuid,
        from: &[InvoiceStatus],
        to: InvoiceStatus,
    ) -> Result<Option<Invoice>, RepositoryError> {
        let from: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();
        let sql = format!(
            r#"
            UPDATE invoices
            SET status = $4,
                sent_at = CASE WHEN $4 = 'SENT' THEN NOW() ELSE sent_at END,
                paid_at = CASE WHEN $4 = 'PAID' THEN NOW() ELSE paid_at END,
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL AND status = ANY($3)
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        );
        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(&from)
            .bind(to.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(invoice)
    }

    pub async fn soft_delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, RepositoryError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE invoices
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL AND status = 'DRAFT'
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

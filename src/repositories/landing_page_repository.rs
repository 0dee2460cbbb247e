use crate::error::RepositoryError;
use crate::models::landing_page::{CreateLandingPage, UpdateLandingPage};
use crate::models::LandingPage;
use sqlx::PgPool;
use uuid::Uuid;

const PAGE_COLUMNS: &str = "id, owner_id, trip_id, title, slug, content, theme, is_published, \
    published_at, created_at, updated_at";

/// Repository for landing pages. Slugs are unique among live pages.
pub struct LandingPageRepository {
    pool: PgPool,
}

impl LandingPageRepository {
    /// Create a new LandingPageRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<LandingPage>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM landing_pages WHERE owner_id = $1 AND deleted_at IS NULL ORDER BY updated_at DESC",
            PAGE_COLUMNS
        );
        let pages = sqlx::query_as::<_, LandingPage>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(pages)
    }

    pub async fn find(&self, owner_id: Uuid, id: Uuid) -> Result<Option<LandingPage>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM landing_pages WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL",
            PAGE_COLUMNS
        );
        let page = sqlx::query_as::<_, LandingPage>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(page)
    }

    /// Published page by slug, for anonymous visitors
    pub async fn find_published(&self, slug: &str) -> Result<Option<LandingPage>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM landing_pages WHERE slug = $1 AND is_published AND deleted_at IS NULL",
            PAGE_COLUMNS
        );
        let page = sqlx::query_as::<_, LandingPage>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(page)
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        input: &CreateLandingPage,
    ) -> Result<LandingPage, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO landing_pages (owner_id, trip_id, title, slug, content, theme)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            PAGE_COLUMNS
        );
        let page = sqlx::query_as::<_, LandingPage>(&sql)
            .bind(owner_id)
            .bind(input.trip_id)
            .bind(input.title.trim())
            .bind(&input.slug)
            .bind(&input.content)
            .bind(&input.theme)
            .fetch_one(&self.pool)
            .await?;

        Ok(page)
    }

    pub async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: &UpdateLandingPage,
    ) -> Result<LandingPage, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE landing_pages
            SET title = COALESCE($3, title),
                slug = COALESCE($4, slug),
                trip_id = COALESCE($5, trip_id),
                content = COALESCE($6, content),
                theme = COALESCE($7, theme),
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL
            RETURNING {}
            "#,
            PAGE_COLUMNS
        );
        sqlx::query_as::<_, LandingPage>(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(changes.title.as_deref().map(str::trim))
            .bind(&changes.slug)
            .bind(changes.trip_id)
            .bind(&changes.content)
            .bind(&changes.theme)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("Landing page not found".to_string()))
    }

    pub async fn set_published(
        &self,
        owner_id: Uuid,
        id: Uuid,
        published: bool,
    ) -> Result<LandingPage, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE landing_pages
            SET is_published = $3,
                published_at = CASE WHEN $3 THEN COALESCE(published_at, NOW()) ELSE NULL END,
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL
            RETURNING {}
            "#,
            PAGE_COLUMNS
        );
        sqlx::query_as::<_, LandingPage>(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(published)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound("Landing page not found".to_string()))
    }

    pub async fn soft_delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool, RepositoryError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE landing_pages
            SET deleted_at = NOW(), is_published = FALSE, updated_at = NOW()
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

use super::AccessService;
use crate::error::{AppError, AppResult, RepositoryError};
use crate::models::landing_page::{CreateLandingPage, UpdateLandingPage};
use crate::models::LandingPage;
use crate::permissions::Permission;
use crate::repositories::LandingPageRepository;
use crate::validation::Validate;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

fn slug_conflict(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::Duplicate(_) => AppError::Conflict("Slug is already taken".to_string()),
        other => other.into(),
    }
}

/// Landing page builder and the public page lookup
pub struct LandingPageService {
    page_repo: Arc<LandingPageRepository>,
    access: Arc<AccessService>,
}

impl LandingPageService {
    pub fn new(page_repo: Arc<LandingPageRepository>, access: Arc<AccessService>) -> Self {
        Self { page_repo, access }
    }

    pub async fn list(&self, owner_id: Uuid) -> AppResult<Vec<LandingPage>> {
        Ok(self.page_repo.list(owner_id).await?)
    }

    pub async fn get(&self, owner_id: Uuid, id: Uuid) -> AppResult<LandingPage> {
        self.page_repo
            .find(owner_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Landing page not found".to_string()))
    }

    pub async fn create(&self, owner_id: Uuid, input: &CreateLandingPage) -> AppResult<LandingPage> {
        input.validate()?;
        self.check_trip(owner_id, input.trip_id).await?;

        let page = self
            .page_repo
            .create(owner_id, input)
            .await
            .map_err(slug_conflict)?;
        info!("Created landing page {} ({})", page.id, page.slug);
        Ok(page)
    }

    pub async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: &UpdateLandingPage,
    ) -> AppResult<LandingPage> {
        changes.validate()?;
        self.get(owner_id, id).await?;
        self.check_trip(owner_id, changes.trip_id).await?;

        self.page_repo
            .update(owner_id, id, changes)
            .await
            .map_err(slug_conflict)
    }

    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> AppResult<()> {
        if !self.page_repo.soft_delete(owner_id, id).await? {
            return Err(AppError::NotFound("Landing page not found".to_string()));
        }
        Ok(())
    }

    pub async fn set_published(
        &self,
        owner_id: Uuid,
        id: Uuid,
        published: bool,
    ) -> AppResult<LandingPage> {
        self.get(owner_id, id).await?;
        let page = self.page_repo.set_published(owner_id, id, published).await?;
        info!(
            "Landing page {} {}",
            page.slug,
            if published { "published" } else { "unpublished" }
        );
        Ok(page)
    }

    /// Published page by slug, for unauthenticated visitors
    pub async fn public(&self, slug: &str) -> AppResult<LandingPage> {
        self.page_repo
            .find_published(slug)
            .await?
            .ok_or_else(|| AppError::NotFound("Page not found".to_string()))
    }

    async fn check_trip(&self, owner_id: Uuid, trip_id: Option<Uuid>) -> AppResult<()> {
        if let Some(trip_id) = trip_id {
            self.access.require(trip_id, owner_id, Permission::View).await?;
        }
        Ok(())
    }
}

use crate::error::{AppError, AppResult};
use crate::models::Trip;
use crate::permissions::{Permission, TripAccess};
use crate::repositories::{CollaboratorRepository, TripRepository};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Resolves a caller's access to a trip and enforces permission checks
pub struct AccessService {
    trip_repo: Arc<TripRepository>,
    collaborator_repo: Arc<CollaboratorRepository>,
}

impl AccessService {
    pub fn new(
        trip_repo: Arc<TripRepository>,
        collaborator_repo: Arc<CollaboratorRepository>,
    ) -> Self {
        Self {
            trip_repo,
            collaborator_repo,
        }
    }

    /// Access of `user_id` to an already-loaded trip
    pub async fn access_for(&self, trip: &Trip, user_id: Uuid) -> AppResult<TripAccess> {
        if trip.owner_id == user_id {
            return Ok(TripAccess::owner());
        }
        let collaborator = self.collaborator_repo.find(trip.id, user_id).await?;
        Ok(TripAccess::resolve(trip, user_id, collaborator.as_ref()))
    }

    /// Load a live trip and require `permission` on it.
    /// Missing or soft-deleted trips are 404; insufficient roles are 403.
    pub async fn require(
        &self,
        trip_id: Uuid,
        user_id: Uuid,
        permission: Permission,
    ) -> AppResult<(Trip, TripAccess)> {
        let trip = self
            .trip_repo
            .find_by_id(trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

        let access = self.access_for(&trip, user_id).await?;
        if !permission.allows(&access) {
            debug!(
                "User {} denied {:?} on trip {}",
                user_id, permission, trip_id
            );
            return Err(AppError::Forbidden("Insufficient permissions".to_string()));
        }

        Ok((trip, access))
    }
}

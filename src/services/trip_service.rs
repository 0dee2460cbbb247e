use super::activity::{kinds, ActivityService};
use super::bulk::{
    apply_tags, check_trip_ids, decide, BulkAction, BulkDecision, BulkItemResult, BulkSummary,
    BulkTagRequest, TagMode,
};
use super::AccessService;
use crate::error::{AppError, AppResult};
use crate::models::trip::{normalize_tags, CreateTrip, UpdateTrip, MAX_TAGS, MAX_TAG_LEN};
use crate::models::Trip;
use crate::pagination::{Page, PageQuery};
use crate::permissions::{Permission, PermissionSummary, TripAccess};
use crate::realtime::{RelayEmitter, RelayEvent};
use crate::repositories::{TripListFilter, TripRepository};
use crate::validation::{Validate, Validator};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Trip with the caller's effective permissions
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDetails {
    #[serde(flatten)]
    pub trip: Trip,
    pub permissions: PermissionSummary,
}

impl TripDetails {
    pub fn new(trip: Trip, access: &TripAccess) -> Self {
        Self {
            trip,
            permissions: access.summary(),
        }
    }
}

/// Service for trips and bulk trip operations
pub struct TripService {
    trip_repo: Arc<TripRepository>,
    access: Arc<AccessService>,
    activity: Arc<ActivityService>,
    emitter: RelayEmitter,
}

impl TripService {
    pub fn new(
        trip_repo: Arc<TripRepository>,
        access: Arc<AccessService>,
        activity: Arc<ActivityService>,
        emitter: RelayEmitter,
    ) -> Self {
        Self {
            trip_repo,
            access,
            activity,
            emitter,
        }
    }

    /// Trips the user owns or has accepted an invitation to
    pub async fn list(
        &self,
        user_id: Uuid,
        filter: &TripListFilter,
        query: &PageQuery,
    ) -> AppResult<Page<Trip>> {
        let items = self
            .trip_repo
            .list_for_user(user_id, filter, query.limit(), query.offset())
            .await?;
        let total = self.trip_repo.count_for_user(user_id, filter).await?;
        Ok(Page::new(items, query, total))
    }

    pub async fn create(&self, user_id: Uuid, input: &CreateTrip) -> AppResult<TripDetails> {
        input.validate()?;

        let tags = normalize_tags(&input.tags);
        let trip = self.trip_repo.create(user_id, input, &tags).await?;
        info!("Created trip {} for user {}", trip.id, user_id);

        self.activity
            .record(
                trip.id,
                user_id,
                kinds::TRIP_CREATED,
                format!("Created trip \"{}\"", trip.title),
                json!({}),
            )
            .await;

        Ok(TripDetails::new(trip, &TripAccess::owner()))
    }

    pub async fn get(&self, trip_id: Uuid, user_id: Uuid) -> AppResult<TripDetails> {
        let (trip, access) = self.access.require(trip_id, user_id, Permission::View).await?;
        Ok(TripDetails::new(trip, &access))
    }

    pub async fn update(
        &self,
        trip_id: Uuid,
        user_id: Uuid,
        changes: &UpdateTrip,
    ) -> AppResult<TripDetails> {
        let (current, access) = self.access.require(trip_id, user_id, Permission::Edit).await?;
        changes.validate_against(&current)?;

        let tags = changes.tags.as_deref().map(normalize_tags);
        let trip = self
            .trip_repo
            .update(trip_id, changes, tags.as_deref())
            .await?;

        self.activity
            .record(
                trip_id,
                user_id,
                kinds::TRIP_UPDATED,
                format!("Updated trip \"{}\"", trip.title),
                json!({}),
            )
            .await;
        self.emitter.emit(
            trip_id,
            RelayEvent::TripUpdated,
            json!({ "action": "updated", "trip": &trip }),
        );

        Ok(TripDetails::new(trip, &access))
    }

    pub async fn delete(&self, trip_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let (trip, _) = self
            .access
            .require(trip_id, user_id, Permission::Delete)
            .await?;

        if !self.trip_repo.soft_delete(trip_id).await? {
            return Err(AppError::NotFound("Trip not found".to_string()));
        }
        info!("Deleted trip {} by user {}", trip_id, user_id);

        self.activity
            .record(
                trip_id,
                user_id,
                kinds::TRIP_DELETED,
                format!("Deleted trip \"{}\"", trip.title),
                json!({}),
            )
            .await;
        self.emitter.emit(
            trip_id,
            RelayEvent::TripUpdated,
            json!({ "action": "deleted", "tripId": trip_id }),
        );
        Ok(())
    }

    pub async fn bulk_archive(&self, user_id: Uuid, trip_ids: &[Uuid]) -> AppResult<BulkSummary> {
        check_trip_ids(trip_ids)?;

        let mut results = Vec::with_capacity(trip_ids.len());
        for &trip_id in trip_ids {
            let result = match self.prepare(BulkAction::Archive, trip_id, user_id).await {
                Ok(None) => match self.trip_repo.archive(trip_id).await {
                    Ok(true) => {
                        self.after_bulk_change(trip_id, user_id, kinds::TRIP_ARCHIVED, "Archived trip")
                            .await;
                        BulkItemResult::applied(trip_id)
                    }
                    // Archived by someone else since the check
                    Ok(false) => BulkItemResult::skipped(trip_id, super::bulk::REASON_ALREADY_ARCHIVED),
                    Err(e) => {
                        error!("Bulk archive failed for trip {}: {}", trip_id, e);
                        BulkItemResult::failed(trip_id, "Failed to archive trip")
                    }
                },
                Ok(Some(result)) => result,
                Err(e) => {
                    error!("Bulk archive lookup failed for trip {}: {}", trip_id, e);
                    BulkItemResult::failed(trip_id, "Failed to archive trip")
                }
            };
            results.push(result);
        }

        let summary = BulkSummary::from_results(BulkAction::Archive, results);
        info!(
            "Bulk archive by {}: {} processed, {} failed",
            user_id, summary.processed, summary.failed
        );
        Ok(summary)
    }

    pub async fn bulk_delete(&self, user_id: Uuid, trip_ids: &[Uuid]) -> AppResult<BulkSummary> {
        check_trip_ids(trip_ids)?;

        let mut results = Vec::with_capacity(trip_ids.len());
        for &trip_id in trip_ids {
            let result = match self.prepare(BulkAction::Delete, trip_id, user_id).await {
                Ok(None) => match self.trip_repo.soft_delete(trip_id).await {
                    Ok(true) => {
                        self.after_bulk_change(trip_id, user_id, kinds::TRIP_DELETED, "Deleted trip")
                            .await;
                        BulkItemResult::applied(trip_id)
                    }
                    Ok(false) => BulkItemResult::failed(trip_id, super::bulk::ERROR_NOT_FOUND),
                    Err(e) => {
                        error!("Bulk delete failed for trip {}: {}", trip_id, e);
                        BulkItemResult::failed(trip_id, "Failed to delete trip")
                    }
                },
                Ok(Some(result)) => result,
                Err(e) => {
                    error!("Bulk delete lookup failed for trip {}: {}", trip_id, e);
                    BulkItemResult::failed(trip_id, "Failed to delete trip")
                }
            };
            results.push(result);
        }

        let summary = BulkSummary::from_results(BulkAction::Delete, results);
        info!(
            "Bulk delete by {}: {} processed, {} failed",
            user_id, summary.processed, summary.failed
        );
        Ok(summary)
    }

    pub async fn bulk_tag(&self, user_id: Uuid, request: &BulkTagRequest) -> AppResult<BulkSummary> {
        check_trip_ids(&request.trip_ids)?;

        let mut v = Validator::new();
        v.check(
            request.mode == TagMode::Replace || !request.tags.is_empty(),
            "tags",
            "At least one tag is required",
        )
        .check(
            request.tags.len() <= MAX_TAGS,
            "tags",
            format!("At most {} tags allowed", MAX_TAGS),
        )
        .check(
            request
                .tags
                .iter()
                .all(|t| !t.trim().is_empty() && t.trim().chars().count() <= MAX_TAG_LEN),
            "tags",
            format!("Tags must be 1 to {} characters", MAX_TAG_LEN),
        );
        v.finish()?;

        let mut results = Vec::with_capacity(request.trip_ids.len());
        for &trip_id in &request.trip_ids {
            let result = match self.load_for_bulk(BulkAction::Tag, trip_id, user_id).await {
                Ok((Some(trip), BulkDecision::Apply)) => {
                    let tags = apply_tags(&trip.tags, &request.tags, request.mode);
                    match self.trip_repo.set_tags(trip_id, &tags).await {
                        Ok(true) => {
                            self.after_bulk_change(trip_id, user_id, kinds::TRIP_TAGGED, "Updated tags of trip")
                                .await;
                            BulkItemResult::applied(trip_id)
                        }
                        Ok(false) => BulkItemResult::failed(trip_id, super::bulk::ERROR_NOT_FOUND),
                        Err(e) => {
                            error!("Bulk tag failed for trip {}: {}", trip_id, e);
                            BulkItemResult::failed(trip_id, "Failed to tag trip")
                        }
                    }
                }
                Ok((_, decision)) => decision_result(trip_id, decision),
                Err(e) => {
                    error!("Bulk tag lookup failed for trip {}: {}", trip_id, e);
                    BulkItemResult::failed(trip_id, "Failed to tag trip")
                }
            };
            results.push(result);
        }

        Ok(BulkSummary::from_results(BulkAction::Tag, results))
    }

    /// `Ok(None)` when the item should be applied, otherwise its final result
    async fn prepare(
        &self,
        action: BulkAction,
        trip_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<BulkItemResult>> {
        match self.load_for_bulk(action, trip_id, user_id).await? {
            (_, BulkDecision::Apply) => Ok(None),
            (_, decision) => Ok(Some(decision_result(trip_id, decision))),
        }
    }

    async fn load_for_bulk(
        &self,
        action: BulkAction,
        trip_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<(Option<Trip>, BulkDecision)> {
        let trip = self.trip_repo.find_by_id(trip_id).await?;
        let access = match &trip {
            Some(trip) => self.access.access_for(trip, user_id).await?,
            None => TripAccess::none(),
        };
        let decision = decide(action, trip.as_ref(), &access);
        Ok((trip, decision))
    }

    async fn after_bulk_change(&self, trip_id: Uuid, user_id: Uuid, kind: &str, summary: &str) {
        self.activity
            .record(trip_id, user_id, kind, summary, json!({ "bulk": true }))
            .await;
        self.emitter.emit(
            trip_id,
            RelayEvent::TripUpdated,
            json!({ "action": kind, "tripId": trip_id }),
        );
    }
}

fn decision_result(trip_id: Uuid, decision: BulkDecision) -> BulkItemResult {
    match decision {
        BulkDecision::Apply => BulkItemResult::applied(trip_id),
        BulkDecision::Skip(reason) => BulkItemResult::skipped(trip_id, reason),
        BulkDecision::Reject(error) => BulkItemResult::failed(trip_id, error),
    }
}

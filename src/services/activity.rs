use crate::error::AppResult;
use crate::models::Activity;
use crate::pagination::{Page, PageQuery};
use crate::realtime::{RelayEmitter, RelayEvent};
use crate::repositories::ActivityRepository;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Activity kinds recorded in trip feeds
pub mod kinds {
    pub const TRIP_CREATED: &str = "trip_created";
    pub const TRIP_UPDATED: &str = "trip_updated";
    pub const TRIP_ARCHIVED: &str = "trip_archived";
    pub const TRIP_DELETED: &str = "trip_deleted";
    pub const TRIP_TAGGED: &str = "trip_tagged";
    pub const COLLABORATOR_INVITED: &str = "collaborator_invited";
    pub const COLLABORATOR_JOINED: &str = "collaborator_joined";
    pub const COLLABORATOR_DECLINED: &str = "collaborator_declined";
    pub const COLLABORATOR_UPDATED: &str = "collaborator_updated";
    pub const COLLABORATOR_REMOVED: &str = "collaborator_removed";
    pub const EVENT_CREATED: &str = "event_created";
    pub const EVENT_UPDATED: &str = "event_updated";
    pub const EVENT_DELETED: &str = "event_deleted";
    pub const EVENTS_REORDERED: &str = "events_reordered";
    pub const EXPENSE_CREATED: &str = "expense_created";
    pub const EXPENSE_UPDATED: &str = "expense_updated";
    pub const EXPENSE_DELETED: &str = "expense_deleted";
    pub const BUDGET_UPDATED: &str = "budget_updated";
    pub const IDEA_CREATED: &str = "idea_created";
    pub const IDEA_STATUS_CHANGED: &str = "idea_status_changed";
    pub const POLL_CREATED: &str = "poll_created";
    pub const POLL_CLOSED: &str = "poll_closed";
}

/// Trip activity feed: persists entries and pushes them to the trip room
pub struct ActivityService {
    activity_repo: Arc<ActivityRepository>,
    emitter: RelayEmitter,
}

impl ActivityService {
    pub fn new(activity_repo: Arc<ActivityRepository>, emitter: RelayEmitter) -> Self {
        Self {
            activity_repo,
            emitter,
        }
    }

    /// Record an activity. The mutation it describes has already happened, so a
    /// failure here is logged rather than returned.
    pub async fn record(
        &self,
        trip_id: Uuid,
        actor_id: Uuid,
        kind: &str,
        summary: impl Into<String>,
        metadata: Value,
    ) -> Option<Activity> {
        let summary = summary.into();
        match self
            .activity_repo
            .create(trip_id, Some(actor_id), kind, &summary, &metadata)
            .await
        {
            Ok(activity) => {
                let data = serde_json::to_value(&activity).unwrap_or(Value::Null);
                self.emitter
                    .emit(trip_id, RelayEvent::ActivityCreated, data);
                Some(activity)
            }
            Err(e) => {
                warn!("Failed to record {} activity for trip {}: {}", kind, trip_id, e);
                None
            }
        }
    }

    /// Feed for a trip, newest first. Callers check view access.
    pub async fn list(&self, trip_id: Uuid, query: &PageQuery) -> AppResult<Page<Activity>> {
        let items = self
            .activity_repo
            .list_for_trip(trip_id, query.limit(), query.offset())
            .await?;
        let total = self.activity_repo.count_for_trip(trip_id).await?;
        Ok(Page::new(items, query, total))
    }
}

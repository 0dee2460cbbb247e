use super::activity::{kinds, ActivityService};
use super::AccessService;
use crate::error::{AppError, AppResult};
use crate::models::event::{CreateEvent, ReorderEvents, UpdateEvent};
use crate::models::Event;
use crate::permissions::Permission;
use crate::realtime::{RelayEmitter, RelayEvent};
use crate::repositories::EventRepository;
use crate::validation::Validate;
use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Service for a trip's itinerary events
pub struct ItineraryService {
    event_repo: Arc<EventRepository>,
    access: Arc<AccessService>,
    activity: Arc<ActivityService>,
    emitter: RelayEmitter,
}

impl ItineraryService {
    pub fn new(
        event_repo: Arc<EventRepository>,
        access: Arc<AccessService>,
        activity: Arc<ActivityService>,
        emitter: RelayEmitter,
    ) -> Self {
        Self {
            event_repo,
            access,
            activity,
            emitter,
        }
    }

    pub async fn list(
        &self,
        trip_id: Uuid,
        user_id: Uuid,
        date: Option<NaiveDate>,
    ) -> AppResult<Vec<Event>> {
        self.access.require(trip_id, user_id, Permission::View).await?;
        Ok(self.event_repo.list_for_trip(trip_id, date).await?)
    }

    pub async fn get(&self, trip_id: Uuid, event_id: Uuid, user_id: Uuid) -> AppResult<Event> {
        self.access.require(trip_id, user_id, Permission::View).await?;
        self.find(trip_id, event_id).await
    }

    pub async fn create(&self, trip_id: Uuid, user_id: Uuid, input: &CreateEvent) -> AppResult<Event> {
        input.validate()?;
        self.access.require(trip_id, user_id, Permission::Edit).await?;

        let event = self.event_repo.create(trip_id, user_id, input).await?;
        info!("Created event {} on trip {}", event.id, trip_id);

        self.activity
            .record(
                trip_id,
                user_id,
                kinds::EVENT_CREATED,
                format!("Added \"{}\" on {}", event.title, event.date),
                json!({ "eventId": event.id }),
            )
            .await;
        self.emit(trip_id, json!({ "action": "created", "event": &event }));

        Ok(event)
    }

    pub async fn update(
        &self,
        trip_id: Uuid,
        event_id: Uuid,
        user_id: Uuid,
        changes: &UpdateEvent,
    ) -> AppResult<Event> {
        self.access.require(trip_id, user_id, Permission::Edit).await?;
        let current = self.find(trip_id, event_id).await?;
        changes.validate_against(&current)?;

        let event = self.event_repo.update(trip_id, event_id, changes).await?;

        self.activity
            .record(
                trip_id,
                user_id,
                kinds::EVENT_UPDATED,
                format!("Updated \"{}\"", event.title),
                json!({ "eventId": event.id }),
            )
            .await;
        self.emit(trip_id, json!({ "action": "updated", "event": &event }));

        Ok(event)
    }

    pub async fn delete(&self, trip_id: Uuid, event_id: Uuid, user_id: Uuid) -> AppResult<()> {
        self.access.require(trip_id, user_id, Permission::Edit).await?;
        let event = self.find(trip_id, event_id).await?;

        if !self.event_repo.soft_delete(trip_id, event_id).await? {
            return Err(AppError::NotFound("Event not found".to_string()));
        }

        self.activity
            .record(
                trip_id,
                user_id,
                kinds::EVENT_DELETED,
                format!("Removed \"{}\"", event.title),
                json!({ "eventId": event_id }),
            )
            .await;
        self.emit(trip_id, json!({ "action": "deleted", "eventId": event_id }));
        Ok(())
    }

    /// Apply a batch of position changes atomically and return the new itinerary
    pub async fn reorder(
        &self,
        trip_id: Uuid,
        user_id: Uuid,
        input: &ReorderEvents,
    ) -> AppResult<Vec<Event>> {
        input.validate()?;
        self.access.require(trip_id, user_id, Permission::Edit).await?;

        let events = self.event_repo.reorder(trip_id, &input.items).await?;
        info!(
            "Reordered {} events on trip {}",
            input.items.len(),
            trip_id
        );

        self.activity
            .record(
                trip_id,
                user_id,
                kinds::EVENTS_REORDERED,
                "Reordered the itinerary",
                json!({ "count": input.items.len() }),
            )
            .await;
        self.emit(trip_id, json!({ "action": "reordered", "events": &events }));

        Ok(events)
    }

    async fn find(&self, trip_id: Uuid, event_id: Uuid) -> AppResult<Event> {
        self.event_repo
            .find(trip_id, event_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))
    }

    fn emit(&self, trip_id: Uuid, data: serde_json::Value) {
        self.emitter.emit(trip_id, RelayEvent::EventUpdated, data);
    }
}

use super::{created, success};
use crate::api::ApiJson;
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::models::event::{CreateEvent, ReorderEvents, UpdateEvent};
use crate::models::Event;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct EventDayQuery {
    pub date: Option<NaiveDate>,
}

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(trip_id): Path<Uuid>,
    Query(query): Query<EventDayQuery>,
) -> AppResult<Json<Vec<Event>>> {
    Ok(Json(
        state.itinerary.list(trip_id, user.id, query.date).await?,
    ))
}

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(trip_id): Path<Uuid>,
    ApiJson(body): ApiJson<CreateEvent>,
) -> AppResult<(StatusCode, Json<Event>)> {
    Ok(created(state.itinerary.create(trip_id, user.id, &body).await?))
}

pub async fn get_event(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((trip_id, event_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<Event>> {
    Ok(Json(state.itinerary.get(trip_id, event_id, user.id).await?))
}

pub async fn update_event(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((trip_id, event_id)): Path<(Uuid, Uuid)>,
    ApiJson(body): ApiJson<UpdateEvent>,
) -> AppResult<Json<Event>> {
    Ok(Json(
        state
            .itinerary
            .update(trip_id, event_id, user.id, &body)
            .await?,
    ))
}

pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((trip_id, event_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<Value>> {
    state.itinerary.delete(trip_id, event_id, user.id).await?;
    Ok(success())
}

/// Applies every position in one transaction and returns the trip's events in the new order
pub async fn reorder_events(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(trip_id): Path<Uuid>,
    ApiJson(body): ApiJson<ReorderEvents>,
) -> AppResult<Json<Vec<Event>>> {
    Ok(Json(state.itinerary.reorder(trip_id, user.id, &body).await?))
}

use super::created;
use crate::api::ApiJson;
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::models::poll::{CastVote, CreatePoll};
use crate::models::PollResults;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use uuid::Uuid;

pub async fn list_polls(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(trip_id): Path<Uuid>,
) -> AppResult<Json<Vec<PollResults>>> {
    Ok(Json(state.polls.list(trip_id, user.id).await?))
}

pub async fn create_poll(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(trip_id): Path<Uuid>,
    ApiJson(body): ApiJson<CreatePoll>,
) -> AppResult<(StatusCode, Json<PollResults>)> {
    Ok(created(state.polls.create(trip_id, user.id, &body).await?))
}

pub async fn get_poll(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((trip_id, poll_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<PollResults>> {
    Ok(Json(state.polls.get(trip_id, poll_id, user.id).await?))
}

pub async fn vote_poll(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((trip_id, poll_id)): Path<(Uuid, Uuid)>,
    ApiJson(body): ApiJson<CastVote>,
) -> AppResult<Json<PollResults>> {
    Ok(Json(
        state.polls.vote(trip_id, poll_id, user.id, &body).await?,
    ))
}

pub async fn close_poll(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((trip_id, poll_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<PollResults>> {
    Ok(Json(state.polls.close(trip_id, poll_id, user.id).await?))
}

use super::{created, success};
use crate::api::ApiJson;
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::models::idea::{CreateIdea, UpdateIdeaStatus};
use crate::models::Idea;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

pub async fn list_ideas(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(trip_id): Path<Uuid>,
) -> AppResult<Json<Vec<Idea>>> {
    Ok(Json(state.ideas.list(trip_id, user.id).await?))
}

pub async fn create_idea(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(trip_id): Path<Uuid>,
    ApiJson(body): ApiJson<CreateIdea>,
) -> AppResult<(StatusCode, Json<Idea>)> {
    Ok(created(state.ideas.create(trip_id, user.id, &body).await?))
}

pub async fn update_idea_status(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((trip_id, idea_id)): Path<(Uuid, Uuid)>,
    ApiJson(body): ApiJson<UpdateIdeaStatus>,
) -> AppResult<Json<Idea>> {
    Ok(Json(
        state
            .ideas
            .set_status(trip_id, idea_id, user.id, &body)
            .await?,
    ))
}

/// Adds the caller's vote, or removes it if already cast
pub async fn vote_idea(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((trip_id, idea_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<Idea>> {
    Ok(Json(state.ideas.toggle_vote(trip_id, idea_id, user.id).await?))
}

pub async fn delete_idea(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((trip_id, idea_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<Value>> {
    state.ideas.delete(trip_id, idea_id, user.id).await?;
    Ok(success())
}

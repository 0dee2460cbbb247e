use super::{created, success};
use crate::api::ApiJson;
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::models::collaborator::{InviteCollaborator, UpdateCollaboratorRole};
use crate::models::{Collaborator, CollaboratorWithUser, Invitation};
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

pub async fn list_collaborators(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(trip_id): Path<Uuid>,
) -> AppResult<Json<Vec<CollaboratorWithUser>>> {
    Ok(Json(state.collaborators.list(trip_id, user.id).await?))
}

pub async fn invite_collaborator(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(trip_id): Path<Uuid>,
    ApiJson(body): ApiJson<InviteCollaborator>,
) -> AppResult<(StatusCode, Json<Collaborator>)> {
    Ok(created(
        state.collaborators.invite(trip_id, user.id, &body).await?,
    ))
}

pub async fn update_collaborator(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((trip_id, collaborator_id)): Path<(Uuid, Uuid)>,
    ApiJson(body): ApiJson<UpdateCollaboratorRole>,
) -> AppResult<Json<Collaborator>> {
    let collaborator = state
        .collaborators
        .update_role(trip_id, collaborator_id, user.id, &body)
        .await?;
    Ok(Json(collaborator))
}

pub async fn remove_collaborator(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((trip_id, collaborator_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<Value>> {
    state
        .collaborators
        .remove(trip_id, collaborator_id, user.id)
        .await?;
    Ok(success())
}

/// Pending invitations addressed to the caller
pub async fn list_invitations(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Invitation>>> {
    Ok(Json(state.collaborators.pending_invitations(user.id).await?))
}

pub async fn accept_invitation(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(collaborator_id): Path<Uuid>,
) -> AppResult<Json<Collaborator>> {
    Ok(Json(
        state
            .collaborators
            .respond(collaborator_id, user.id, true)
            .await?,
    ))
}

pub async fn decline_invitation(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(collaborator_id): Path<Uuid>,
) -> AppResult<Json<Collaborator>> {
    Ok(Json(
        state
            .collaborators
            .respond(collaborator_id, user.id, false)
            .await?,
    ))
}

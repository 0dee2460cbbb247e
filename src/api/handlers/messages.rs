use super::{created, success};
use crate::api::ApiJson;
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::models::message::{CreateMessage, MessageQuery};
use crate::models::Message;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Newest first; pass the oldest `createdAt` seen as `before` to page back
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(trip_id): Path<Uuid>,
    Query(query): Query<MessageQuery>,
) -> AppResult<Json<Vec<Message>>> {
    Ok(Json(state.messages.list(trip_id, user.id, &query).await?))
}

pub async fn post_message(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(trip_id): Path<Uuid>,
    ApiJson(body): ApiJson<CreateMessage>,
) -> AppResult<(StatusCode, Json<Message>)> {
    Ok(created(state.messages.post(trip_id, user.id, &body).await?))
}

pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((trip_id, message_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<Value>> {
    state.messages.delete(trip_id, message_id, user.id).await?;
    Ok(success())
}

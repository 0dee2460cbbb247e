//! Internal HTTP surface of the relay: the API server posts here to push
//! events into rooms.

use super::protocol::{room_for_trip, EmitRequest, Frame, RelayEvent};
use super::relay::RelayServer;
use crate::error::{AppError, AppResult};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

pub const RELAY_SECRET_HEADER: &str = "x-relay-secret";

pub struct RelayHttpState {
    pub server: RelayServer,
    pub secret: Option<String>,
}

pub fn router(server: RelayServer, secret: Option<String>) -> Router {
    let state = Arc::new(RelayHttpState { server, secret });
    Router::new()
        .route("/emit", post(emit))
        .route("/health", get(health))
        .with_state(state)
}

async fn emit(
    State(state): State<Arc<RelayHttpState>>,
    headers: HeaderMap,
    Json(request): Json<EmitRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    if let Some(secret) = &state.secret {
        let provided = headers
            .get(RELAY_SECRET_HEADER)
            .and_then(|value| value.to_str().ok());
        if provided != Some(secret.as_str()) {
            return Err(AppError::Unauthorized("Invalid relay secret".to_string()));
        }
    }

    let event = RelayEvent::from_str(&request.event)
        .filter(RelayEvent::is_room_broadcast)
        .ok_or_else(|| AppError::BadRequest(format!("Unsupported event: {}", request.event)))?;
    if request.trip_id.trim().is_empty() {
        return Err(AppError::invalid_field("tripId", "Required"));
    }

    let room = room_for_trip(request.trip_id.trim());
    let mut data = request.data;
    if let Value::Object(map) = &mut data {
        map.entry("tripId")
            .or_insert_with(|| Value::String(request.trip_id.trim().to_string()));
    }

    let recipients = state
        .server
        .publish(&room, Frame::new(event, data), None)
        .await;
    info!("Emitted {} to {} ({} recipients)", event.as_str(), room, recipients);

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "room": room, "recipients": recipients })),
    ))
}

async fn health(State(state): State<Arc<RelayHttpState>>) -> Json<Value> {
    let stats = state.server.stats().await;
    Json(json!({
        "status": "ok",
        "connections": stats.connections,
        "rooms": stats.rooms,
    }))
}

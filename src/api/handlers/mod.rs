//! HTTP handlers. Each one extracts the caller and input, then delegates to a service.

pub mod activity;
pub mod auth;
pub mod collaborators;
pub mod crm;
pub mod expenses;
pub mod export;
pub mod ideas;
pub mod itinerary;
pub mod landing_pages;
pub mod messages;
pub mod notifications;
pub mod polls;
pub mod trips;

use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;

/// `{ "success": true }` for mutations with nothing else to report
pub(crate) fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}

pub(crate) fn created<T>(body: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(body))
}

/// Liveness plus a database round trip
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let database_up = state.database.is_healthy().await;
    Json(json!({
        "status": if database_up { "ok" } else { "degraded" },
        "database": if database_up { "up" } else { "down" },
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

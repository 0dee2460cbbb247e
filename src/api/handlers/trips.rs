//! Trip CRUD and bulk handlers

use super::{created, success};
use crate::api::ApiJson;
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::models::trip::{CreateTrip, UpdateTrip};
use crate::models::{Trip, TripStatusFilter};
use crate::pagination::{Page, PageQuery};
use crate::repositories::TripListFilter;
use crate::services::{BulkSummary, BulkTagRequest, BulkTripRequest, TripDetails};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// `GET /api/trips` query string
#[derive(Debug, Default, Deserialize)]
pub struct TripListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub status: TripStatusFilter,
    pub search: Option<String>,
    pub tag: Option<String>,
}

impl TripListQuery {
    fn split(self) -> (TripListFilter, PageQuery) {
        let non_blank = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        (
            TripListFilter {
                status: self.status,
                search: non_blank(self.search),
                tag: non_blank(self.tag).map(|t| t.to_lowercase()),
            },
            PageQuery {
                page: self.page,
                limit: self.limit,
            },
        )
    }
}

pub async fn list_trips(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<TripListQuery>,
) -> AppResult<Json<Page<Trip>>> {
    let (filter, page) = query.split();
    Ok(Json(state.trips.list(user.id, &filter, &page).await?))
}

pub async fn create_trip(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(body): ApiJson<CreateTrip>,
) -> AppResult<(StatusCode, Json<TripDetails>)> {
    Ok(created(state.trips.create(user.id, &body).await?))
}

pub async fn get_trip(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(trip_id): Path<Uuid>,
) -> AppResult<Json<TripDetails>> {
    Ok(Json(state.trips.get(trip_id, user.id).await?))
}

pub async fn update_trip(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(trip_id): Path<Uuid>,
    ApiJson(body): ApiJson<UpdateTrip>,
) -> AppResult<Json<TripDetails>> {
    Ok(Json(state.trips.update(trip_id, user.id, &body).await?))
}

pub async fn delete_trip(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(trip_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    state.trips.delete(trip_id, user.id).await?;
    Ok(success())
}

/// 200 when every item succeeded, 207 when some failed
fn bulk_response(summary: BulkSummary) -> impl IntoResponse {
    let status = StatusCode::from_u16(summary.status_code()).unwrap_or(StatusCode::OK);
    (status, Json(summary))
}

pub async fn bulk_archive(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(body): ApiJson<BulkTripRequest>,
) -> AppResult<impl IntoResponse> {
    let summary = state.trips.bulk_archive(user.id, &body.trip_ids).await?;
    Ok(bulk_response(summary))
}

pub async fn bulk_delete(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(body): ApiJson<BulkTripRequest>,
) -> AppResult<impl IntoResponse> {
    let summary = state.trips.bulk_delete(user.id, &body.trip_ids).await?;
    Ok(bulk_response(summary))
}

pub async fn bulk_tag(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(body): ApiJson<BulkTagRequest>,
) -> AppResult<impl IntoResponse> {
    let summary = state.trips.bulk_tag(user.id, &body).await?;
    Ok(bulk_response(summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_trims_and_lowercases_filters() {
        let query = TripListQuery {
            page: Some(2),
            limit: Some(5),
            status: TripStatusFilter::All,
            search: Some("  porto ".into()),
            tag: Some(" Beach ".into()),
        };
        let (filter, page) = query.split();
        assert_eq!(filter.status, TripStatusFilter::All);
        assert_eq!(filter.search.as_deref(), Some("porto"));
        assert_eq!(filter.tag.as_deref(), Some("beach"));
        assert_eq!(page.offset(), 5);
    }

    #[test]
    fn blank_filters_are_dropped() {
        let query = TripListQuery {
            search: Some("   ".into()),
            ..Default::default()
        };
        let (filter, _) = query.split();
        assert_eq!(filter.status, TripStatusFilter::Active);
        assert!(filter.search.is_none());
        assert!(filter.tag.is_none());
    }
}

use super::{created, success};
use crate::api::ApiJson;
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::models::landing_page::{CreateLandingPage, UpdateLandingPage};
use crate::models::LandingPage;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

pub async fn list_pages(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> AppResult<Json<Vec<LandingPage>>> {
    Ok(Json(state.landing_pages.list(user.id).await?))
}

pub async fn create_page(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ApiJson(body): ApiJson<CreateLandingPage>,
) -> AppResult<(StatusCode, Json<LandingPage>)> {
    Ok(created(state.landing_pages.create(user.id, &body).await?))
}

pub async fn get_page(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<LandingPage>> {
    Ok(Json(state.landing_pages.get(user.id, id).await?))
}

pub async fn update_page(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<UpdateLandingPage>,
) -> AppResult<Json<LandingPage>> {
    Ok(Json(state.landing_pages.update(user.id, id, &body).await?))
}

pub async fn delete_page(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    state.landing_pages.delete(user.id, id).await?;
    Ok(success())
}

pub async fn publish_page(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<LandingPage>> {
    Ok(Json(
        state.landing_pages.set_published(user.id, id, true).await?,
    ))
}

pub async fn unpublish_page(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<LandingPage>> {
    Ok(Json(
        state.landing_pages.set_published(user.id, id, false).await?,
    ))
}

/// Unauthenticated; drafts are indistinguishable from missing pages
pub async fn public_page(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> AppResult<Json<LandingPage>> {
    Ok(Json(state.landing_pages.public(&slug).await?))
}

use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::models::Activity;
use crate::pagination::{Page, PageQuery};
use crate::permissions::Permission;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use std::sync::Arc;
use uuid::Uuid;

/// Most recent first
pub async fn list_activity(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(trip_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<Activity>>> {
    state
        .access
        .require(trip_id, user.id, Permission::View)
        .await?;
    Ok(Json(state.activity.list(trip_id, &query).await?))
}

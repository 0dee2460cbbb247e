use super::success;
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::models::Notification;
use crate::pagination::{Page, PageQuery};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<Page<Notification>>> {
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    Ok(Json(
        state
            .notifications
            .list(user.id, query.unread_only, &page)
            .await?,
    ))
}

pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> AppResult<Json<Value>> {
    let count = state.notifications.unread_count(user.id).await?;
    Ok(Json(json!({ "count": count })))
}

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(notification_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    state.notifications.mark_read(user.id, notification_id).await?;
    Ok(success())
}

pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> AppResult<Json<Value>> {
    let updated = state.notifications.mark_all_read(user.id).await?;
    debug!("Marked {} notifications read for {}", updated, user.id);
    Ok(Json(json!({ "success": true, "updated": updated })))
}

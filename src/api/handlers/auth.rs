use crate::api::ApiJson;
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::models::user::{LoginRequest, RegisterUser};
use crate::models::User;
use crate::AppState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Response for a freshly issued session: cookie plus the token for bearer clients
fn session_response(state: &AppState, status: StatusCode, user: &User) -> AppResult<impl IntoResponse> {
    let token = state.sessions.issue(user.id)?;
    let cookie = state.sessions.session_cookie(&token);
    Ok((
        status,
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "user": user, "token": token })),
    ))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<RegisterUser>,
) -> AppResult<impl IntoResponse> {
    let user = state.auth.register(&body).await?;
    session_response(&state, StatusCode::CREATED, &user)
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let user = state.auth.login(&body).await?;
    info!("User {} signed in", user.id);
    session_response(&state, StatusCode::OK, &user)
}

/// Sessions are stateless; signing out only clears the cookie
pub async fn logout(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, state.sessions.clear_cookie())],
        super::success(),
    )
}

pub async fn session(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> AppResult<Json<serde_json::Value>> {
    let user = state.auth.current_user(user.id).await?;
    Ok(Json(json!({ "user": user })))
}

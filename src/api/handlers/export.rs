use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::export::PDF_CONTENT_TYPE;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use std::sync::Arc;
use uuid::Uuid;

/// Itinerary, expense total and budget as a downloadable PDF
pub async fn export_trip_pdf(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(trip_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let file = state.exports.trip_pdf(trip_id, user.id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, PDF_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, file.content_disposition),
        ],
        file.bytes,
    ))
}

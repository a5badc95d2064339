//! Public Board routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use crate::routes::{error_response, image_response};
use crate::services::board;
use crate::services::notice::Notice;
use crate::services::store::StoreError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct NoticeListResponse {
    pub notices: Vec<Notice>,
    /// True when there is nothing to show and the "no notices" placeholder
    /// should render instead.
    pub empty: bool,
}

pub(crate) async fn notice_list(state: &AppState) -> Result<Json<NoticeListResponse>, Response> {
    let notices = board::list_notices(state).await.map_err(|e| store_error_response(&e))?;
    let empty = notices.is_empty();
    Ok(Json(NoticeListResponse { notices, empty }))
}

/// `GET /api/notices` — the ordered notice list.
pub async fn list_notices(State(state): State<AppState>) -> Result<Json<NoticeListResponse>, Response> {
    notice_list(&state).await
}

/// `GET /api/images/:digest` — a stored notice image.
pub async fn get_image(State(state): State<AppState>, Path(digest): Path<String>) -> Response {
    match state.images.get(&digest) {
        Some(image) => image_response(image),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub(crate) fn store_error_response(err: &StoreError) -> Response {
    tracing::error!(error = %err, "notice store failure");
    error_response(StatusCode::SERVICE_UNAVAILABLE, err)
}

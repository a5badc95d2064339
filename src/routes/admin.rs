//! Admin surface routes — notice deletion, emergency alerts, statistics.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use crate::config::parse_bool;
use crate::routes::auth::OperatorSession;
use crate::routes::board::{NoticeListResponse, notice_list, store_error_response};
use crate::routes::error_response;
use crate::services::alert::{self, Alert};
use crate::services::board::{self, BoardStats, DELETE_CONFIRMATION_PROMPT};
use crate::state::AppState;

/// `GET /api/admin/notices` — the same list the Board shows.
pub async fn list_notices(
    State(state): State<AppState>,
    _session: OperatorSession,
) -> Result<Json<NoticeListResponse>, Response> {
    notice_list(&state).await
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: Option<String>,
}

impl DeleteQuery {
    /// `true`, `yes`, `on` or `1` in any case; anything else is a decline.
    #[must_use]
    pub fn confirmed(&self) -> bool {
        self.confirm.as_deref().and_then(parse_bool).unwrap_or(false)
    }
}

/// `DELETE /api/admin/notices/:id?confirm=true` — delete one notice.
///
/// Without an affirmative `confirm` nothing is removed and the confirmation
/// prompt is returned with `428 Precondition Required`.
pub async fn delete_notice(
    State(state): State<AppState>,
    session: OperatorSession,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Response {
    if !query.confirmed() {
        return confirmation_required();
    }

    match board::delete_notice(&state, &id).await {
        Ok(removed) => {
            tracing::info!(%id, removed = removed.is_some(), by = %session.operator.username, "admin delete");
            Json(serde_json::json!({ "removed": removed.is_some() })).into_response()
        }
        Err(e) => store_error_response(&e),
    }
}

pub(crate) fn confirmation_required() -> Response {
    (
        StatusCode::PRECONDITION_REQUIRED,
        Json(serde_json::json!({
            "code": "E_CONFIRMATION_REQUIRED",
            "message": DELETE_CONFIRMATION_PROMPT,
        })),
    )
        .into_response()
}

#[derive(Deserialize)]
pub struct SendAlertBody {
    pub message: String,
}

#[derive(serde::Serialize)]
pub struct SendAlertResponse {
    pub confirmation: String,
    pub alert: Alert,
}

/// `POST /api/admin/alerts` — broadcast an emergency alert to the Board.
pub async fn send_alert(
    State(state): State<AppState>,
    session: OperatorSession,
    Json(body): Json<SendAlertBody>,
) -> Response {
    match alert::send_alert(&state, &body.message, &session.operator.username).await {
        Ok(alert) => Json(SendAlertResponse { confirmation: alert.confirmation(), alert }).into_response(),
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e),
    }
}

/// `GET /api/admin/stats` — notice count and last change date.
pub async fn stats(State(state): State<AppState>, _session: OperatorSession) -> Result<Json<BoardStats>, Response> {
    board::stats(&state)
        .await
        .map(Json)
        .map_err(|e| store_error_response(&e))
}

#[cfg(test)]
#[path = "admin_test.rs"]
mod tests;

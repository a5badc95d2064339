//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router serves all three surfaces over the shared state:
//! the public Board (`/api/notices`, `/api/board/ws`, `/api/images`), the
//! Admin surface (`/api/admin/*`) and the Editor surface (`/api/editor/*`,
//! `/api/previews`). Admin and Editor handlers take an `OperatorSession`
//! extractor, which is the session gate.

pub mod admin;
pub mod auth;
pub mod board;
pub mod editor;
pub mod ws;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::frame::{ErrorCode, error_data};
use crate::services::images::ImageFile;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/api/notices", get(board::list_notices))
        .route("/api/board/ws", get(ws::handle_ws))
        .route("/api/images/{digest}", get(board::get_image))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/admin/notices", get(admin::list_notices))
        .route("/api/admin/notices/{id}", delete(admin::delete_notice))
        .route("/api/admin/alerts", post(admin::send_alert))
        .route("/api/admin/stats", get(admin::stats))
        .route(
            "/api/editor/draft",
            get(editor::get_draft)
                .put(editor::update_draft)
                .delete(editor::reset_draft),
        )
        .route("/api/editor/draft/image", put(editor::select_image).delete(editor::clear_image))
        .route("/api/editor/validate", post(editor::validate))
        .route("/api/editor/submit", post(editor::submit))
        .route("/api/previews/{token}", get(editor::get_preview))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// JSON `{code, message, retryable}` body for a typed error.
pub(crate) fn error_response(status: StatusCode, err: &(impl ErrorCode + ?Sized)) -> Response {
    (status, Json(error_data(err))).into_response()
}

pub(crate) fn image_response(image: ImageFile) -> Response {
    ([(CONTENT_TYPE, image.mime)], image.bytes).into_response()
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

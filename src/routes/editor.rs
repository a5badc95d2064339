//! Editor surface routes — the per-session draft, validation, and submission.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use crate::frame::ErrorCode;
use crate::routes::auth::OperatorSession;
use crate::routes::{error_response, image_response};
use crate::services::draft::{self, Draft, DraftError, DraftView, SubmitError};
use crate::services::images::ImageFile;
use crate::services::validation::{self, FieldErrors, FileInfo};
use crate::state::AppState;

// =============================================================================
// DRAFT
// =============================================================================

/// Run `f` against the session's draft, creating it on first use.
async fn with_draft<T>(state: &AppState, session: &OperatorSession, f: impl FnOnce(&mut Draft) -> T) -> T {
    let mut drafts = state.drafts.write().await;
    f(drafts.entry(session.token.clone()).or_default())
}

fn draft_error_response(err: &DraftError, view: DraftView) -> Response {
    let status = match err {
        DraftError::Pending => StatusCode::CONFLICT,
        DraftError::File(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    let body = serde_json::json!({
        "code": err.error_code(),
        "message": err.to_string(),
        "draft": view,
    });
    (status, Json(body)).into_response()
}

fn draft_result(result: Result<(), DraftError>, view: DraftView) -> Response {
    match result {
        Ok(()) => Json(view).into_response(),
        Err(e) => draft_error_response(&e, view),
    }
}

/// `GET /api/editor/draft`
pub async fn get_draft(State(state): State<AppState>, session: OperatorSession) -> Json<DraftView> {
    Json(with_draft(&state, &session, |draft| draft.view()).await)
}

#[derive(Deserialize)]
pub struct DraftFields {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// `PUT /api/editor/draft` — replace the text fields and revalidate.
pub async fn update_draft(
    State(state): State<AppState>,
    session: OperatorSession,
    Json(fields): Json<DraftFields>,
) -> Response {
    let (result, view) = with_draft(&state, &session, |draft| {
        let result = draft.set_fields(fields.title, fields.description);
        (result, draft.view())
    })
    .await;
    draft_result(result, view)
}

/// `DELETE /api/editor/draft` — back to the empty form.
pub async fn reset_draft(State(state): State<AppState>, session: OperatorSession) -> Response {
    let (result, view) = with_draft(&state, &session, |draft| (draft.reset(), draft.view())).await;
    draft_result(result, view)
}

/// `PUT /api/editor/draft/image` — raw image body, type from `Content-Type`.
pub async fn select_image(
    State(state): State<AppState>,
    session: OperatorSession,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mime = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    let file = ImageFile::new(mime, body);

    let previews = state.previews.clone();
    let (result, view) = with_draft(&state, &session, |draft| {
        let result = draft.select_file(&previews, &session.token, file);
        (result, draft.view())
    })
    .await;
    if let Err(e) = &result {
        tracing::debug!(error = %e, "image selection rejected");
    }
    draft_result(result, view)
}

/// `DELETE /api/editor/draft/image`
pub async fn clear_image(State(state): State<AppState>, session: OperatorSession) -> Response {
    let (result, view) = with_draft(&state, &session, |draft| (draft.clear_file(), draft.view())).await;
    draft_result(result, view)
}

// =============================================================================
// VALIDATION
// =============================================================================

#[derive(Deserialize)]
pub struct FileDescriptor {
    pub mime: String,
    pub size: usize,
}

#[derive(Deserialize)]
pub struct ValidateBody {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub file: Option<FileDescriptor>,
}

#[derive(serde::Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub errors: FieldErrors,
}

/// `POST /api/editor/validate` — stateless check of arbitrary values.
pub async fn validate(_session: OperatorSession, Json(body): Json<ValidateBody>) -> Json<ValidateResponse> {
    let file = body.file.as_ref().map(|f| FileInfo { mime: &f.mime, size: f.size });
    let errors = validation::validate(&body.title, &body.description, file);
    Json(ValidateResponse { valid: errors.is_empty(), errors })
}

// =============================================================================
// SUBMISSION
// =============================================================================

/// `POST /api/editor/submit`
pub async fn submit(State(state): State<AppState>, session: OperatorSession) -> Response {
    match draft::submit_detached(&state, &session.token).await {
        Ok(notice) => (StatusCode::CREATED, Json(notice)).into_response(),
        Err(e) => submit_error_response(&e),
    }
}

fn submit_error_response(err: &SubmitError) -> Response {
    match err {
        SubmitError::Invalid(errors) => {
            tracing::debug!(errors = errors.len(), "submission failed validation");
            let body = serde_json::json!({
                "code": err.error_code(),
                "message": err.to_string(),
                "errors": errors,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
        }
        SubmitError::AlreadyPending => error_response(StatusCode::CONFLICT, err),
        SubmitError::Store(_) => error_response(StatusCode::SERVICE_UNAVAILABLE, err),
        SubmitError::Task(_) => {
            tracing::error!(error = %err, "submission task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err)
        }
    }
}

// =============================================================================
// PREVIEW
// =============================================================================

/// `GET /api/previews/:token` — the image behind one of this session's live
/// preview handles. Another session's token is a 404.
pub async fn get_preview(
    State(state): State<AppState>,
    session: OperatorSession,
    Path(token): Path<String>,
) -> Response {
    match state.previews.get(&token, &session.token) {
        Some(image) => image_response(image),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
#[path = "editor_test.rs"]
mod tests;

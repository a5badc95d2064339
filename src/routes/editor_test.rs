use super::*;
use crate::services::session::Operator;
use crate::services::validation::MAX_IMAGE_BYTES;
use crate::state::test_helpers::{self, FlakyStore};
use axum::http::HeaderValue;
use serde_json::Value;
use std::sync::Arc;

async fn operator_session(state: &AppState) -> OperatorSession {
    let operator = Operator { username: test_helpers::TEST_USER.into() };
    let token = state.sessions.create(operator.clone()).await;
    OperatorSession { operator, token }
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should read");
    serde_json::from_slice(&bytes).expect("body should be json")
}

fn content_type(mime: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_str(mime).expect("valid header"));
    headers
}

fn same_session(session: &OperatorSession) -> OperatorSession {
    OperatorSession { operator: session.operator.clone(), token: session.token.clone() }
}

async fn fill(state: &AppState, session: &OperatorSession, title: &str, description: &str) -> Response {
    update_draft(
        State(state.clone()),
        same_session(session),
        Json(DraftFields { title: title.into(), description: description.into() }),
    )
    .await
}

// =============================================================================
// DRAFT FIELDS
// =============================================================================

#[tokio::test]
async fn new_draft_is_empty_and_idle() {
    let state = test_helpers::test_app_state();
    let session = operator_session(&state).await;

    let Json(view) = get_draft(State(state.clone()), session).await;
    assert_eq!(view.title, "");
    assert!(view.preview_url.is_none());
    assert_eq!(view.phase, draft::SubmitPhase::Idle);
}

#[tokio::test]
async fn update_draft_reports_live_errors_and_counts() {
    let state = test_helpers::test_app_state();
    let session = operator_session(&state).await;

    let response = fill(&state, &session, &"x".repeat(101), "  ").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["title_chars"], 101);
    assert_eq!(body["errors"]["title"]["code"], "too_long");
    assert_eq!(body["errors"]["description"]["code"], "required");
}

#[tokio::test]
async fn drafts_are_isolated_per_session() {
    let state = test_helpers::test_app_state();
    let first = operator_session(&state).await;
    let second = operator_session(&state).await;

    fill(&state, &first, "Mine", "Only mine").await;
    let Json(view) = get_draft(State(state.clone()), second).await;
    assert_eq!(view.title, "");
}

// =============================================================================
// IMAGE SELECTION
// =============================================================================

#[tokio::test]
async fn select_image_creates_servable_preview() {
    let state = test_helpers::test_app_state();
    let session = operator_session(&state).await;

    let response = select_image(
        State(state.clone()),
        same_session(&session),
        content_type("image/png"),
        Bytes::from_static(b"png-bytes"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let url = body["preview_url"].as_str().expect("preview url").to_owned();
    let token = url.trim_start_matches(crate::services::preview::PREVIEW_URL_PREFIX).to_owned();

    let preview = get_preview(State(state.clone()), same_session(&session), Path(token.clone())).await;
    assert_eq!(preview.status(), StatusCode::OK);
    assert_eq!(preview.headers()[CONTENT_TYPE], "image/png");

    clear_image(State(state.clone()), same_session(&session)).await;
    let released = get_preview(State(state.clone()), session, Path(token)).await;
    assert_eq!(released.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn preview_is_hidden_from_other_sessions() {
    let state = test_helpers::test_app_state();
    let owner = operator_session(&state).await;
    let other = operator_session(&state).await;

    let response = select_image(
        State(state.clone()),
        same_session(&owner),
        content_type("image/png"),
        Bytes::from_static(b"private"),
    )
    .await;
    let body = body_json(response).await;
    let url = body["preview_url"].as_str().expect("preview url").to_owned();
    let token = url.trim_start_matches(crate::services::preview::PREVIEW_URL_PREFIX).to_owned();

    let foreign = get_preview(State(state.clone()), other, Path(token.clone())).await;
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);

    let own = get_preview(State(state.clone()), owner, Path(token)).await;
    assert_eq!(own.status(), StatusCode::OK);
}

#[tokio::test]
async fn select_image_rejects_wrong_type_with_422() {
    let state = test_helpers::test_app_state();
    let session = operator_session(&state).await;

    let response = select_image(
        State(state.clone()),
        session,
        content_type("application/pdf"),
        Bytes::from_static(b"%PDF"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["code"], "E_FILE_REJECTED");
    assert_eq!(body["draft"]["errors"]["file"]["code"], "invalid_type");
    assert!(body["draft"]["preview_url"].is_null());
}

#[tokio::test]
async fn select_image_rejects_oversized_file() {
    let state = test_helpers::test_app_state();
    let session = operator_session(&state).await;

    let response = select_image(
        State(state.clone()),
        session,
        content_type("image/jpeg"),
        Bytes::from(vec![0u8; MAX_IMAGE_BYTES + 1]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["draft"]["errors"]["file"]["code"], "too_large");
}

#[tokio::test]
async fn reset_draft_releases_preview() {
    let state = test_helpers::test_app_state();
    let session = operator_session(&state).await;

    select_image(State(state.clone()), same_session(&session), content_type("image/gif"), Bytes::from_static(b"gif"))
        .await;
    assert_eq!(state.previews.live_count(), 1);

    let response = reset_draft(State(state.clone()), session).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.previews.live_count(), 0);
}

// =============================================================================
// VALIDATE
// =============================================================================

#[tokio::test]
async fn validate_is_stateless() {
    let state = test_helpers::test_app_state();
    let session = operator_session(&state).await;

    let body = ValidateBody {
        title: "Hello".into(),
        description: "World".into(),
        file: Some(FileDescriptor { mime: "image/bmp".into(), size: 10 }),
    };
    let Json(result) = validate(same_session(&session), Json(body)).await;
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 1);

    let Json(view) = get_draft(State(state.clone()), session).await;
    assert!(view.errors.is_empty());
}

#[tokio::test]
async fn validate_accepts_complete_input() {
    let state = test_helpers::test_app_state();
    let session = operator_session(&state).await;

    let body = ValidateBody { title: "Hello".into(), description: "World".into(), file: None };
    let Json(result) = validate(session, Json(body)).await;
    assert!(result.valid);
}

// =============================================================================
// SUBMIT
// =============================================================================

#[tokio::test]
async fn submit_valid_draft_returns_201_and_resets() {
    let state = test_helpers::test_app_state();
    let session = operator_session(&state).await;
    fill(&state, &session, "  Bake sale  ", "Friday").await;

    let response = submit(State(state.clone()), same_session(&session)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["title"], "Bake sale");
    assert!(body.get("image_url").is_none());

    let Json(view) = get_draft(State(state.clone()), session).await;
    assert_eq!(view.title, "");
    assert_eq!(state.notices.list().await.expect("list").len(), 3);
}

#[tokio::test]
async fn submit_invalid_draft_returns_422_with_errors() {
    let state = test_helpers::test_app_state();
    let session = operator_session(&state).await;

    let response = submit(State(state.clone()), session).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["code"], "E_VALIDATION");
    assert_eq!(body["errors"]["title"]["message"], "Title is required");
    assert_eq!(state.notices.list().await.expect("list").len(), 2);
}

#[tokio::test]
async fn submit_store_failure_returns_503_and_keeps_form() {
    let store = Arc::new(FlakyStore::default());
    let state = test_helpers::test_app_state_with_store(store.clone());
    let session = operator_session(&state).await;
    fill(&state, &session, "Lost", "Keep me").await;

    let response = submit(State(state.clone()), same_session(&session)).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["code"], "E_STORE_UNAVAILABLE");
    assert_eq!(body["retryable"], true);

    let Json(view) = get_draft(State(state.clone()), session).await;
    assert_eq!(view.title, "Lost");
    assert!(matches!(view.phase, draft::SubmitPhase::Failed { .. }));
    assert_eq!(store.insert_calls(), 1);
}

#[tokio::test]
async fn concurrent_submit_returns_409() {
    let state = test_helpers::test_app_state();
    let session = operator_session(&state).await;
    fill(&state, &session, "Once", "Only once").await;

    let first = tokio::spawn(submit(State(state.clone()), same_session(&session)));
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = submit(State(state.clone()), same_session(&session)).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let first = first.await.expect("submit task");
    assert_eq!(first.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn editing_while_pending_returns_409() {
    let state = test_helpers::test_app_state();
    let session = operator_session(&state).await;
    fill(&state, &session, "Busy", "Pending").await;

    let pending = tokio::spawn(submit(State(state.clone()), same_session(&session)));
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let response = fill(&state, &session, "Changed", "Too late").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let created = body_json(pending.await.expect("submit task")).await;
    assert_eq!(created["title"], "Busy");
}

#[tokio::test]
async fn submitted_image_is_served_by_content_address() {
    let state = test_helpers::test_app_state();
    let session = operator_session(&state).await;
    fill(&state, &session, "Pic", "With image").await;
    select_image(State(state.clone()), same_session(&session), content_type("image/webp"), Bytes::from_static(b"webp"))
        .await;

    let body = body_json(submit(State(state.clone()), session).await).await;
    let url = body["image_url"].as_str().expect("image url");
    let digest = url.trim_start_matches(crate::services::images::IMAGE_URL_PREFIX).to_owned();

    let image = crate::routes::board::get_image(State(state.clone()), Path(digest)).await;
    assert_eq!(image.status(), StatusCode::OK);
    assert_eq!(image.headers()[CONTENT_TYPE], "image/webp");
    assert_eq!(state.previews.live_count(), 0);
}

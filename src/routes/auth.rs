//! Auth routes — login, logout, and the operator session extractor.

use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use time::Duration;
use tracing::{info, warn};

use crate::routes::error_response;
use crate::services::draft;
use crate::services::session::Operator;
use crate::state::AppState;

pub(crate) const COOKIE_NAME: &str = "session_token";

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated operator extracted from the session cookie.
/// Use as a handler parameter to gate the Admin and Editor surfaces.
pub struct OperatorSession {
    pub operator: Operator,
    pub token: String,
}

impl<S> axum::extract::FromRequestParts<S> for OperatorSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(COOKIE_NAME).map(Cookie::value).unwrap_or_default();
        if token.is_empty() {
            return Err(StatusCode::UNAUTHORIZED);
        }

        let app_state = AppState::from_ref(state);
        let operator = app_state
            .sessions
            .validate(token)
            .await
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(Self { operator, token: token.to_owned() })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

/// `POST /api/auth/login` — verify credentials and set the session cookie.
pub async fn login(State(state): State<AppState>, jar: CookieJar, Json(body): Json<LoginBody>) -> Response {
    let operator = match state.verifier.verify(body.username.trim(), &body.password).await {
        Ok(Some(operator)) => operator,
        Ok(None) => {
            warn!(username = %body.username, "login rejected");
            return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({ "message": "Invalid credentials." })))
                .into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "credential verification failed");
            return error_response(StatusCode::SERVICE_UNAVAILABLE, &e);
        }
    };

    let token = state.sessions.create(operator.clone()).await;
    let max_age = Duration::try_from(state.sessions.ttl()).unwrap_or(Duration::MAX);
    let cookie = Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.cookie_secure)
        .max_age(max_age);

    info!(username = %operator.username, "operator logged in");
    (jar.add(cookie), Json(operator)).into_response()
}

/// `GET /api/auth/me` — return the current operator.
pub async fn me(session: OperatorSession) -> Json<Operator> {
    Json(session.operator)
}

/// `POST /api/auth/logout` — end the session, drop its draft, clear the cookie.
pub async fn logout(State(state): State<AppState>, session: OperatorSession) -> impl IntoResponse {
    state.sessions.delete(&session.token).await;
    draft::discard(&state, &session.token).await;

    let cookie = Cookie::build((COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.cookie_secure)
        .max_age(Duration::ZERO);

    info!(
        username = %session.operator.username,
        live_previews = state.previews.live_count(),
        "operator logged out"
    );
    (CookieJar::new().add(cookie), StatusCode::NO_CONTENT)
}

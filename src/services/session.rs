//! Operator sessions.
//!
//! ARCHITECTURE
//! ============
//! A successful login creates an opaque random token that is handed to the
//! browser as an HTTP-only cookie. Sessions live in memory only and end on
//! logout, expiry, or process restart.
//!
//! LIFECYCLE
//! =========
//! 1. `create` stamps the session with `now + ttl`
//! 2. `validate` refuses a session past its expiry
//! 3. The sweeper task removes expired sessions and discards their drafts,
//!    which releases any live preview they held

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::info;

use crate::services::draft;
use crate::state::AppState;

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Authenticated operator allowed onto the Admin and Editor surfaces.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Operator {
    pub username: String,
}

struct SessionEntry {
    operator: Operator,
    expires_at: Instant,
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
    ttl: Duration,
}

impl SessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { sessions: Arc::new(RwLock::new(HashMap::new())), ttl }
    }

    /// How long a new session stays valid.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Create a session for `operator`, returning the token.
    pub async fn create(&self, operator: Operator) -> String {
        let token = generate_token();
        let entry = SessionEntry { operator, expires_at: Instant::now() + self.ttl };
        self.sessions.write().await.insert(token.clone(), entry);
        token
    }

    /// Resolve a session token to its operator. Expired sessions resolve to
    /// `None` even before the sweeper removes them.
    pub async fn validate(&self, token: &str) -> Option<Operator> {
        let sessions = self.sessions.read().await;
        let entry = sessions.get(token)?;
        (entry.expires_at > Instant::now()).then(|| entry.operator.clone())
    }

    /// Delete a session. Returns whether it existed.
    pub async fn delete(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Remove every expired session and return their tokens.
    pub async fn sweep_expired(&self) -> Vec<String> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, entry)| entry.expires_at <= now)
            .map(|(token, _)| token.clone())
            .collect();
        for token in &expired {
            sessions.remove(token);
        }
        expired
    }
}

// =============================================================================
// EXPIRY
// =============================================================================

/// Drop expired sessions together with their editor drafts. Returns how many
/// sessions ended.
pub async fn expire_sessions(state: &AppState) -> usize {
    let expired = state.sessions.sweep_expired().await;
    for token in &expired {
        draft::discard(state, token).await;
    }
    if !expired.is_empty() {
        info!(expired = expired.len(), live_previews = state.previews.live_count(), "expired sessions swept");
    }
    expired.len()
}

/// Spawn the background session sweeper. Returns a handle for shutdown.
pub fn spawn_session_sweeper(state: AppState) -> JoinHandle<()> {
    let interval = state.config.session_sweep_interval;
    info!(
        ttl_secs = state.sessions.ttl().as_secs(),
        sweep_secs = interval.as_secs(),
        "session expiry configured"
    );
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            expire_sessions(&state).await;
        }
    })
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

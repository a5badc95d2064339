//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the one authoritative notice store shared by the Board, Admin, and
//! Editor surfaces, the per-session editor drafts, the live Board feed
//! connections, and the most recent emergency alert.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::config::Config;
use crate::frame::Frame;
use crate::services::alert::Alert;
use crate::services::auth::{CredentialVerifier, StaticCredentialVerifier};
use crate::services::draft::Draft;
use crate::services::images::ImageStore;
use crate::services::notice::{NoticeIdGenerator, seed_notices, today};
use crate::services::preview::PreviewRegistry;
use crate::services::session::SessionStore;
use crate::services::store::{MemoryNoticeStore, NoticeStore};

/// Shared application state. Clone is required by Axum; all inner fields are
/// Arc-wrapped or cheaply cloneable handles.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub notices: Arc<dyn NoticeStore>,
    pub ids: Arc<NoticeIdGenerator>,
    pub images: ImageStore,
    pub previews: PreviewRegistry,
    /// Editor drafts keyed by session token.
    pub drafts: Arc<RwLock<HashMap<String, Draft>>>,
    pub sessions: SessionStore,
    pub verifier: Arc<dyn CredentialVerifier>,
    /// Board feed connections: `client_id` -> sender for outgoing frames.
    pub feed_clients: Arc<RwLock<HashMap<Uuid, mpsc::Sender<Frame>>>>,
    pub current_alert: Arc<RwLock<Option<Alert>>>,
    /// Date of the last notice creation or deletion (startup date initially).
    pub last_updated: Arc<RwLock<String>>,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config, notices: Arc<dyn NoticeStore>, verifier: Arc<dyn CredentialVerifier>) -> Self {
        let sessions = SessionStore::new(config.session_ttl);
        Self {
            config: Arc::new(config),
            notices,
            ids: Arc::new(NoticeIdGenerator::new()),
            images: ImageStore::new(),
            previews: PreviewRegistry::new(),
            drafts: Arc::new(RwLock::new(HashMap::new())),
            sessions,
            verifier,
            feed_clients: Arc::new(RwLock::new(HashMap::new())),
            current_alert: Arc::new(RwLock::new(None)),
            last_updated: Arc::new(RwLock::new(today())),
        }
    }

    /// In-memory store and configured operator credentials.
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        let seed = if config.seed_notices { seed_notices() } else { Vec::new() };
        let verifier = StaticCredentialVerifier::new(config.operators.clone());
        Self::new(config, Arc::new(MemoryNoticeStore::new(seed)), Arc::new(verifier))
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::config::OperatorCredential;
    use crate::services::auth::hash_password;
    use crate::services::notice::Notice;
    use crate::services::store::StoreError;

    pub const TEST_USER: &str = "admin";
    pub const TEST_PASSWORD: &str = "secret";

    /// Seeded state with a short submission delay and one operator.
    #[must_use]
    pub fn test_config() -> Config {
        Config {
            submit_delay: Duration::from_millis(20),
            operators: vec![OperatorCredential {
                username: TEST_USER.into(),
                password_sha256: hash_password(TEST_PASSWORD),
            }],
            ..Config::default()
        }
    }

    #[must_use]
    pub fn test_app_state() -> AppState {
        AppState::from_config(test_config())
    }

    /// Test state backed by a custom notice store.
    #[must_use]
    pub fn test_app_state_with_store(store: Arc<dyn NoticeStore>) -> AppState {
        let config = test_config();
        let verifier = StaticCredentialVerifier::new(config.operators.clone());
        AppState::new(config, store, Arc::new(verifier))
    }

    #[must_use]
    pub fn notice(id: &str, title: &str) -> Notice {
        Notice {
            id: id.into(),
            title: title.into(),
            description: format!("{title} description"),
            image_url: None,
            timestamp: "2026-01-01".into(),
        }
    }

    /// Store whose writes fail until `heal` is called.
    #[derive(Default)]
    pub struct FlakyStore {
        pub notices: Mutex<Vec<Notice>>,
        pub healthy: Mutex<bool>,
        pub insert_calls: Mutex<usize>,
    }

    impl FlakyStore {
        pub fn heal(&self) {
            *self.healthy.lock().expect("flaky mutex should lock") = true;
        }

        pub fn insert_calls(&self) -> usize {
            *self.insert_calls.lock().expect("flaky mutex should lock")
        }
    }

    #[async_trait]
    impl NoticeStore for FlakyStore {
        async fn list(&self) -> Result<Vec<Notice>, StoreError> {
            Ok(self.notices.lock().expect("flaky mutex should lock").clone())
        }

        async fn insert(&self, notice: Notice) -> Result<(), StoreError> {
            *self.insert_calls.lock().expect("flaky mutex should lock") += 1;
            if !*self.healthy.lock().expect("flaky mutex should lock") {
                return Err(StoreError::Unavailable("write rejected".into()));
            }
            self.notices.lock().expect("flaky mutex should lock").push(notice);
            Ok(())
        }

        async fn remove(&self, id: &str) -> Result<Option<Notice>, StoreError> {
            let mut notices = self.notices.lock().expect("flaky mutex should lock");
            let index = notices.iter().position(|n| n.id == id);
            Ok(index.map(|i| notices.remove(i)))
        }
    }

    /// Register a fake feed client and return its receiver.
    pub async fn attach_feed_client(state: &AppState) -> (Uuid, mpsc::Receiver<Frame>) {
        let client_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(16);
        state.feed_clients.write().await.insert(client_id, tx);
        (client_id, rx)
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;

//! Notice store — the single authoritative notice list shared by all surfaces.
//!
//! DESIGN
//! ======
//! Board, Admin, and Editor routes all read and write through one
//! `NoticeStore`, so a deletion or creation on one surface is visible on the
//! others. The trait is the seam for a real backing store; every call may
//! fail. `MemoryNoticeStore` is the in-process implementation and never does.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::services::notice::{Notice, NoticeCollection};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("notice store unavailable: {0}")]
    Unavailable(String),
}

impl crate::frame::ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "E_STORE_UNAVAILABLE",
        }
    }

    fn retryable(&self) -> bool {
        true
    }
}

#[async_trait]
pub trait NoticeStore: Send + Sync {
    /// Current notices in insertion order.
    async fn list(&self) -> Result<Vec<Notice>, StoreError>;

    /// Append one notice.
    async fn insert(&self, notice: Notice) -> Result<(), StoreError>;

    /// Remove the notice with `id`. `Ok(None)` when nothing matched.
    async fn remove(&self, id: &str) -> Result<Option<Notice>, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryNoticeStore {
    notices: RwLock<NoticeCollection>,
}

impl MemoryNoticeStore {
    #[must_use]
    pub fn new(seed: Vec<Notice>) -> Self {
        Self { notices: RwLock::new(NoticeCollection::with_notices(seed)) }
    }
}

#[async_trait]
impl NoticeStore for MemoryNoticeStore {
    async fn list(&self) -> Result<Vec<Notice>, StoreError> {
        Ok(self.notices.read().await.list().to_vec())
    }

    async fn insert(&self, notice: Notice) -> Result<(), StoreError> {
        self.notices.write().await.add(notice);
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<Option<Notice>, StoreError> {
        Ok(self.notices.write().await.remove(id))
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;

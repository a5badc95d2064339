//! Board service — listing, confirmed deletion, and statistics over the
//! shared notice store.

use serde::Serialize;
use tracing::info;

use crate::services::feed;
use crate::services::images::digest_from_url;
use crate::services::notice::{Notice, today};
use crate::services::store::StoreError;
use crate::state::AppState;

/// Prompt an operator must accept before a notice is deleted.
pub const DELETE_CONFIRMATION_PROMPT: &str = "Are you sure you want to delete this notice?";

#[derive(Debug, Clone, Serialize)]
pub struct BoardStats {
    pub total_notices: usize,
    pub last_updated: String,
}

/// Current notices in insertion order.
///
/// # Errors
///
/// Propagates store failures.
pub async fn list_notices(state: &AppState) -> Result<Vec<Notice>, StoreError> {
    state.notices.list().await
}

/// Delete the notice with `id`. Unknown ids are a no-op returning `None`.
/// The notice's image stops being served once no other notice uses it.
///
/// # Errors
///
/// Propagates store failures.
pub async fn delete_notice(state: &AppState, id: &str) -> Result<Option<Notice>, StoreError> {
    let removed = state.notices.remove(id).await?;
    if let Some(notice) = &removed {
        if let Some(digest) = notice.image_url.as_deref().and_then(digest_from_url) {
            let freed = state.images.remove(digest);
            info!(%id, %digest, freed, "notice image released");
        }
        record_update(state).await;
        feed::publish(state, &feed::notice_deleted_frame(id)).await;
        info!(%id, "notice deleted");
    }
    Ok(removed)
}

/// # Errors
///
/// Propagates store failures.
pub async fn stats(state: &AppState) -> Result<BoardStats, StoreError> {
    let total_notices = state.notices.list().await?.len();
    let last_updated = state.last_updated.read().await.clone();
    Ok(BoardStats { total_notices, last_updated })
}

/// Stamp the board as changed today.
pub async fn record_update(state: &AppState) {
    *state.last_updated.write().await = today();
}

#[cfg(test)]
#[path = "board_test.rs"]
mod tests;

//! Board feed — fan-out of alerts and notice changes to live Board viewers.
//!
//! DESIGN
//! ======
//! Each websocket connection registers an mpsc sender. Publishing is
//! best-effort: a full or closed channel is skipped, never awaited, so a slow
//! viewer cannot stall an Admin or Editor request.

use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::frame::{Data, Frame};
use crate::services::notice::Notice;
use crate::state::AppState;

pub const SYSCALL_NOTICE_CREATED: &str = "notice:created";
pub const SYSCALL_NOTICE_DELETED: &str = "notice:deleted";

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("unknown syscall: {0}")]
    UnknownSyscall(String),
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}

impl crate::frame::ErrorCode for FeedError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownSyscall(_) => "E_UNKNOWN_SYSCALL",
            Self::InvalidFrame(_) => "E_INVALID_FRAME",
        }
    }
}

pub async fn register(state: &AppState, client_id: Uuid, tx: mpsc::Sender<Frame>) {
    let mut clients = state.feed_clients.write().await;
    clients.insert(client_id, tx);
    info!(%client_id, clients = clients.len(), "feed: client registered");
}

pub async fn unregister(state: &AppState, client_id: Uuid) {
    let mut clients = state.feed_clients.write().await;
    clients.remove(&client_id);
    info!(%client_id, remaining = clients.len(), "feed: client unregistered");
}

/// Send a frame to every registered feed client.
pub async fn publish(state: &AppState, frame: &Frame) {
    let clients = state.feed_clients.read().await;
    for (client_id, tx) in clients.iter() {
        // Best-effort: if a client's channel is full, skip it.
        if tx.try_send(frame.clone()).is_err() {
            debug!(%client_id, syscall = %frame.syscall, "feed: dropped frame for slow client");
        }
    }
}

#[must_use]
pub fn notice_created_frame(notice: &Notice) -> Frame {
    let mut data = Data::new();
    data.insert("notice".into(), serde_json::to_value(notice).unwrap_or_default());
    Frame::request(SYSCALL_NOTICE_CREATED, data)
}

#[must_use]
pub fn notice_deleted_frame(id: &str) -> Frame {
    Frame::request(SYSCALL_NOTICE_DELETED, Data::new()).with_data("id", id)
}

#[cfg(test)]
#[path = "feed_test.rs"]
mod tests;

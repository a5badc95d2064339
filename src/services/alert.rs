//! Emergency alerts — composition on the Admin surface, delivery to Board
//! viewers through the feed.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::frame::{Data, Frame, now_ms};
use crate::services::feed;
use crate::state::AppState;

pub const SYSCALL_ALERT_BROADCAST: &str = "alert:broadcast";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub id: Uuid,
    pub message: String,
    /// Milliseconds since Unix epoch.
    pub sent_at: i64,
    pub sent_by: String,
}

impl Alert {
    /// Operator-facing confirmation for a sent alert.
    #[must_use]
    pub fn confirmation(&self) -> String {
        format!("Emergency Alert Sent: {}", self.message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert message is empty")]
    EmptyMessage,
}

impl crate::frame::ErrorCode for AlertError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyMessage => "E_ALERT_EMPTY",
        }
    }
}

/// Send an emergency alert to every Board viewer and make it the current
/// alert for viewers that connect later.
///
/// # Errors
///
/// Returns `EmptyMessage` if the message is blank after trimming.
pub async fn send_alert(state: &AppState, message: &str, sent_by: &str) -> Result<Alert, AlertError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(AlertError::EmptyMessage);
    }

    let alert = Alert { id: Uuid::new_v4(), message: message.to_owned(), sent_at: now_ms(), sent_by: sent_by.to_owned() };
    // Publish under the guard so viewers see alerts in the order they become current.
    let mut current = state.current_alert.write().await;
    *current = Some(alert.clone());
    feed::publish(state, &alert_frame(&alert)).await;
    drop(current);

    info!(alert_id = %alert.id, %sent_by, "emergency alert sent");
    Ok(alert)
}

pub async fn current_alert(state: &AppState) -> Option<Alert> {
    state.current_alert.read().await.clone()
}

#[must_use]
pub fn alert_frame(alert: &Alert) -> Frame {
    let mut data = Data::new();
    data.insert("alert_id".into(), serde_json::json!(alert.id));
    data.insert("message".into(), serde_json::json!(alert.message));
    data.insert("sent_at".into(), serde_json::json!(alert.sent_at));
    Frame::request(SYSCALL_ALERT_BROADCAST, data)
}

#[cfg(test)]
#[path = "alert_test.rs"]
mod tests;

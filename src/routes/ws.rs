//! WebSocket handler — the public Board live feed.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID, registers a feed channel, and enters a
//! `select!` loop:
//! - Incoming client frames → parse + dispatch by syscall prefix
//! - Published feed frames → filter through the viewer's alert banner →
//!   forward to client
//!
//! `dispatch` returns the reply data or an error frame; the connection loop
//! owns sending it.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → register → send `session:connected` with `client_id`
//! 2. Send the current alert (if any and not already dismissed)
//! 3. Relay feed frames; answer `alert:dismiss` and `notice:list`
//! 4. Close → unregister

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::frame::{Data, Frame, Status};
use crate::services::alert::{self, SYSCALL_ALERT_BROADCAST};
use crate::services::banner::AlertBanner;
use crate::services::board;
use crate::services::feed::{self, FeedError};
use crate::state::AppState;

pub const SYSCALL_SESSION_CONNECTED: &str = "session:connected";
pub const SYSCALL_ALERT_DISMISS: &str = "alert:dismiss";
pub const SYSCALL_NOTICE_LIST: &str = "notice:list";

/// Per-connection outbound buffer.
const FEED_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// VIEWER
// =============================================================================

/// Alert state for one connected Board viewer.
pub(crate) struct Viewer {
    client_id: Uuid,
    banner: AlertBanner,
    last_alert: Option<String>,
}

impl Viewer {
    pub(crate) fn new(client_id: Uuid) -> Self {
        let banner = AlertBanner::with_callback(move |message| {
            info!(%client_id, alert = message, "ws: alert dismissed");
        });
        Self { client_id, banner, last_alert: None }
    }

    /// Whether `frame` should reach the client. Alert frames pass only when
    /// the banner shows them; a repeat of the alert just shown is dropped.
    pub(crate) fn admit(&mut self, frame: &Frame) -> bool {
        if frame.syscall != SYSCALL_ALERT_BROADCAST {
            return true;
        }
        let alert_id = frame.data.get("alert_id").and_then(|v| v.as_str()).map(str::to_owned);
        if alert_id.is_some() && alert_id == self.last_alert {
            return false;
        }
        let Some(message) = frame.data.get("message").and_then(|v| v.as_str()) else {
            return false;
        };
        if !self.banner.show(message) {
            return false;
        }
        self.last_alert = alert_id;
        true
    }

    /// Hide the banner, returning the message that was showing.
    pub(crate) fn dismiss(&mut self) -> Option<String> {
        let message = self.banner.message().map(str::to_owned)?;
        self.banner.dismiss();
        Some(message)
    }
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(FEED_CHANNEL_CAPACITY);

    // Register before reading the current alert so no broadcast is missed;
    // the viewer drops the duplicate if both paths deliver it.
    feed::register(&state, client_id, client_tx).await;

    let welcome = Frame::request(SYSCALL_SESSION_CONNECTED, Data::new()).with_data("client_id", client_id.to_string());
    if send_frame(&mut socket, &welcome).await.is_err() {
        feed::unregister(&state, client_id).await;
        return;
    }
    info!(%client_id, "ws: viewer connected");

    let mut viewer = Viewer::new(client_id);
    if let Some(current) = alert::current_alert(&state).await {
        let frame = alert::alert_frame(&current);
        if viewer.admit(&frame) && send_frame(&mut socket, &frame).await.is_err() {
            feed::unregister(&state, client_id).await;
            return;
        }
    }

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let reply = process_inbound_text(&state, &mut viewer, &text).await;
                        if send_frame(&mut socket, &reply).await.is_err() {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = client_rx.recv() => {
                if !viewer.admit(&frame) {
                    continue;
                }
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    feed::unregister(&state, viewer.client_id).await;
    info!(%client_id, "ws: viewer disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse an incoming JSON frame and produce the reply frame.
async fn process_inbound_text(state: &AppState, viewer: &mut Viewer, text: &str) -> Frame {
    let req: Frame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(e) => {
            warn!(error = %e, "ws: invalid inbound frame");
            let err = FeedError::InvalidFrame(e.to_string());
            return Frame::request("gateway:error", Data::new()).error_from(&err);
        }
    };
    info!(id = %req.id, syscall = %req.syscall, "ws: recv frame");
    if req.status.is_terminal() {
        let err = FeedError::InvalidFrame(format!("expected request status, got {:?}", req.status));
        return req.error_from(&err);
    }

    match dispatch(state, viewer, &req).await {
        Ok(data) => req.done(data),
        Err(frame) => frame,
    }
}

async fn dispatch(state: &AppState, viewer: &mut Viewer, req: &Frame) -> Result<Data, Frame> {
    match req.prefix() {
        "alert" => handle_alert(viewer, req),
        "notice" => handle_notice(state, req).await,
        _ => Err(unknown_syscall(req)),
    }
}

fn handle_alert(viewer: &mut Viewer, req: &Frame) -> Result<Data, Frame> {
    if req.syscall != SYSCALL_ALERT_DISMISS {
        return Err(unknown_syscall(req));
    }
    let dismissed = viewer.dismiss();
    let mut data = Data::new();
    data.insert("dismissed".into(), serde_json::json!(dismissed.is_some()));
    if let Some(message) = dismissed {
        data.insert("message".into(), serde_json::json!(message));
    }
    Ok(data)
}

async fn handle_notice(state: &AppState, req: &Frame) -> Result<Data, Frame> {
    if req.syscall != SYSCALL_NOTICE_LIST {
        return Err(unknown_syscall(req));
    }
    let notices = board::list_notices(state).await.map_err(|e| req.error_from(&e))?;
    let mut data = Data::new();
    data.insert("empty".into(), serde_json::json!(notices.is_empty()));
    data.insert("notices".into(), serde_json::to_value(notices).unwrap_or_default());
    Ok(data)
}

fn unknown_syscall(req: &Frame) -> Frame {
    req.error_from(&FeedError::UnknownSyscall(req.syscall.clone()))
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), ()> {
    let json = match serde_json::to_string(frame) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize frame");
            return Err(());
        }
    };
    if frame.status == Status::Error {
        let code = frame.data.get("code").and_then(|v| v.as_str()).unwrap_or("-");
        let message = frame.data.get("message").and_then(|v| v.as_str()).unwrap_or("-");
        warn!(id = %frame.id, syscall = %frame.syscall, code, message, "ws: send frame status=Error");
    } else {
        info!(id = %frame.id, syscall = %frame.syscall, status = ?frame.status, "ws: send frame");
    }
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;

//! WebSocket handler — live content list.
//!
//! DESIGN
//! ======
//! On upgrade, subscribes to the content feed and enters a `select!` loop:
//! - Incoming client frames → parse + dispatch by syscall prefix
//! - Feed snapshots → forward to client as `content:snapshot`
//!
//! Handlers are pure lookups that return reply data or an error frame; the
//! dispatch layer owns sending.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → subscribe → send `session:connected` with `client_id`
//! 2. Send the current list as `content:snapshot`
//! 3. Every committed change → another `content:snapshot`
//! 4. Client `content:list` → `done` reply with `items`

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::frame::{Data, Frame};
use crate::services::content::ContentRecord;
use crate::state::AppState;

pub const SYSCALL_CONNECTED: &str = "session:connected";
pub const SYSCALL_SNAPSHOT: &str = "content:snapshot";
pub const SYSCALL_GATEWAY_ERROR: &str = "gateway:error";

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

    // Subscribe first so no change between the initial load and the loop is lost.
    let mut feed_rx = state.feed.subscribe();

    let welcome = Frame::request(SYSCALL_CONNECTED, Data::new()).with_data("client_id", client_id.to_string());
    if send_frame(&mut socket, &welcome).await.is_err() {
        return;
    }

    let initial = match state.store.list().await {
        Ok(items) => snapshot_frame(&items),
        Err(e) => {
            warn!(%client_id, error = %e, "ws: initial snapshot failed");
            Frame::request(SYSCALL_SNAPSHOT, Data::new()).error_from(&e)
        }
    };
    if send_frame(&mut socket, &initial).await.is_err() {
        return;
    }

    info!(%client_id, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let replies = process_inbound_text(&state, client_id, text.as_str()).await;
                        if send_all(&mut socket, &replies).await.is_err() {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            snapshot = feed_rx.recv() => {
                match snapshot {
                    Ok(items) => {
                        if send_frame(&mut socket, &snapshot_frame(&items)).await.is_err() {
                            break;
                        }
                    }
                    // EDGE: the next snapshot supersedes the skipped ones.
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(%client_id, skipped, "ws: feed lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    info!(%client_id, "ws: client disconnected");
}

fn snapshot_frame(items: &[ContentRecord]) -> Frame {
    Frame::request(SYSCALL_SNAPSHOT, items_data(items))
}

fn items_data(items: &[ContentRecord]) -> Data {
    let mut data = Data::new();
    data.insert("items".into(), serde_json::to_value(items).unwrap_or_default());
    data
}

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), axum::Error> {
    let json = serde_json::to_string(frame).map_err(axum::Error::new)?;
    socket.send(Message::Text(json.into())).await
}

async fn send_all(socket: &mut WebSocket, frames: &[Frame]) -> Result<(), axum::Error> {
    for frame in frames {
        send_frame(socket, frame).await?;
    }
    Ok(())
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse and process one inbound text frame and return frames for the sender.
async fn process_inbound_text(state: &AppState, client_id: Uuid, text: &str) -> Vec<Frame> {
    let req: Frame = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound frame");
            return vec![Frame::failure(SYSCALL_GATEWAY_ERROR, format!("invalid json: {e}"))];
        }
    };

    info!(%client_id, id = %req.id, syscall = %req.syscall, "ws: recv frame");

    let result = match req.prefix() {
        "content" => handle_content(state, &req).await,
        prefix => Err(req.error(format!("unknown prefix: {prefix}"))),
    };

    match result {
        Ok(data) => vec![req.done_with(data)],
        Err(err_frame) => vec![err_frame],
    }
}

async fn handle_content(state: &AppState, req: &Frame) -> Result<Data, Frame> {
    match req.op() {
        "list" => match state.store.list().await {
            Ok(items) => Ok(items_data(&items)),
            Err(e) => Err(req.error_from(&e)),
        },
        op => Err(req.error(format!("unknown content op: {op}"))),
    }
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;

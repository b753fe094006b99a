//! Viewer WebSocket
//!
//! One socket carries both directions: encoded frames out, input events in.
//! The viewer connecting starts the stream session and leaving stops it.

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use deskview_core::protocol::{encode_binary_frame, parse_input, ServerMessage};
use deskview_core::{EncodedFrame, FrameTransport, InputEvent};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use crate::broadcast::AppState;
use crate::http::session_user;

/// Upgrade handler for `/ws`; requires a logged-in session
///
/// The session is checked before the upgrade request itself.
pub async fn viewer_ws_handler(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let Some(user) = session_user(&state, &jar).await else {
        warn!("Viewer WebSocket connection rejected: not logged in");
        return (StatusCode::UNAUTHORIZED, "Authentication required").into_response();
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    debug!("Viewer WebSocket upgrade for user '{}'", user);
    ws.on_upgrade(|socket| handle_viewer_socket(socket, state))
        .into_response()
}

/// Wrap an encoded frame for the configured transport
pub fn frame_message(frame: &EncodedFrame, transport: FrameTransport) -> serde_json::Result<Message> {
    match transport {
        FrameTransport::Json => {
            let msg = ServerMessage::ImageFrame {
                data: BASE64.encode(&frame.data),
                width: frame.width,
                height: frame.height,
            };
            Ok(Message::Text(serde_json::to_string(&msg)?))
        }
        FrameTransport::Binary => Ok(Message::Binary(encode_binary_frame(frame))),
    }
}

/// Queue an input event for the relay without waiting
///
/// A full queue drops the event so a slow relay never stalls frame delivery.
/// Returns whether the event was queued.
pub fn forward_input(input_tx: &mpsc::Sender<InputEvent>, event: InputEvent) -> bool {
    match input_tx.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(event)) => {
            warn!("Input queue full, dropping {:?}", event);
            false
        }
        Err(TrySendError::Closed(_)) => {
            warn!("Input channel closed");
            false
        }
    }
}

/// Handle one viewer connection until it closes
pub async fn handle_viewer_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    info!("Viewer connected");

    let mut frames = state.broadcaster.subscribe();
    state.stream.start().await;

    let transport = state.config.transport;
    let init_msg = ServerMessage::Init {
        screen_width: state.screen_width,
        screen_height: state.screen_height,
        transport,
    };

    match serde_json::to_string(&init_msg) {
        Ok(json) => {
            debug!("Sending init: {}", json);
            if sender.send(Message::Text(json)).await.is_err() {
                warn!("Failed to send init message");
                state.stream.stop().await;
                return;
            }
        }
        Err(e) => warn!("Failed to serialize init message: {}", e),
    }

    let mut frames_sent = 0u64;
    loop {
        tokio::select! {
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                let Some(frame) = frames.borrow_and_update().clone() else {
                    continue;
                };

                let msg = match frame_message(&frame, transport) {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!("Failed to serialize frame: {}", e);
                        continue;
                    }
                };

                if sender.send(msg).await.is_err() {
                    debug!("Viewer socket closed while sending a frame");
                    break;
                }

                frames_sent += 1;
                if frames_sent <= 5 || frames_sent % 100 == 0 {
                    debug!("Sent frame {} to viewer: {} bytes", frames_sent, frame.data.len());
                }
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => match parse_input(&text) {
                        Ok(event) => {
                            debug!("Input event received: {:?}", event);
                            forward_input(&state.input_tx, event);
                        }
                        Err(e) => {
                            warn!("Invalid viewer message: {} - raw: {}", e, text);
                        }
                    },
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!("WebSocket receive error: {}", e);
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.stream.stop().await;
    info!("Viewer disconnected ({} frames sent)", frames_sent);
}

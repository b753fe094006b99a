//! deskview Server - Axum-based HTTP and WebSocket server
//!
//! This crate serves the login flow and viewer page, runs the stream session
//! and carries frames and input over the viewer WebSocket.

pub mod broadcast;
pub mod http;
pub mod session;
pub mod tls;
pub mod websocket;

pub use broadcast::{AppState, Broadcaster, FrameReceiver};
pub use http::create_router;
pub use session::{SessionState, SourceFactory, StreamSession};
pub use tls::{calculate_cert_fingerprint, generate_self_signed_cert, load_rustls_config};
pub use websocket::handle_viewer_socket;

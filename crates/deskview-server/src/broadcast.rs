//! Latest-frame broadcast and shared application state

use crate::StreamSession;
use deskview_auth::{Credentials, SessionStore};
use deskview_core::{Config, EncodedFrame, InputEvent};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Receiving end of the frame broadcast
pub type FrameReceiver = watch::Receiver<Option<Arc<EncodedFrame>>>;

/// Single-slot frame broadcast
///
/// Each send replaces the held frame, so a slow viewer skips straight to the
/// newest one. Sending never blocks and succeeds with no viewers attached.
#[derive(Clone)]
pub struct Broadcaster {
    tx: Arc<watch::Sender<Option<Arc<EncodedFrame>>>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Publish a frame, replacing any frame not yet taken
    pub fn send(&self, frame: EncodedFrame) {
        self.tx.send_replace(Some(Arc::new(frame)));
    }

    /// Subscribe to frames sent from now on
    ///
    /// The frame currently held counts as already seen.
    pub fn subscribe(&self) -> FrameReceiver {
        self.tx.subscribe()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared application state
pub struct AppState {
    /// Configuration
    pub config: Config,
    /// Captured area size, in input coordinates
    pub screen_width: u32,
    pub screen_height: u32,
    /// Frame broadcast fed by the stream session
    pub broadcaster: Broadcaster,
    /// Capture loop lifecycle
    pub stream: StreamSession,
    /// Input event sender
    pub input_tx: mpsc::Sender<InputEvent>,
    /// Allowed login
    pub credentials: Credentials,
    /// Live login sessions
    pub sessions: SessionStore,
}

impl AppState {
    /// Create a new application state
    pub fn new(
        config: Config,
        screen_size: (u32, u32),
        broadcaster: Broadcaster,
        stream: StreamSession,
        input_tx: mpsc::Sender<InputEvent>,
        credentials: Credentials,
    ) -> Self {
        Self {
            config,
            screen_width: screen_size.0,
            screen_height: screen_size.1,
            broadcaster,
            stream,
            input_tx,
            credentials,
            sessions: SessionStore::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(n: u8) -> EncodedFrame {
        EncodedFrame {
            data: vec![n; 4],
            width: 2,
            height: 2,
        }
    }

    #[tokio::test]
    async fn test_send_without_viewers() {
        let broadcaster = Broadcaster::new();
        broadcaster.send(frame(1));

        let mut rx = broadcaster.subscribe();
        broadcaster.send(frame(2));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().clone().unwrap().data, vec![2; 4]);
    }

    #[tokio::test]
    async fn test_slow_viewer_sees_latest_only() {
        let broadcaster = Broadcaster::new();
        let mut rx = broadcaster.subscribe();

        for n in 1..=3 {
            broadcaster.send(frame(n));
        }

        rx.changed().await.unwrap();
        let latest = rx.borrow_and_update().clone().unwrap();
        assert_eq!(latest.data, vec![3; 4]);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_subscribe_skips_stale_frame() {
        let broadcaster = Broadcaster::new();
        broadcaster.send(frame(1));

        let rx = broadcaster.subscribe();
        assert!(!rx.has_changed().unwrap());
    }
}

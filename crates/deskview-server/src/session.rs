//! Stream session lifecycle
//!
//! A viewer connecting starts the capture loop and a viewer leaving stops it.
//! The loop runs on a blocking thread and is cancelled cooperatively.

use crate::Broadcaster;
use deskview_capture::FrameSource;
use deskview_core::{Config, Result};
use deskview_encoder::{CaptureLoop, FrameProcessor, Pacer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Opens the frame source for a new capture loop
pub type SourceFactory = Arc<dyn Fn() -> Result<Box<dyn FrameSource>> + Send + Sync>;

/// Whether a capture loop is live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
}

struct ActiveLoop {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ActiveLoop {
    /// A loop that ended on its own (capture failure) no longer counts
    fn is_live(&self) -> bool {
        !self.handle.is_finished()
    }
}

/// Owns the capture loop and its stop flag
///
/// Start and stop are serialized by one mutex held across the bounded join,
/// so they never interleave.
pub struct StreamSession {
    config: Config,
    factory: SourceFactory,
    broadcaster: Broadcaster,
    active: Mutex<Option<ActiveLoop>>,
}

impl StreamSession {
    /// Create an idle session
    pub fn new(config: Config, factory: SourceFactory, broadcaster: Broadcaster) -> Self {
        Self {
            config,
            factory,
            broadcaster,
            active: Mutex::new(None),
        }
    }

    /// Start the capture loop unless one is already running
    ///
    /// Returns whether a new loop was spawned.
    pub async fn start(&self) -> bool {
        let mut active = self.active.lock().await;

        if let Some(current) = active.as_ref() {
            if current.is_live() {
                debug!("Capture loop already running");
                return false;
            }
            debug!("Replacing capture loop that exited on its own");
        }

        let stop = Arc::new(AtomicBool::new(false));
        let handle = tokio::task::spawn_blocking({
            let stop = stop.clone();
            let factory = self.factory.clone();
            let broadcaster = self.broadcaster.clone();
            let config = self.config.clone();
            move || run_capture(&factory, &config, &stop, &broadcaster)
        });

        *active = Some(ActiveLoop { stop, handle });
        info!("Stream session started");
        true
    }

    /// Signal the loop to stop and wait up to the join timeout
    ///
    /// A loop that overruns the timeout is detached. Stopping an idle session
    /// does nothing.
    pub async fn stop(&self) {
        let mut active = self.active.lock().await;

        let Some(ActiveLoop { stop, handle }) = active.take() else {
            debug!("Stop requested while idle");
            return;
        };

        stop.store(true, Ordering::Release);

        match tokio::time::timeout(self.config.join_timeout, handle).await {
            Ok(Ok(())) => info!("Stream session stopped"),
            Ok(Err(e)) => warn!("Capture loop task failed: {}", e),
            Err(_) => warn!(
                "Capture loop did not stop within {:?}, detaching it",
                self.config.join_timeout
            ),
        }
    }

    /// Current lifecycle state
    pub async fn state(&self) -> SessionState {
        match self.active.lock().await.as_ref() {
            Some(current) if current.is_live() => SessionState::Running,
            _ => SessionState::Idle,
        }
    }
}

/// Body of the blocking capture task
fn run_capture(factory: &SourceFactory, config: &Config, stop: &AtomicBool, broadcaster: &Broadcaster) {
    let mut source = match factory() {
        Ok(source) => source,
        Err(e) => {
            error!("Failed to open capture source: {}", e);
            return;
        }
    };

    let (width, height) = source.size();
    info!(
        "Streaming {}x{} at up to {} fps (max {}x{}, quality {})",
        width, height, config.fps, config.max_width, config.max_height, config.quality
    );

    let capture_loop = CaptureLoop::new(
        FrameProcessor::new(config.max_width, config.max_height, config.quality),
        Pacer::new(config.fps),
    );

    if let Err(e) = capture_loop.run(source.as_mut(), stop, |frame| broadcaster.send(frame)) {
        error!("Capture failed, stream stopped: {}", e);
    }
}

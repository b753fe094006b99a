//! deskview Capture - Screen capture for X11
//!
//! This crate provides the [`FrameSource`] capability used by the capture loop,
//! backed by either:
//! - X11 MIT-SHM extension (shared memory, default)
//! - X11 core protocol GetImage (works without SHM, e.g. over a remote display)

pub mod shm_capture;
pub mod x11_capture;

pub use deskview_core::Frame;
pub use shm_capture::ShmCapture;
pub use x11_capture::{MonitorGeometry, X11Capture};

use deskview_core::{CaptureBackend, Result};
use tracing::{info, warn};

/// One screen, captured on demand
///
/// The monitor is chosen when the source is opened; every `capture` call
/// grabs that region. Implementations are synchronous and may block.
pub trait FrameSource: Send {
    /// Capture a single frame
    fn capture(&mut self) -> Result<Frame>;

    /// Dimensions of the captured region
    fn size(&self) -> (u32, u32);
}

/// Detect if running under Wayland
pub fn is_wayland() -> bool {
    std::env::var("XDG_SESSION_TYPE")
        .map(|v| v == "wayland")
        .unwrap_or(false)
        || std::env::var("WAYLAND_DISPLAY").is_ok()
}

/// Open a frame source on the given monitor
///
/// Fails when the display cannot be reached, the monitor does not exist, or
/// the screen's pixel format cannot be streamed.
pub fn open_source(backend: CaptureBackend, monitor: usize) -> Result<Box<dyn FrameSource>> {
    if is_wayland() {
        warn!("Wayland session detected; X11 capture only sees XWayland clients");
    }

    let source: Box<dyn FrameSource> = match backend {
        CaptureBackend::Shm => Box::new(ShmCapture::new(monitor)?),
        CaptureBackend::X11 => Box::new(X11Capture::new(monitor)?),
    };

    let (width, height) = source.size();
    info!(
        "Opened {} capture on monitor {}: {}x{}",
        backend, monitor, width, height
    );
    Ok(source)
}

/// Look up the geometry of a monitor without keeping a capture open
pub fn probe_monitor(monitor: usize) -> Result<MonitorGeometry> {
    x11_capture::X11Target::open(monitor, &[]).map(|target| target.geometry)
}

//! Configuration types for deskview

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Screen capture backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureBackend {
    /// X11 MIT-SHM GetImage into a shared memory segment
    #[default]
    Shm,
    /// Plain X11 core-protocol GetImage (no shared memory)
    X11,
}

impl std::str::FromStr for CaptureBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shm" | "mit-shm" => Ok(CaptureBackend::Shm),
            "x11" | "getimage" => Ok(CaptureBackend::X11),
            _ => Err(format!("Invalid capture backend: {}. Use: shm, x11", s)),
        }
    }
}

impl std::fmt::Display for CaptureBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureBackend::Shm => write!(f, "shm"),
            CaptureBackend::X11 => write!(f, "x11"),
        }
    }
}

/// How encoded frames are framed on the viewer socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FrameTransport {
    /// JSON text message with base64 image data
    #[default]
    Json,
    /// Binary message: width and height (u32 big-endian) followed by the JPEG
    Binary,
}

impl std::str::FromStr for FrameTransport {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" | "base64" => Ok(FrameTransport::Json),
            "binary" | "bin" => Ok(FrameTransport::Binary),
            _ => Err(format!("Invalid frame transport: {}. Use: json, binary", s)),
        }
    }
}

impl std::fmt::Display for FrameTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameTransport::Json => write!(f, "json"),
            FrameTransport::Binary => write!(f, "binary"),
        }
    }
}

/// Main configuration for deskview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target frame rate (a ceiling, not a guarantee)
    pub fps: u32,
    /// Maximum width of streamed frames
    pub max_width: u32,
    /// Maximum height of streamed frames
    pub max_height: u32,
    /// JPEG quality (1-100)
    pub quality: u8,
    /// Screen capture backend
    pub backend: CaptureBackend,
    /// Monitor index: 0 is the whole desktop, 1.. are individual monitors
    pub monitor: usize,
    /// Server port
    pub port: u16,
    /// Frame framing on the viewer socket
    pub transport: FrameTransport,
    /// How long a disconnect waits for the capture loop to exit
    pub join_timeout: Duration,
    /// Pause between window activation and page-key injection
    pub scroll_settle: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fps: 80,
            max_width: 1920,
            max_height: 1080,
            quality: 80,
            backend: CaptureBackend::Shm,
            monitor: 1,
            port: 5000,
            transport: FrameTransport::Json,
            join_timeout: Duration::from_secs(1),
            scroll_settle: Duration::from_millis(100),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: set frame rate
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Builder pattern: set the output bounding box
    pub fn with_max_size(mut self, max_width: u32, max_height: u32) -> Self {
        self.max_width = max_width;
        self.max_height = max_height;
        self
    }

    /// Builder pattern: set JPEG quality
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Builder pattern: set capture backend
    pub fn with_backend(mut self, backend: CaptureBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Builder pattern: set monitor index
    pub fn with_monitor(mut self, monitor: usize) -> Self {
        self.monitor = monitor;
        self
    }

    /// Builder pattern: set port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Builder pattern: set frame transport
    pub fn with_transport(mut self, transport: FrameTransport) -> Self {
        self.transport = transport;
        self
    }

    /// Builder pattern: set capture loop join timeout
    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    /// Builder pattern: set scroll settle delay
    pub fn with_scroll_settle(mut self, settle: Duration) -> Self {
        self.scroll_settle = settle;
        self
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(Error::Config("fps must be at least 1".to_string()));
        }
        if self.max_width == 0 || self.max_height == 0 {
            return Err(Error::Config(format!(
                "maximum frame size must be non-zero, got {}x{}",
                self.max_width, self.max_height
            )));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(Error::Config(format!(
                "JPEG quality must be within 1-100, got {}",
                self.quality
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fps, 80);
        assert_eq!((config.max_width, config.max_height), (1920, 1080));
        assert_eq!(config.quality, 80);
        assert_eq!(config.monitor, 1);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(Config::new().with_fps(0).validate().is_err());
        assert!(Config::new().with_max_size(0, 1080).validate().is_err());
        assert!(Config::new().with_quality(0).validate().is_err());
        assert!(Config::new().with_quality(101).validate().is_err());
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("shm".parse::<CaptureBackend>().unwrap(), CaptureBackend::Shm);
        assert_eq!("X11".parse::<CaptureBackend>().unwrap(), CaptureBackend::X11);
        assert!("wayland".parse::<CaptureBackend>().is_err());
    }

    #[test]
    fn test_transport_parsing() {
        assert_eq!("json".parse::<FrameTransport>().unwrap(), FrameTransport::Json);
        assert_eq!("binary".parse::<FrameTransport>().unwrap(), FrameTransport::Binary);
        assert!("h264".parse::<FrameTransport>().is_err());
    }
}

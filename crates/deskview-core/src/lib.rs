//! deskview Core - Shared types and protocol definitions
//!
//! This crate provides the frame, configuration, error and wire types used
//! across all deskview components.

pub mod config;
pub mod error;
pub mod frame;
pub mod protocol;

pub use config::{CaptureBackend, Config, FrameTransport};
pub use error::{Error, Result};
pub use frame::{EncodedFrame, Frame, PixelFormat};
pub use protocol::{InputEvent, Modifiers, MouseButton};

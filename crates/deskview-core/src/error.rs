//! Error types for deskview

use thiserror::Error;

/// Main error type for deskview operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("X11 connection error: {0}")]
    X11Connection(String),

    #[error("X11 extension not available: {0}")]
    X11ExtensionMissing(String),

    #[error("Monitor {index} not found ({available} available)")]
    MonitorNotFound { index: usize, available: usize },

    #[error("Unsupported pixel format: {0}")]
    UnsupportedPixelFormat(String),

    #[error("Screen capture failed: {0}")]
    CaptureError(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Image encoding error: {0}")]
    EncoderError(String),

    #[error("Input injection error: {0}")]
    InputError(String),

    #[error("Failed to create uinput device: {0}")]
    UinputCreation(String),

    #[error("Window activation failed: {0}")]
    Activation(String),

    #[error("Not supported on this platform: {0}")]
    Unsupported(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Command execution failed: {command} - {message}")]
    CommandFailed { command: String, message: String },
}

/// Result type alias using deskview's Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a command execution error
    pub fn command_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        Error::CommandFailed {
            command: command.into(),
            message: message.into(),
        }
    }
}

//! deskview Encoder - Frame processing and capture loop
//!
//! This crate turns raw captured frames into size-bounded JPEG images and
//! drives the paced capture → process → emit loop.

pub mod pacer;
pub mod pipeline;
pub mod processor;

pub use pacer::Pacer;
pub use pipeline::CaptureLoop;
pub use processor::{fit_within, FrameProcessor};

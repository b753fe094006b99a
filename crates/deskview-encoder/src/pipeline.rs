//! Paced capture loop
//!
//! One cycle is capture → process → emit → pace. The stop flag is checked
//! once per cycle, so cancellation takes effect at frame granularity.

use crate::{FrameProcessor, Pacer};
use deskview_capture::FrameSource;
use deskview_core::{EncodedFrame, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Drives a frame source at a target rate until asked to stop
pub struct CaptureLoop {
    processor: FrameProcessor,
    pacer: Pacer,
}

impl CaptureLoop {
    /// Create a new capture loop
    pub fn new(processor: FrameProcessor, pacer: Pacer) -> Self {
        Self { processor, pacer }
    }

    /// Run until `stop` is set or capture fails
    ///
    /// Capture errors end the loop and are returned. Processing errors only
    /// skip the affected frame. Returns the number of frames emitted.
    pub fn run<F>(mut self, source: &mut dyn FrameSource, stop: &AtomicBool, mut emit: F) -> Result<u64>
    where
        F: FnMut(EncodedFrame),
    {
        info!(
            "Capture loop started ({:.1} ms frame interval)",
            self.pacer.interval().as_secs_f64() * 1000.0
        );

        let mut frames_sent = 0u64;
        let mut frames_skipped = 0u64;

        while !stop.load(Ordering::Acquire) {
            let start = Instant::now();

            let frame = source.capture()?;

            match self.processor.process(&frame) {
                Ok(encoded) => {
                    frames_sent += 1;
                    if frames_sent <= 5 || frames_sent % 100 == 0 {
                        debug!(
                            "Frame {}: {}x{}, {} bytes in {:?}",
                            frames_sent,
                            encoded.width,
                            encoded.height,
                            encoded.data.len(),
                            start.elapsed()
                        );
                    }
                    emit(encoded);
                }
                Err(e) => {
                    frames_skipped += 1;
                    warn!("Skipping frame: {}", e);
                }
            }

            // Release the raw buffer before sleeping
            drop(frame);
            self.pacer.wait(start.elapsed());
        }

        info!(
            "Capture loop stopped ({} frames sent, {} skipped)",
            frames_sent, frames_skipped
        );
        Ok(frames_sent)
    }
}

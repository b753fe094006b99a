//! Frame downscaling and JPEG compression
//!
//! Frames larger than the configured bounding box are shrunk to fit it with
//! their aspect ratio preserved, then compressed at a fixed JPEG quality.
//! Frames are only ever downscaled.

use deskview_core::{EncodedFrame, Error, Frame, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::info;

/// Dimensions that fit `(width, height)` inside `(max_width, max_height)`
///
/// Returns the input unchanged when it already fits. Otherwise scales both
/// sides by `min(max_width / width, max_height / height)`, rounding to the
/// nearest pixel and never going below 1 or above the bound.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let scale = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    let scaled = |side: u32, bound: u32| ((side as f64 * scale).round() as u32).clamp(1, bound);

    (scaled(width, max_width), scaled(height, max_height))
}

/// Downscales and JPEG-encodes captured frames
pub struct FrameProcessor {
    max_width: u32,
    max_height: u32,
    quality: u8,
    /// RGB conversion buffer, reused across frames
    scratch: Vec<u8>,
    /// Size of the last encoded image, used to presize the next one
    last_encoded_len: usize,
}

impl FrameProcessor {
    /// Create a new processor
    pub fn new(max_width: u32, max_height: u32, quality: u8) -> Self {
        info!(
            "Frame processor initialized: max {}x{}, JPEG quality {}",
            max_width, max_height, quality
        );

        Self {
            max_width,
            max_height,
            quality: quality.clamp(1, 100),
            scratch: Vec::new(),
            last_encoded_len: 0,
        }
    }

    /// Normalize, downscale if needed, and compress one frame
    pub fn process(&mut self, frame: &Frame) -> Result<EncodedFrame> {
        let mut rgb = std::mem::take(&mut self.scratch);
        frame.write_rgb(&mut rgb)?;

        let image = RgbImage::from_raw(frame.width, frame.height, rgb)
            .ok_or_else(|| Error::InvalidFrame("RGB buffer does not match frame size".to_string()))?;

        let (width, height) = fit_within(frame.width, frame.height, self.max_width, self.max_height);

        let result = if (width, height) == (frame.width, frame.height) {
            let encoded = self.encode(&image);
            self.scratch = image.into_raw();
            encoded
        } else {
            // Triangle support widens with the downscale ratio, so every source
            // pixel contributes (area-averaging rather than point sampling).
            let resized = imageops::resize(&image, width, height, FilterType::Triangle);
            self.scratch = image.into_raw();
            self.encode(&resized)
        };

        let data = result?;
        self.last_encoded_len = data.len();

        Ok(EncodedFrame {
            data,
            width,
            height,
        })
    }

    fn encode(&self, image: &RgbImage) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.last_encoded_len + self.last_encoded_len / 4);
        let encoder = JpegEncoder::new_with_quality(&mut out, self.quality);
        image
            .write_with_encoder(encoder)
            .map_err(|e| Error::EncoderError(format!("JPEG encode failed: {}", e)))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskview_core::PixelFormat;
    use image::ImageFormat;

    fn gradient_frame(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 128, 255]);
            }
        }
        Frame::new(data, width, height, PixelFormat::Bgra)
    }

    fn decoded_size(frame: &EncodedFrame) -> (u32, u32) {
        let image = image::load_from_memory_with_format(&frame.data, ImageFormat::Jpeg).unwrap();
        (image.width(), image.height())
    }

    #[test]
    fn test_fit_within_keeps_small_frames() {
        assert_eq!(fit_within(1280, 720, 1920, 1080), (1280, 720));
        assert_eq!(fit_within(1920, 1080, 1920, 1080), (1920, 1080));
    }

    #[test]
    fn test_fit_within_bounds_and_aspect() {
        let cases = [
            (3840, 2160, 1920, 1080),
            (2560, 1600, 1920, 1080),
            (5120, 1440, 1920, 1080),
            (1080, 1920, 1920, 1080),
            (1921, 1081, 1920, 1080),
            (10_000, 3, 640, 480),
        ];

        for (w, h, max_w, max_h) in cases {
            let (out_w, out_h) = fit_within(w, h, max_w, max_h);
            assert!(out_w <= max_w && out_h <= max_h, "{}x{} -> {}x{}", w, h, out_w, out_h);
            assert!(out_w >= 1 && out_h >= 1);

            // Aspect ratio preserved within one pixel of rounding
            let expected_h = out_w as f64 * h as f64 / w as f64;
            assert!(
                (out_h as f64 - expected_h).abs() <= 1.0,
                "{}x{} -> {}x{} (expected height {:.2})",
                w,
                h,
                out_w,
                out_h,
                expected_h
            );
        }
    }

    #[test]
    fn test_fit_within_exact_halving() {
        assert_eq!(fit_within(3840, 2160, 1920, 1080), (1920, 1080));
        assert_eq!(fit_within(2560, 1440, 1280, 1280), (1280, 720));
    }

    #[test]
    fn test_process_without_resize() {
        let mut processor = FrameProcessor::new(1920, 1080, 80);
        let encoded = processor.process(&gradient_frame(64, 48)).unwrap();

        assert_eq!((encoded.width, encoded.height), (64, 48));
        assert_eq!(decoded_size(&encoded), (64, 48));
        assert_eq!(&encoded.data[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_process_downscales_oversized_frame() {
        let mut processor = FrameProcessor::new(100, 100, 80);
        let encoded = processor.process(&gradient_frame(400, 200)).unwrap();

        assert_eq!((encoded.width, encoded.height), (100, 50));
        assert_eq!(decoded_size(&encoded), (100, 50));
    }

    #[test]
    fn test_process_reuses_scratch_between_frames() {
        let mut processor = FrameProcessor::new(32, 32, 70);
        let first = processor.process(&gradient_frame(64, 64)).unwrap();
        let second = processor.process(&gradient_frame(64, 64)).unwrap();

        assert_eq!(first.data, second.data);
        assert!(processor.scratch.capacity() >= 64 * 64 * 3);
    }

    #[test]
    fn test_process_rejects_truncated_frame() {
        let mut processor = FrameProcessor::new(1920, 1080, 80);
        let frame = Frame::new(vec![0; 16], 64, 48, PixelFormat::Bgrx);
        assert!(matches!(processor.process(&frame), Err(Error::InvalidFrame(_))));

        // The processor stays usable after a bad frame
        assert!(processor.process(&gradient_frame(8, 8)).is_ok());
    }
}

//! Frame representation for captured and encoded screen data
//!
//! A [`Frame`] is the raw output of one capture call. It is owned by whichever
//! pipeline stage is working on it and is dropped at the end of the cycle.
//! An [`EncodedFrame`] is the compressed image handed to the broadcaster.

use crate::{Error, Result};

/// Byte layout of one pixel in a raw frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Blue, green, red, alpha
    Bgra,
    /// Blue, green, red, padding (X11 ZPixmap on little-endian 24/32-bit visuals)
    Bgrx,
    /// Red, green, blue, alpha
    Rgba,
    /// Packed red, green, blue
    Rgb,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Bgra | PixelFormat::Bgrx | PixelFormat::Rgba => 4,
            PixelFormat::Rgb => 3,
        }
    }
}

/// A captured screen frame
pub struct Frame {
    /// Raw pixel data, `stride` bytes per row
    data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Bytes per row, including any padding
    pub stride: usize,
    /// Pixel layout
    pub format: PixelFormat,
}

impl Frame {
    /// Create a new tightly packed frame
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Self {
        let stride = width as usize * format.bytes_per_pixel();
        Self::with_stride(data, width, height, stride, format)
    }

    /// Create a frame whose rows are `stride` bytes apart
    pub fn with_stride(
        data: Vec<u8>,
        width: u32,
        height: u32,
        stride: usize,
        format: PixelFormat,
    ) -> Self {
        Self {
            data,
            width,
            height,
            stride,
            format,
        }
    }

    /// Check that the buffer covers every row the dimensions promise
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidFrame(format!(
                "empty frame {}x{}",
                self.width, self.height
            )));
        }
        let row_bytes = self.width as usize * self.format.bytes_per_pixel();
        if self.stride < row_bytes {
            return Err(Error::InvalidFrame(format!(
                "stride {} shorter than row of {} bytes",
                self.stride, row_bytes
            )));
        }
        let needed = self.stride * (self.height as usize - 1) + row_bytes;
        if self.data.len() < needed {
            return Err(Error::InvalidFrame(format!(
                "buffer holds {} bytes, {}x{} {:?} needs {}",
                self.data.len(),
                self.width,
                self.height,
                self.format,
                needed
            )));
        }
        Ok(())
    }

    /// Normalize the frame into packed RGB, reusing `out`'s allocation
    pub fn write_rgb(&self, out: &mut Vec<u8>) -> Result<()> {
        self.validate()?;

        let width = self.width as usize;
        let bpp = self.format.bytes_per_pixel();
        out.clear();
        out.reserve(width * self.height as usize * 3);

        for row in self.data.chunks(self.stride).take(self.height as usize) {
            let row = &row[..width * bpp];
            match self.format {
                PixelFormat::Bgra | PixelFormat::Bgrx => {
                    for px in row.chunks_exact(4) {
                        out.extend_from_slice(&[px[2], px[1], px[0]]);
                    }
                }
                PixelFormat::Rgba => {
                    for px in row.chunks_exact(4) {
                        out.extend_from_slice(&px[..3]);
                    }
                }
                PixelFormat::Rgb => out.extend_from_slice(row),
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("format", &self.format)
            .field("size", &self.data.len())
            .finish()
    }
}

/// A compressed frame ready for transport
#[derive(Clone)]
pub struct EncodedFrame {
    /// Self-contained JPEG image
    pub data: Vec<u8>,
    /// Width after any downscaling
    pub width: u32,
    /// Height after any downscaling
    pub height: u32,
}

impl std::fmt::Debug for EncodedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("size", &self.data.len())
            .finish()
    }
}

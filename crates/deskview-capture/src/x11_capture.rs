//! X11 screen capture using the core protocol GetImage request

use crate::{Frame, FrameSource};
use deskview_core::{Error, PixelFormat, Result};
use tracing::debug;
use xcb::{randr, x, Extension};

/// Position and size of the captured monitor within the X11 desktop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorGeometry {
    /// Left edge in desktop coordinates
    pub x: i32,
    /// Top edge in desktop coordinates
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Size of the whole X11 root window
    pub desktop_width: u32,
    pub desktop_height: u32,
}

/// An open X11 connection aimed at one monitor
pub(crate) struct X11Target {
    pub conn: xcb::Connection,
    pub root: x::Window,
    pub geometry: MonitorGeometry,
    pub format: PixelFormat,
}

impl X11Target {
    /// Connect to the display and resolve the monitor region and pixel format
    ///
    /// Monitor 0 is the whole root window; monitor N is the N-th RandR monitor.
    pub fn open(monitor: usize, mandatory: &[Extension]) -> Result<Self> {
        let (conn, screen_num) =
            xcb::Connection::connect_with_extensions(None, mandatory, &[Extension::RandR])
                .map_err(|e| Error::X11Connection(e.to_string()))?;

        let setup = conn.get_setup();
        let screen = setup
            .roots()
            .nth(screen_num as usize)
            .ok_or_else(|| Error::X11Connection("Invalid screen".to_string()))?;

        let root = screen.root();
        let desktop_width = screen.width_in_pixels() as u32;
        let desktop_height = screen.height_in_pixels() as u32;
        let format = pixel_format(setup, screen.root_depth())?;

        let desktop = MonitorGeometry {
            x: 0,
            y: 0,
            width: desktop_width,
            height: desktop_height,
            desktop_width,
            desktop_height,
        };

        let geometry = if monitor == 0 {
            desktop
        } else if conn.active_extensions().any(|ext| ext == Extension::RandR) {
            let cookie = conn.send_request(&randr::GetMonitors {
                window: root,
                get_active: true,
            });
            let reply = conn
                .wait_for_reply(cookie)
                .map_err(|e| Error::X11Connection(format!("GetMonitors failed: {:?}", e)))?;

            let monitors: Vec<MonitorGeometry> = reply
                .monitors()
                .map(|m| MonitorGeometry {
                    x: m.x() as i32,
                    y: m.y() as i32,
                    width: m.width() as u32,
                    height: m.height() as u32,
                    desktop_width,
                    desktop_height,
                })
                .collect();

            let available = monitors.len();
            monitors
                .into_iter()
                .nth(monitor - 1)
                .ok_or(Error::MonitorNotFound {
                    index: monitor,
                    available,
                })?
        } else if monitor == 1 {
            debug!("RandR unavailable, treating monitor 1 as the whole screen");
            desktop
        } else {
            return Err(Error::X11ExtensionMissing("RANDR".to_string()));
        };

        debug!(
            "X11 target: monitor {} is {}x{} at ({}, {}), format {:?}",
            monitor, geometry.width, geometry.height, geometry.x, geometry.y, format
        );

        Ok(Self {
            conn,
            root,
            geometry,
            format,
        })
    }
}

/// Map the screen's visual to a pixel layout the encoder understands
fn pixel_format(setup: &x::Setup, depth: u8) -> Result<PixelFormat> {
    let bits_per_pixel = setup
        .pixmap_formats()
        .iter()
        .find(|f| f.depth() == depth)
        .map(|f| f.bits_per_pixel());
    let lsb_first = setup.image_byte_order() == x::ImageOrder::LsbFirst;

    match (depth, bits_per_pixel, lsb_first) {
        (24, Some(32), true) => Ok(PixelFormat::Bgrx),
        (32, Some(32), true) => Ok(PixelFormat::Bgra),
        _ => Err(Error::UnsupportedPixelFormat(format!(
            "depth {} with {:?} bits per pixel ({} byte order)",
            depth,
            bits_per_pixel,
            if lsb_first { "LSB" } else { "MSB" }
        ))),
    }
}

/// X11 screen capture over the core protocol
///
/// Every frame travels through the X11 socket, so this is slower than
/// [`crate::ShmCapture`] but works where shared memory is unavailable.
pub struct X11Capture {
    target: X11Target,
}

impl X11Capture {
    /// Create a new capture instance for the given monitor
    pub fn new(monitor: usize) -> Result<Self> {
        let target = X11Target::open(monitor, &[])?;
        Ok(Self { target })
    }
}

impl FrameSource for X11Capture {
    fn capture(&mut self) -> Result<Frame> {
        let g = self.target.geometry;
        let cookie = self.target.conn.send_request(&x::GetImage {
            format: x::ImageFormat::ZPixmap,
            drawable: x::Drawable::Window(self.target.root),
            x: g.x as i16,
            y: g.y as i16,
            width: g.width as u16,
            height: g.height as u16,
            plane_mask: u32::MAX,
        });

        let reply = self
            .target
            .conn
            .wait_for_reply(cookie)
            .map_err(|e| Error::CaptureError(format!("GetImage failed: {:?}", e)))?;

        Ok(Frame::new(
            reply.data().to_vec(),
            g.width,
            g.height,
            self.target.format,
        ))
    }

    fn size(&self) -> (u32, u32) {
        (self.target.geometry.width, self.target.geometry.height)
    }
}

//! X11 screen capture using MIT-SHM extension

use crate::x11_capture::X11Target;
use crate::{Frame, FrameSource};
use deskview_core::{Error, Result};
use std::ptr;
use tracing::{debug, info};
use xcb::Extension;

/// X11 screen capture using MIT-SHM to avoid copying pixels over the socket
pub struct ShmCapture {
    target: X11Target,
    shm_seg: xcb::shm::Seg,
    shm_id: i32,
    shm_addr: *mut libc::c_void,
    buffer_size: usize,
}

// Safety: the SHM segment is owned by this struct and only touched through &mut self
unsafe impl Send for ShmCapture {}

impl ShmCapture {
    /// Create a new SHM capture instance for the given monitor
    pub fn new(monitor: usize) -> Result<Self> {
        let target = X11Target::open(monitor, &[Extension::Shm])?;
        let conn = &target.conn;

        // Check for SHM extension
        let shm_cookie = conn.send_request(&xcb::shm::QueryVersion {});
        conn.wait_for_reply(shm_cookie)
            .map_err(|_| Error::X11ExtensionMissing("MIT-SHM".to_string()))?;

        info!("MIT-SHM extension available");

        let buffer_size =
            target.geometry.width as usize * target.geometry.height as usize * 4;

        // Create shared memory segment
        let shm_id = unsafe { libc::shmget(libc::IPC_PRIVATE, buffer_size, libc::IPC_CREAT | 0o600) };

        if shm_id < 0 {
            return Err(Error::CaptureError(format!(
                "shmget failed: {}",
                std::io::Error::last_os_error()
            )));
        }

        // Attach shared memory
        let shm_addr = unsafe { libc::shmat(shm_id, ptr::null(), 0) };
        if shm_addr == libc::MAP_FAILED {
            unsafe { libc::shmctl(shm_id, libc::IPC_RMID, ptr::null_mut()) };
            return Err(Error::CaptureError(format!(
                "shmat failed: {}",
                std::io::Error::last_os_error()
            )));
        }

        // Attach SHM to X server
        let shm_seg: xcb::shm::Seg = conn.generate_id();
        conn.send_request(&xcb::shm::Attach {
            shmseg: shm_seg,
            shmid: shm_id as u32,
            read_only: false,
        });

        if let Err(e) = conn.flush() {
            unsafe {
                libc::shmdt(shm_addr);
                libc::shmctl(shm_id, libc::IPC_RMID, ptr::null_mut());
            }
            return Err(Error::X11Connection(e.to_string()));
        }

        debug!(
            "SHM capture initialized: {}x{} at ({}, {})",
            target.geometry.width, target.geometry.height, target.geometry.x, target.geometry.y
        );

        Ok(Self {
            target,
            shm_seg,
            shm_id,
            shm_addr,
            buffer_size,
        })
    }
}

impl FrameSource for ShmCapture {
    fn capture(&mut self) -> Result<Frame> {
        let g = self.target.geometry;

        // Request the image via SHM
        let cookie = self.target.conn.send_request(&xcb::shm::GetImage {
            drawable: xcb::x::Drawable::Window(self.target.root),
            x: g.x as i16,
            y: g.y as i16,
            width: g.width as u16,
            height: g.height as u16,
            plane_mask: !0,
            format: xcb::x::ImageFormat::ZPixmap as u8,
            shmseg: self.shm_seg,
            offset: 0,
        });

        self.target
            .conn
            .wait_for_reply(cookie)
            .map_err(|e| Error::CaptureError(format!("GetImage failed: {:?}", e)))?;

        // Copy data out of shared memory before the next request overwrites it
        let data = unsafe {
            std::slice::from_raw_parts(self.shm_addr as *const u8, self.buffer_size).to_vec()
        };

        Ok(Frame::new(data, g.width, g.height, self.target.format))
    }

    fn size(&self) -> (u32, u32) {
        (self.target.geometry.width, self.target.geometry.height)
    }
}

impl Drop for ShmCapture {
    fn drop(&mut self) {
        // Detach from X server
        self.target.conn.send_request(&xcb::shm::Detach {
            shmseg: self.shm_seg,
        });
        let _ = self.target.conn.flush();

        // Detach and remove shared memory
        unsafe {
            libc::shmdt(self.shm_addr);
            libc::shmctl(self.shm_id, libc::IPC_RMID, ptr::null_mut());
        }

        debug!("SHM capture resources cleaned up");
    }
}

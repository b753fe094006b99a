//! Virtual mouse emulation

use crate::VirtualDevice;
use deskview_core::{MouseButton, Result};
use evdev::{AbsoluteAxisCode, EventType, InputEvent, KeyCode};
use tracing::debug;

/// Convert monitor pixel coordinates to desktop coordinates
///
/// The result is clamped to the desktop; out-of-range input saturates
/// instead of wrapping.
pub fn desktop_position(x: i32, y: i32, offset: (i32, i32), desktop: (u32, u32)) -> (i32, i32) {
    let max_x = i32::try_from(desktop.0.saturating_sub(1)).unwrap_or(i32::MAX);
    let max_y = i32::try_from(desktop.1.saturating_sub(1)).unwrap_or(i32::MAX);
    (
        x.saturating_add(offset.0).clamp(0, max_x),
        y.saturating_add(offset.1).clamp(0, max_y),
    )
}

/// Absolute pointer addressed in captured-monitor pixels
pub struct VirtualMouse {
    device: VirtualDevice,
    desktop_width: u32,
    desktop_height: u32,
    offset_x: i32,
    offset_y: i32,
}

impl VirtualMouse {
    /// Create a new virtual mouse
    ///
    /// `offset_x`/`offset_y` locate the captured monitor within the desktop.
    pub fn new(desktop_width: u32, desktop_height: u32, offset_x: i32, offset_y: i32) -> Result<Self> {
        let device =
            VirtualDevice::new_absolute_pointer("deskview Mouse", desktop_width, desktop_height)?;

        Ok(Self {
            device,
            desktop_width,
            desktop_height,
            offset_x,
            offset_y,
        })
    }

    fn to_absolute(&self, x: i32, y: i32) -> (i32, i32) {
        desktop_position(
            x,
            y,
            (self.offset_x, self.offset_y),
            (self.desktop_width, self.desktop_height),
        )
    }

    fn button_key(button: MouseButton) -> KeyCode {
        match button {
            MouseButton::Left => KeyCode::BTN_LEFT,
            MouseButton::Middle => KeyCode::BTN_MIDDLE,
            MouseButton::Right => KeyCode::BTN_RIGHT,
        }
    }

    /// Move the pointer without clicking
    pub fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        let (abs_x, abs_y) = self.to_absolute(x, y);

        debug!("Mouse move: pos=({}, {})", abs_x, abs_y);

        let events = [
            InputEvent::new(EventType::ABSOLUTE.0, AbsoluteAxisCode::ABS_X.0, abs_x),
            InputEvent::new(EventType::ABSOLUTE.0, AbsoluteAxisCode::ABS_Y.0, abs_y),
            InputEvent::new(EventType::SYNCHRONIZATION.0, 0, 0),
        ];

        self.device.emit(&events)
    }

    /// Click at position (down then up)
    pub fn click(&mut self, button: MouseButton, x: i32, y: i32) -> Result<()> {
        let key = Self::button_key(button);
        let (abs_x, abs_y) = self.to_absolute(x, y);

        debug!("Mouse click: button={:?}, pos=({}, {})", button, abs_x, abs_y);

        let events = [
            InputEvent::new(EventType::ABSOLUTE.0, AbsoluteAxisCode::ABS_X.0, abs_x),
            InputEvent::new(EventType::ABSOLUTE.0, AbsoluteAxisCode::ABS_Y.0, abs_y),
            InputEvent::new(EventType::SYNCHRONIZATION.0, 0, 0),
            InputEvent::new(EventType::KEY.0, key.0, 1),
            InputEvent::new(EventType::SYNCHRONIZATION.0, 0, 0),
            InputEvent::new(EventType::KEY.0, key.0, 0),
            InputEvent::new(EventType::SYNCHRONIZATION.0, 0, 0),
        ];

        self.device.emit(&events)
    }
}

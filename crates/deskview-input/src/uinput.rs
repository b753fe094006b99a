//! Virtual uinput device creation

use evdev::{
    uinput::VirtualDevice as EvdevVirtualDevice, AbsInfo, AbsoluteAxisCode, AttributeSet,
    InputEvent, KeyCode, UinputAbsSetup,
};
use deskview_core::{Error, Result};
use tracing::info;

fn creation_error(e: std::io::Error) -> Error {
    Error::UinputCreation(e.to_string())
}

/// Wrapper for evdev virtual device
pub struct VirtualDevice {
    device: EvdevVirtualDevice,
}

impl VirtualDevice {
    /// Create a virtual keyboard that can emit the given keys
    pub fn new_keyboard(name: &str, keys: &[KeyCode]) -> Result<Self> {
        let mut set = AttributeSet::<KeyCode>::new();
        for key in keys {
            set.insert(*key);
        }

        let device = EvdevVirtualDevice::builder()
            .map_err(creation_error)?
            .name(name)
            .with_keys(&set)
            .map_err(creation_error)?
            .build()
            .map_err(creation_error)?;

        info!("Created virtual keyboard: {} ({} keys)", name, keys.len());

        Ok(Self { device })
    }

    /// Create a virtual absolute pointer spanning the whole desktop
    ///
    /// Axis ranges cover `0..desktop_width` and `0..desktop_height` so a
    /// monitor at a non-zero offset is still addressable.
    pub fn new_absolute_pointer(name: &str, desktop_width: u32, desktop_height: u32) -> Result<Self> {
        let mut keys = AttributeSet::<KeyCode>::new();
        keys.insert(KeyCode::BTN_LEFT);
        keys.insert(KeyCode::BTN_RIGHT);
        keys.insert(KeyCode::BTN_MIDDLE);

        let max_x = desktop_width.saturating_sub(1).max(1) as i32;
        let max_y = desktop_height.saturating_sub(1).max(1) as i32;
        let x_abs = AbsInfo::new(0, 0, max_x, 0, 0, 1);
        let y_abs = AbsInfo::new(0, 0, max_y, 0, 0, 1);

        let device = EvdevVirtualDevice::builder()
            .map_err(creation_error)?
            .name(name)
            .with_keys(&keys)
            .map_err(creation_error)?
            .with_absolute_axis(&UinputAbsSetup::new(AbsoluteAxisCode::ABS_X, x_abs))
            .map_err(creation_error)?
            .with_absolute_axis(&UinputAbsSetup::new(AbsoluteAxisCode::ABS_Y, y_abs))
            .map_err(creation_error)?
            .build()
            .map_err(creation_error)?;

        info!(
            "Created virtual absolute pointer: {} ({}x{} desktop)",
            name, desktop_width, desktop_height
        );

        Ok(Self { device })
    }

    /// Emit input events
    pub fn emit(&mut self, events: &[InputEvent]) -> Result<()> {
        self.device
            .emit(events)
            .map_err(|e| Error::InputError(e.to_string()))
    }
}

//! OS input injection seam

use crate::{Key, VirtualKeyboard, VirtualMouse};
use deskview_core::{MouseButton, Result};

/// Synthesizes pointer and keyboard input on the host
///
/// Coordinates are pixels within the captured monitor.
pub trait InputInjector: Send {
    fn click(&mut self, x: i32, y: i32, button: MouseButton) -> Result<()>;

    fn move_to(&mut self, x: i32, y: i32) -> Result<()>;

    fn press(&mut self, key: &Key) -> Result<()>;

    /// Hold the keys down in order, then release them in reverse
    fn hotkey(&mut self, keys: &[Key]) -> Result<()>;

    fn write(&mut self, text: &str) -> Result<()>;
}

/// Injector backed by uinput virtual devices
pub struct UinputInjector {
    mouse: VirtualMouse,
    keyboard: VirtualKeyboard,
}

impl UinputInjector {
    /// Create the virtual pointer and keyboard
    ///
    /// The offset places the captured monitor within a desktop of
    /// `desktop_width` x `desktop_height` pixels.
    pub fn new(desktop_width: u32, desktop_height: u32, offset_x: i32, offset_y: i32) -> Result<Self> {
        Ok(Self {
            mouse: VirtualMouse::new(desktop_width, desktop_height, offset_x, offset_y)?,
            keyboard: VirtualKeyboard::new()?,
        })
    }
}

impl InputInjector for UinputInjector {
    fn click(&mut self, x: i32, y: i32, button: MouseButton) -> Result<()> {
        self.mouse.click(button, x, y)
    }

    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        self.mouse.move_to(x, y)
    }

    fn press(&mut self, key: &Key) -> Result<()> {
        self.keyboard.press(key)
    }

    fn hotkey(&mut self, keys: &[Key]) -> Result<()> {
        self.keyboard.hotkey(keys)
    }

    fn write(&mut self, text: &str) -> Result<()> {
        self.keyboard.write(text)
    }
}

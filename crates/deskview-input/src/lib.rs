//! deskview Input - Viewer input relay and injection
//!
//! This crate translates viewer input events into OS input: a uinput
//! absolute pointer and keyboard do the injection, and a per-platform
//! window activator runs ahead of page-key scrolling.

pub mod activator;
pub mod injector;
pub mod keyboard;
pub mod keys;
pub mod mouse;
pub mod relay;
pub mod uinput;

pub use activator::{
    detect_activator, LinuxActivator, MacActivator, UnsupportedActivator, WindowActivator,
    WindowsActivator,
};
pub use injector::{InputInjector, UinputInjector};
pub use keyboard::VirtualKeyboard;
pub use keys::Key;
pub use mouse::{desktop_position, VirtualMouse};
pub use relay::{InputRelay, KeyAction};
pub use uinput::VirtualDevice;

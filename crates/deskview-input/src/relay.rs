//! Viewer input relay
//!
//! Translates viewer input events into injector calls. Failures are logged
//! and the event dropped; nothing is reported back to the viewer.

use crate::{InputInjector, Key, WindowActivator};
use deskview_core::{Error, InputEvent, Modifiers, Result};
use std::time::Duration;
use tracing::{debug, warn};

/// What a key event turns into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Press(Key),
    Hotkey(Vec<Key>),
    Write(String),
}

impl KeyAction {
    /// Translate a DOM key name and modifier state
    ///
    /// Named keys are pressed, other keys typed as text. Active modifiers
    /// turn either into a chord held in ctrl, shift, alt order.
    pub fn from_key(key: &str, modifiers: Modifiers) -> Self {
        let named = Key::from_dom_name(key);

        if modifiers.is_empty() {
            return match named {
                Some(key) => KeyAction::Press(key),
                None => KeyAction::Write(key.to_string()),
            };
        }

        let mut keys = Vec::with_capacity(4);
        if modifiers.ctrl {
            keys.push(Key::Control);
        }
        if modifiers.shift {
            keys.push(Key::Shift);
        }
        if modifiers.alt {
            keys.push(Key::Alt);
        }
        keys.push(named.unwrap_or_else(|| Key::Literal(key.to_string())));
        KeyAction::Hotkey(keys)
    }
}

/// Parse a scroll delta into a page key
///
/// The delta is rounded half away from zero; a positive result pages down and
/// anything else, zero included, pages up. Returns `None` for unparsable or
/// non-finite values.
pub fn scroll_key(dy: &str) -> Option<Key> {
    let value: f64 = dy.trim().parse().ok().filter(|v: &f64| v.is_finite())?;
    if value.round() > 0.0 {
        Some(Key::PageDown)
    } else {
        Some(Key::PageUp)
    }
}

/// Applies viewer input events through an injector
pub struct InputRelay<I: InputInjector> {
    injector: I,
    activator: Box<dyn WindowActivator>,
    settle: Duration,
}

impl<I: InputInjector> InputRelay<I> {
    /// Create a relay; `settle` is the pause between window activation and
    /// the scroll key press
    pub fn new(injector: I, activator: Box<dyn WindowActivator>, settle: Duration) -> Self {
        debug!("Input relay using {} window activation", activator.name());
        Self {
            injector,
            activator,
            settle,
        }
    }

    /// The underlying injector
    pub fn injector(&self) -> &I {
        &self.injector
    }

    /// Apply one event, logging any failure
    pub fn on_event(&mut self, event: InputEvent) {
        let result = match event {
            InputEvent::Click { x, y, button } => {
                debug!("Click at ({}, {}) with {:?}", x, y, button);
                self.injector.click(x, y, button)
            }
            InputEvent::Move { x, y } => self.injector.move_to(x, y),
            InputEvent::Scroll { dy } => self.scroll(&dy),
            InputEvent::Key { key, modifiers, .. } => self.key(&key, modifiers),
        };

        if let Err(e) = result {
            warn!("Dropping input event: {}", e);
        }
    }

    fn scroll(&mut self, dy: &str) -> Result<()> {
        let Some(key) = scroll_key(dy) else {
            warn!("Invalid scroll value: {:?}", dy);
            return Ok(());
        };

        match self.activator.activate() {
            Ok(()) => {}
            Err(Error::Unsupported(what)) => {
                warn!("Unsupported OS for window activation ({}), skipping scroll", what);
                return Ok(());
            }
            Err(e) => {
                warn!("Error during scrolling: {}", e);
                return Ok(());
            }
        }

        if !self.settle.is_zero() {
            std::thread::sleep(self.settle);
        }

        debug!("Scrolling with {}", key);
        self.injector.press(&key)
    }

    fn key(&mut self, key: &str, modifiers: Modifiers) -> Result<()> {
        if key.is_empty() {
            debug!("Ignoring key event with empty key");
            return Ok(());
        }

        match KeyAction::from_key(key, modifiers) {
            KeyAction::Press(key) => self.injector.press(&key),
            KeyAction::Hotkey(keys) => self.injector.hotkey(&keys),
            KeyAction::Write(text) => self.injector.write(&text),
        }
    }
}

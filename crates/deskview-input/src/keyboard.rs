//! Virtual keyboard emulation
//!
//! Text is typed through a US layout table. Characters the table cannot
//! express are skipped with a warning.

use crate::{Key, VirtualDevice};
use deskview_core::{Error, Result};
use evdev::{EventType, InputEvent, KeyCode};
use tracing::{debug, warn};

/// A key code plus whether Shift must be held for it
type Stroke = (KeyCode, bool);

const LETTERS: [KeyCode; 26] = [
    KeyCode::KEY_A,
    KeyCode::KEY_B,
    KeyCode::KEY_C,
    KeyCode::KEY_D,
    KeyCode::KEY_E,
    KeyCode::KEY_F,
    KeyCode::KEY_G,
    KeyCode::KEY_H,
    KeyCode::KEY_I,
    KeyCode::KEY_J,
    KeyCode::KEY_K,
    KeyCode::KEY_L,
    KeyCode::KEY_M,
    KeyCode::KEY_N,
    KeyCode::KEY_O,
    KeyCode::KEY_P,
    KeyCode::KEY_Q,
    KeyCode::KEY_R,
    KeyCode::KEY_S,
    KeyCode::KEY_T,
    KeyCode::KEY_U,
    KeyCode::KEY_V,
    KeyCode::KEY_W,
    KeyCode::KEY_X,
    KeyCode::KEY_Y,
    KeyCode::KEY_Z,
];

const DIGITS: [KeyCode; 10] = [
    KeyCode::KEY_0,
    KeyCode::KEY_1,
    KeyCode::KEY_2,
    KeyCode::KEY_3,
    KeyCode::KEY_4,
    KeyCode::KEY_5,
    KeyCode::KEY_6,
    KeyCode::KEY_7,
    KeyCode::KEY_8,
    KeyCode::KEY_9,
];

const FUNCTION_KEYS: [KeyCode; 12] = [
    KeyCode::KEY_F1,
    KeyCode::KEY_F2,
    KeyCode::KEY_F3,
    KeyCode::KEY_F4,
    KeyCode::KEY_F5,
    KeyCode::KEY_F6,
    KeyCode::KEY_F7,
    KeyCode::KEY_F8,
    KeyCode::KEY_F9,
    KeyCode::KEY_F10,
    KeyCode::KEY_F11,
    KeyCode::KEY_F12,
];

/// Look up the stroke that types `c`
fn char_stroke(c: char) -> Option<Stroke> {
    if c.is_ascii_lowercase() {
        return Some((LETTERS[(c as u8 - b'a') as usize], false));
    }
    if c.is_ascii_uppercase() {
        return Some((LETTERS[(c as u8 - b'A') as usize], true));
    }
    if c.is_ascii_digit() {
        return Some((DIGITS[(c as u8 - b'0') as usize], false));
    }

    let stroke = match c {
        ' ' => (KeyCode::KEY_SPACE, false),
        '\n' => (KeyCode::KEY_ENTER, false),
        '\t' => (KeyCode::KEY_TAB, false),
        '-' => (KeyCode::KEY_MINUS, false),
        '_' => (KeyCode::KEY_MINUS, true),
        '=' => (KeyCode::KEY_EQUAL, false),
        '+' => (KeyCode::KEY_EQUAL, true),
        '[' => (KeyCode::KEY_LEFTBRACE, false),
        '{' => (KeyCode::KEY_LEFTBRACE, true),
        ']' => (KeyCode::KEY_RIGHTBRACE, false),
        '}' => (KeyCode::KEY_RIGHTBRACE, true),
        '\\' => (KeyCode::KEY_BACKSLASH, false),
        '|' => (KeyCode::KEY_BACKSLASH, true),
        ';' => (KeyCode::KEY_SEMICOLON, false),
        ':' => (KeyCode::KEY_SEMICOLON, true),
        '\'' => (KeyCode::KEY_APOSTROPHE, false),
        '"' => (KeyCode::KEY_APOSTROPHE, true),
        '`' => (KeyCode::KEY_GRAVE, false),
        '~' => (KeyCode::KEY_GRAVE, true),
        ',' => (KeyCode::KEY_COMMA, false),
        '<' => (KeyCode::KEY_COMMA, true),
        '.' => (KeyCode::KEY_DOT, false),
        '>' => (KeyCode::KEY_DOT, true),
        '/' => (KeyCode::KEY_SLASH, false),
        '?' => (KeyCode::KEY_SLASH, true),
        '!' => (KeyCode::KEY_1, true),
        '@' => (KeyCode::KEY_2, true),
        '#' => (KeyCode::KEY_3, true),
        '$' => (KeyCode::KEY_4, true),
        '%' => (KeyCode::KEY_5, true),
        '^' => (KeyCode::KEY_6, true),
        '&' => (KeyCode::KEY_7, true),
        '*' => (KeyCode::KEY_8, true),
        '(' => (KeyCode::KEY_9, true),
        ')' => (KeyCode::KEY_0, true),
        _ => return None,
    };
    Some(stroke)
}

/// Multi-character key names accepted as hotkey literals
fn extended_key(name: &str) -> Option<KeyCode> {
    let lower = name.to_ascii_lowercase();
    if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<usize>().ok()) {
        return (1..=12).contains(&n).then(|| FUNCTION_KEYS[n - 1]);
    }
    let code = match lower.as_str() {
        "home" => KeyCode::KEY_HOME,
        "end" => KeyCode::KEY_END,
        "insert" => KeyCode::KEY_INSERT,
        "pageup" => KeyCode::KEY_PAGEUP,
        "pagedown" => KeyCode::KEY_PAGEDOWN,
        _ => return None,
    };
    Some(code)
}

/// Resolve a key to the stroke that produces it
fn key_stroke(key: &Key) -> Option<Stroke> {
    let code = match key {
        Key::Backspace => KeyCode::KEY_BACKSPACE,
        Key::Delete => KeyCode::KEY_DELETE,
        Key::Enter => KeyCode::KEY_ENTER,
        Key::Tab => KeyCode::KEY_TAB,
        Key::Escape => KeyCode::KEY_ESC,
        Key::Left => KeyCode::KEY_LEFT,
        Key::Right => KeyCode::KEY_RIGHT,
        Key::Up => KeyCode::KEY_UP,
        Key::Down => KeyCode::KEY_DOWN,
        Key::Space => KeyCode::KEY_SPACE,
        Key::CapsLock => KeyCode::KEY_CAPSLOCK,
        Key::Shift => KeyCode::KEY_LEFTSHIFT,
        Key::Control => KeyCode::KEY_LEFTCTRL,
        Key::Alt => KeyCode::KEY_LEFTALT,
        Key::PageUp => KeyCode::KEY_PAGEUP,
        Key::PageDown => KeyCode::KEY_PAGEDOWN,
        Key::Literal(text) => {
            let mut chars = text.chars();
            return match (chars.next(), chars.next()) {
                (Some(c), None) => char_stroke(c),
                _ => extended_key(text).map(|code| (code, false)),
            };
        }
    };
    Some((code, false))
}

/// Every key code the keyboard device must advertise
fn supported_keys() -> Vec<KeyCode> {
    let mut keys: Vec<KeyCode> = LETTERS
        .iter()
        .chain(DIGITS.iter())
        .chain(FUNCTION_KEYS.iter())
        .copied()
        .collect();
    keys.extend([
        KeyCode::KEY_SPACE,
        KeyCode::KEY_ENTER,
        KeyCode::KEY_TAB,
        KeyCode::KEY_MINUS,
        KeyCode::KEY_EQUAL,
        KeyCode::KEY_LEFTBRACE,
        KeyCode::KEY_RIGHTBRACE,
        KeyCode::KEY_BACKSLASH,
        KeyCode::KEY_SEMICOLON,
        KeyCode::KEY_APOSTROPHE,
        KeyCode::KEY_GRAVE,
        KeyCode::KEY_COMMA,
        KeyCode::KEY_DOT,
        KeyCode::KEY_SLASH,
        KeyCode::KEY_BACKSPACE,
        KeyCode::KEY_DELETE,
        KeyCode::KEY_ESC,
        KeyCode::KEY_LEFT,
        KeyCode::KEY_RIGHT,
        KeyCode::KEY_UP,
        KeyCode::KEY_DOWN,
        KeyCode::KEY_CAPSLOCK,
        KeyCode::KEY_LEFTSHIFT,
        KeyCode::KEY_LEFTCTRL,
        KeyCode::KEY_LEFTALT,
        KeyCode::KEY_PAGEUP,
        KeyCode::KEY_PAGEDOWN,
        KeyCode::KEY_HOME,
        KeyCode::KEY_END,
        KeyCode::KEY_INSERT,
    ]);
    keys
}

fn key_event(code: KeyCode, value: i32) -> [InputEvent; 2] {
    [
        InputEvent::new(EventType::KEY.0, code.0, value),
        InputEvent::new(EventType::SYNCHRONIZATION.0, 0, 0),
    ]
}

/// Virtual keyboard for key presses, chords and text
pub struct VirtualKeyboard {
    device: VirtualDevice,
}

impl VirtualKeyboard {
    /// Create a new virtual keyboard
    pub fn new() -> Result<Self> {
        let device = VirtualDevice::new_keyboard("deskview Keyboard", &supported_keys())?;
        Ok(Self { device })
    }

    /// Press the codes in order, then release them in reverse
    fn chord(&mut self, codes: &[KeyCode]) -> Result<()> {
        let mut events = Vec::with_capacity(codes.len() * 4);
        for code in codes {
            events.extend(key_event(*code, 1));
        }
        for code in codes.iter().rev() {
            events.extend(key_event(*code, 0));
        }
        self.device.emit(&events)
    }

    fn stroke(&mut self, (code, shift): Stroke) -> Result<()> {
        if shift {
            self.chord(&[KeyCode::KEY_LEFTSHIFT, code])
        } else {
            self.chord(&[code])
        }
    }

    /// Press and release a single key
    pub fn press(&mut self, key: &Key) -> Result<()> {
        let stroke = key_stroke(key)
            .ok_or_else(|| Error::InputError(format!("Unsupported key: {}", key)))?;
        debug!("Key press: {}", key);
        self.stroke(stroke)
    }

    /// Hold `keys` down in order, then release them in reverse
    pub fn hotkey(&mut self, keys: &[Key]) -> Result<()> {
        let mut codes = Vec::with_capacity(keys.len() + 1);
        for key in keys {
            let (code, shift) = key_stroke(key)
                .ok_or_else(|| Error::InputError(format!("Unsupported key: {}", key)))?;
            if shift && !codes.contains(&KeyCode::KEY_LEFTSHIFT) {
                codes.push(KeyCode::KEY_LEFTSHIFT);
            }
            codes.push(code);
        }

        debug!(
            "Hotkey: {}",
            keys.iter().map(Key::name).collect::<Vec<_>>().join("+")
        );
        self.chord(&codes)
    }

    /// Type `text` character by character
    pub fn write(&mut self, text: &str) -> Result<()> {
        for c in text.chars() {
            match char_stroke(c) {
                Some(stroke) => self.stroke(stroke)?,
                None => warn!("Cannot type character {:?} on a US layout, skipping", c),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_strokes() {
        assert_eq!(char_stroke('a'), Some((KeyCode::KEY_A, false)));
        assert_eq!(char_stroke('Z'), Some((KeyCode::KEY_Z, true)));
        assert_eq!(char_stroke('7'), Some((KeyCode::KEY_7, false)));
        assert_eq!(char_stroke('?'), Some((KeyCode::KEY_SLASH, true)));
        assert_eq!(char_stroke(' '), Some((KeyCode::KEY_SPACE, false)));
        assert_eq!(char_stroke('é'), None);
    }

    #[test]
    fn test_key_strokes() {
        assert_eq!(key_stroke(&Key::Escape), Some((KeyCode::KEY_ESC, false)));
        assert_eq!(key_stroke(&Key::PageDown), Some((KeyCode::KEY_PAGEDOWN, false)));
        assert_eq!(
            key_stroke(&Key::Literal("c".to_string())),
            Some((KeyCode::KEY_C, false))
        );
        assert_eq!(
            key_stroke(&Key::Literal("F5".to_string())),
            Some((KeyCode::KEY_F5, false))
        );
        assert_eq!(
            key_stroke(&Key::Literal("Home".to_string())),
            Some((KeyCode::KEY_HOME, false))
        );
        assert_eq!(key_stroke(&Key::Literal("F13".to_string())), None);
        assert_eq!(key_stroke(&Key::Literal("Meta".to_string())), None);
        assert_eq!(key_stroke(&Key::Literal(String::new())), None);
    }

    #[test]
    fn test_supported_keys_cover_tables() {
        let keys = supported_keys();
        for c in ('a'..='z').chain('0'..='9').chain("!@#$%^&*()-_=+[]{};:'\",.<>/?`~\\| ".chars()) {
            let (code, _) = char_stroke(c).unwrap();
            assert!(keys.contains(&code), "missing {:?}", c);
        }
        for key in [Key::Escape, Key::CapsLock, Key::Control, Key::PageUp] {
            let (code, _) = key_stroke(&key).unwrap();
            assert!(keys.contains(&code));
        }
    }
}

//! Platform-neutral key identifiers

/// A key the injector can press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,
    Left,
    Right,
    Up,
    Down,
    Space,
    CapsLock,
    Shift,
    Control,
    Alt,
    PageUp,
    PageDown,
    /// Anything outside the named set, taken as typed text
    Literal(String),
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` name from the closed set of special keys
    ///
    /// Returns `None` for everything else, which the relay treats as text.
    pub fn from_dom_name(name: &str) -> Option<Key> {
        let key = match name {
            "Backspace" => Key::Backspace,
            "Delete" => Key::Delete,
            "Enter" => Key::Enter,
            "Tab" => Key::Tab,
            "Escape" => Key::Escape,
            "ArrowLeft" => Key::Left,
            "ArrowRight" => Key::Right,
            "ArrowUp" => Key::Up,
            "ArrowDown" => Key::Down,
            "Space" => Key::Space,
            "CapsLock" => Key::CapsLock,
            "Shift" => Key::Shift,
            "Control" => Key::Control,
            "Alt" => Key::Alt,
            _ => return None,
        };
        Some(key)
    }

    /// Short lowercase name, used in logs
    pub fn name(&self) -> &str {
        match self {
            Key::Backspace => "backspace",
            Key::Delete => "delete",
            Key::Enter => "enter",
            Key::Tab => "tab",
            Key::Escape => "esc",
            Key::Left => "left",
            Key::Right => "right",
            Key::Up => "up",
            Key::Down => "down",
            Key::Space => "space",
            Key::CapsLock => "capslock",
            Key::Shift => "shift",
            Key::Control => "ctrl",
            Key::Alt => "alt",
            Key::PageUp => "pageup",
            Key::PageDown => "pagedown",
            Key::Literal(text) => text,
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_keys() {
        assert_eq!(Key::from_dom_name("Enter"), Some(Key::Enter));
        assert_eq!(Key::from_dom_name("Escape"), Some(Key::Escape));
        assert_eq!(Key::from_dom_name("ArrowUp"), Some(Key::Up));
        assert_eq!(Key::from_dom_name("Control"), Some(Key::Control));
        assert_eq!(Key::from_dom_name("CapsLock"), Some(Key::CapsLock));
    }

    #[test]
    fn test_unnamed_keys_are_text() {
        assert_eq!(Key::from_dom_name("a"), None);
        assert_eq!(Key::from_dom_name("enter"), None);
        assert_eq!(Key::from_dom_name("PageDown"), None);
        assert_eq!(Key::from_dom_name("F5"), None);
    }

    #[test]
    fn test_names() {
        assert_eq!(Key::Escape.to_string(), "esc");
        assert_eq!(Key::Control.name(), "ctrl");
        assert_eq!(Key::Literal("x".to_string()).name(), "x");
    }
}

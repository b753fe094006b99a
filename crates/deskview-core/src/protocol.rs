//! WebSocket protocol message types
//!
//! Inbound messages are JSON objects tagged by `type`. The viewer sends the
//! modifier flags of `key` messages as the strings `"true"`/`"false"`; that
//! quirk is kept for compatibility, and native booleans are accepted too.

use crate::{EncodedFrame, FrameTransport};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Length of the width/height prefix on binary frame messages
pub const BINARY_HEADER_LEN: usize = 8;

/// Pointer button
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Middle,
    Right,
}

/// Keyboard modifier keys held with a key event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub fn is_empty(&self) -> bool {
        !(self.ctrl || self.shift || self.alt)
    }
}

/// Input events relayed from the viewer to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Click at absolute screen coordinates
    Click { x: i32, y: i32, button: MouseButton },
    /// Absolute pointer movement
    Move { x: i32, y: i32 },
    /// Vertical scroll; the delta is kept as received and parsed by the relay
    Scroll { dy: String },
    /// Key press with held modifiers
    Key {
        /// DOM `KeyboardEvent.key` value
        key: String,
        /// DOM `KeyboardEvent.code` value, informational only
        code: Option<String>,
        modifiers: Modifiers,
    },
}

/// Messages as the viewer puts them on the wire
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewerMessage {
    Click {
        #[serde(deserialize_with = "coordinate")]
        x: i32,
        #[serde(deserialize_with = "coordinate")]
        y: i32,
        #[serde(default)]
        button: MouseButton,
    },
    Move {
        #[serde(deserialize_with = "coordinate")]
        x: i32,
        #[serde(deserialize_with = "coordinate")]
        y: i32,
    },
    Scroll {
        #[serde(deserialize_with = "raw_text")]
        dy: String,
    },
    Key {
        key: String,
        #[serde(default)]
        code: Option<String>,
        #[serde(default, deserialize_with = "wire_flag")]
        shift: bool,
        #[serde(default, deserialize_with = "wire_flag")]
        ctrl: bool,
        #[serde(default, deserialize_with = "wire_flag")]
        alt: bool,
    },
}

impl From<ViewerMessage> for InputEvent {
    fn from(msg: ViewerMessage) -> Self {
        match msg {
            ViewerMessage::Click { x, y, button } => InputEvent::Click { x, y, button },
            ViewerMessage::Move { x, y } => InputEvent::Move { x, y },
            ViewerMessage::Scroll { dy } => InputEvent::Scroll { dy },
            ViewerMessage::Key {
                key,
                code,
                shift,
                ctrl,
                alt,
            } => InputEvent::Key {
                key,
                code,
                modifiers: Modifiers { ctrl, shift, alt },
            },
        }
    }
}

/// Parse one inbound text message into an input event
pub fn parse_input(text: &str) -> serde_json::Result<InputEvent> {
    serde_json::from_str::<ViewerMessage>(text).map(InputEvent::from)
}

/// Server-to-viewer messages sent as JSON text
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once when the viewer connects
    Init {
        /// Size of the captured area in input coordinates
        screen_width: u32,
        screen_height: u32,
        /// How subsequent frames are framed
        transport: FrameTransport,
    },
    /// One encoded frame (JSON transport)
    ImageFrame {
        /// Base64-encoded JPEG
        data: String,
        width: u32,
        height: u32,
    },
}

/// Build a binary frame message: width and height as big-endian u32, then the image
pub fn encode_binary_frame(frame: &EncodedFrame) -> Vec<u8> {
    let mut buf = Vec::with_capacity(BINARY_HEADER_LEN + frame.data.len());
    buf.extend_from_slice(&frame.width.to_be_bytes());
    buf.extend_from_slice(&frame.height.to_be_bytes());
    buf.extend_from_slice(&frame.data);
    buf
}

/// Split a binary frame message into (width, height, image bytes)
pub fn decode_binary_frame(buf: &[u8]) -> Option<(u32, u32, &[u8])> {
    if buf.len() < BINARY_HEADER_LEN {
        return None;
    }
    let width = u32::from_be_bytes(buf[0..4].try_into().ok()?);
    let height = u32::from_be_bytes(buf[4..8].try_into().ok()?);
    Some((width, height, &buf[BINARY_HEADER_LEN..]))
}

/// Integer coordinate sent as a JSON number (truncated) or an integer string
fn coordinate<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .filter(|v| v.is_finite())
            .map(|v| v as i32)
            .ok_or_else(|| de::Error::custom(format!("invalid coordinate: {}", n))),
        Value::String(s) => s
            .trim()
            .parse::<i32>()
            .map_err(|_| de::Error::custom(format!("invalid coordinate: {:?}", s))),
        other => Err(de::Error::custom(format!("invalid coordinate: {}", other))),
    }
}

/// Keep any scalar as text so malformed values reach the relay for logging
fn raw_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// `"true"` (or JSON `true`) is set; everything else is unset
fn wire_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s == "true",
        Value::Bool(b) => b,
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_flags_as_strings() {
        let event = parse_input(
            r#"{"type":"key","key":"Enter","code":"Enter","shift":"false","ctrl":"true","alt":"false"}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            InputEvent::Key {
                key: "Enter".to_string(),
                code: Some("Enter".to_string()),
                modifiers: Modifiers {
                    ctrl: true,
                    shift: false,
                    alt: false
                },
            }
        );
    }

    #[test]
    fn test_key_flags_native_and_missing() {
        let event = parse_input(r#"{"type":"key","key":"a","shift":true,"alt":"yes"}"#).unwrap();
        match event {
            InputEvent::Key { modifiers, code, .. } => {
                assert!(modifiers.shift);
                assert!(!modifiers.ctrl);
                assert!(!modifiers.alt);
                assert_eq!(code, None);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_scroll_delta_kept_as_text() {
        assert_eq!(
            parse_input(r#"{"type":"scroll","dy":"3.7"}"#).unwrap(),
            InputEvent::Scroll { dy: "3.7".to_string() }
        );
        assert_eq!(
            parse_input(r#"{"type":"scroll","dy":-2}"#).unwrap(),
            InputEvent::Scroll { dy: "-2".to_string() }
        );
        assert_eq!(
            parse_input(r#"{"type":"scroll","dy":"abc"}"#).unwrap(),
            InputEvent::Scroll { dy: "abc".to_string() }
        );
    }

    #[test]
    fn test_click_coordinates() {
        assert_eq!(
            parse_input(r#"{"type":"click","x":"120","y":45.9,"button":"right"}"#).unwrap(),
            InputEvent::Click {
                x: 120,
                y: 45,
                button: MouseButton::Right
            }
        );
        assert_eq!(
            parse_input(r#"{"type":"move","x":1,"y":2}"#).unwrap(),
            InputEvent::Move { x: 1, y: 2 }
        );
        assert!(parse_input(r#"{"type":"click","x":"left","y":1}"#).is_err());
        assert!(parse_input(r#"{"type":"teleport","x":1,"y":2}"#).is_err());
    }

    #[test]
    fn test_image_frame_json_shape() {
        let msg = ServerMessage::ImageFrame {
            data: "AAAA".to_string(),
            width: 640,
            height: 360,
        };
        let value: Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "image_frame");
        assert_eq!(value["data"], "AAAA");
        assert_eq!(value["width"], 640);
        assert_eq!(value["height"], 360);
    }

    #[test]
    fn test_binary_frame_header() {
        let frame = EncodedFrame {
            data: vec![0xFF, 0xD8, 0xFF],
            width: 1920,
            height: 1080,
        };
        let buf = encode_binary_frame(&frame);
        assert_eq!(buf.len(), BINARY_HEADER_LEN + 3);
        let (w, h, image) = decode_binary_frame(&buf).unwrap();
        assert_eq!((w, h), (1920, 1080));
        assert_eq!(image, &[0xFF, 0xD8, 0xFF]);
        assert!(decode_binary_frame(&buf[..4]).is_none());
    }
}

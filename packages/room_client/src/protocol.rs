//! Wire-level frame model for the chat channel.
//!
//! The backend discriminates frames by field presence rather than a type tag:
//! a JSON object carrying `roomId` is a room assignment, any other JSON
//! object is a chat message. [`InboundFrame::classify`] is the single place
//! that decision is made, so call sites never probe fields ad hoc.

use serde::{Deserialize, Serialize};

/// One chat message as stored in the transcript.
///
/// Every field is defaulted: the backend owns the shape of chat frames, and
/// the transcript accepts whatever parsed. A frame missing `sender` or
/// `message` still appends, rendering the gaps as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub message: String,
    /// ISO-8601 string, kept verbatim. Arrival order, not timestamp order,
    /// is authoritative for the transcript, so this is never parsed.
    #[serde(default)]
    pub timestamp: String,
}

/// Frame sent to the server.
///
/// Carries no `sender` and no `roomId`: identity is assigned server-side
/// from the session token, and the room is fixed per connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundFrame {
    pub message: String,
    pub timestamp: String,
}

impl OutboundFrame {
    /// Stamp `text` with the current UTC time.
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            message: text.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A received frame after the classifying parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Control frame: the server placed this connection in a room.
    RoomAssignment { room_id: String },
    /// Data frame: append to the transcript.
    Chat(ChatMessage),
    /// Payload that did not parse as a JSON object. Dropped silently;
    /// a best-effort stream does not halt on one bad frame.
    Malformed,
}

impl InboundFrame {
    /// Classify a raw text payload.
    ///
    /// Exactly one of room-assignment / chat applies, decided solely by the
    /// presence of a `roomId` key. A frame carrying both `roomId` and
    /// `message` is still a room assignment. Every JSON object lacking
    /// `roomId` classifies as chat, whatever the field types: storage does
    /// not reject, so wrong-typed fields are rendered lossily rather than
    /// dropping the frame.
    pub fn classify(payload: &str) -> Self {
        let value: serde_json::Value = match serde_json::from_str(payload) {
            Ok(v) => v,
            Err(_) => return Self::Malformed,
        };
        let Some(object) = value.as_object() else {
            return Self::Malformed;
        };

        if let Some(room) = object.get("roomId") {
            return Self::RoomAssignment {
                room_id: lossy_text(room),
            };
        }

        Self::Chat(ChatMessage {
            sender: text_field(object, "sender"),
            message: text_field(object, "message"),
            timestamp: text_field(object, "timestamp"),
        })
    }
}

/// Render a JSON value as display text: strings verbatim, anything else
/// through its JSON form.
fn lossy_text(value: &serde_json::Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

/// Extract a field lossily; absent or null fields come back empty.
fn text_field(object: &serde_json::Map<String, serde_json::Value>, key: &str) -> String {
    match object.get(key) {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(value) => lossy_text(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_assignment_frame() {
        let frame = InboundFrame::classify(r#"{"roomId":"room1"}"#);
        assert_eq!(
            frame,
            InboundFrame::RoomAssignment {
                room_id: "room1".to_string()
            }
        );
    }

    #[test]
    fn chat_frame() {
        let frame = InboundFrame::classify(
            r#"{"sender":"alice","message":"hi","timestamp":"2024-01-01T00:00:00Z"}"#,
        );
        match frame {
            InboundFrame::Chat(msg) => {
                assert_eq!(msg.sender, "alice");
                assert_eq!(msg.message, "hi");
                assert_eq!(msg.timestamp, "2024-01-01T00:00:00Z");
            }
            other => panic!("expected Chat, got {:?}", other),
        }
    }

    #[test]
    fn room_id_wins_over_message_fields() {
        // Strict either/or: the roomId key decides, even with chat fields present.
        let frame = InboundFrame::classify(r#"{"roomId":"room2","message":"hi"}"#);
        assert_eq!(
            frame,
            InboundFrame::RoomAssignment {
                room_id: "room2".to_string()
            }
        );
    }

    #[test]
    fn chat_frame_with_missing_fields_still_parses() {
        let frame = InboundFrame::classify(r#"{"message":"hi"}"#);
        match frame {
            InboundFrame::Chat(msg) => {
                assert_eq!(msg.sender, "");
                assert_eq!(msg.message, "hi");
                assert_eq!(msg.timestamp, "");
            }
            other => panic!("expected Chat, got {:?}", other),
        }
    }

    #[test]
    fn chat_frame_with_wrong_typed_fields_still_appends() {
        // Storage does not reject: an object without roomId is a chat frame
        // even when its fields carry the wrong JSON types.
        let frame = InboundFrame::classify(r#"{"sender":123,"message":"hi"}"#);
        match frame {
            InboundFrame::Chat(msg) => {
                assert_eq!(msg.sender, "123");
                assert_eq!(msg.message, "hi");
            }
            other => panic!("expected Chat, got {:?}", other),
        }

        let frame =
            InboundFrame::classify(r#"{"sender":null,"message":{"nested":true},"timestamp":5}"#);
        match frame {
            InboundFrame::Chat(msg) => {
                assert_eq!(msg.sender, "");
                assert_eq!(msg.message, r#"{"nested":true}"#);
                assert_eq!(msg.timestamp, "5");
            }
            other => panic!("expected Chat, got {:?}", other),
        }
    }

    #[test]
    fn empty_object_is_a_chat_frame() {
        // No roomId key means chat, however degenerate the payload.
        assert!(matches!(
            InboundFrame::classify("{}"),
            InboundFrame::Chat(_)
        ));
    }

    #[test]
    fn non_json_is_malformed() {
        assert_eq!(InboundFrame::classify("not json"), InboundFrame::Malformed);
        assert_eq!(InboundFrame::classify(""), InboundFrame::Malformed);
    }

    #[test]
    fn non_object_json_is_malformed() {
        assert_eq!(InboundFrame::classify("42"), InboundFrame::Malformed);
        assert_eq!(InboundFrame::classify(r#"["a"]"#), InboundFrame::Malformed);
        assert_eq!(InboundFrame::classify("null"), InboundFrame::Malformed);
    }

    #[test]
    fn outbound_frame_has_no_sender_or_room() {
        let frame = OutboundFrame::now("yo");
        let json = serde_json::to_value(&frame).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.get("message").unwrap(), "yo");
        assert!(object.contains_key("timestamp"));
        assert!(!object.contains_key("sender"));
        assert!(!object.contains_key("roomId"));
    }

    #[test]
    fn outbound_timestamp_is_rfc3339() {
        let frame = OutboundFrame::now("yo");
        assert!(chrono::DateTime::parse_from_rfc3339(&frame.timestamp).is_ok());
    }
}

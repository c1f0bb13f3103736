//! Transcript State: the append-only message log plus the current room id.

use crate::protocol::ChatMessage;

/// Ordered transcript of one chat session.
///
/// Insertion order is arrival order and is authoritative; entries are never
/// reordered, deduplicated, mutated, or removed. A fresh transcript is
/// created per connection, so the room id starts unset every time.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    room_id: Option<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append unconditionally and return the new length. Content is not
    /// validated here; display degrades gracefully, storage does not reject.
    pub fn push_message(&mut self, message: ChatMessage) -> usize {
        self.messages.push(message);
        self.messages.len()
    }

    /// Overwrite the current room id. The last assignment wins.
    pub fn set_room(&mut self, room_id: impl Into<String>) {
        self.room_id = Some(room_id.into());
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// `None` until the first room assignment arrives.
    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }
}

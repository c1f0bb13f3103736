//! Session-bound real-time chat client.
//!
//! Exchanges credentials for an opaque session token, then owns exactly one
//! WebSocket per token: connect with the token as the credential, classify
//! every inbound frame as either a room assignment or a chat message, keep an
//! insertion-ordered transcript, and send outbound messages fire-and-forget.
//!
//! The pieces:
//! - [`auth`] — HTTP client for the token/register endpoints
//! - [`protocol`] — frame shapes and the classifying parse
//! - [`transcript`] — ordered message log plus the current room id
//! - [`channel`] — connection lifecycle, frame dispatch, send gating

pub mod auth;
pub mod channel;
pub mod config;
pub mod protocol;
pub mod transcript;

pub use auth::{AuthClient, AuthError};
pub use channel::{ChannelEvent, ChannelState, ChatSession, SessionChannel};
pub use config::ClientConfig;
pub use protocol::{ChatMessage, InboundFrame, OutboundFrame};
pub use transcript::Transcript;

//! Session Channel Manager.
//!
//! One [`SessionChannel`] owns one WebSocket connection for one session
//! token. Exactly one connection attempt is made per instance; a changed or
//! refreshed token means closing the old channel and opening a new one. A
//! live channel's token is never mutated in place.
//!
//! The lifecycle state machine and the transcript live in [`ChatSession`],
//! which is pure and synchronous. The transport driver feeds it
//! [`ChannelEvent`]s strictly in arrival order and forwards the same events
//! to whoever holds the observer receiver, so a front end can react without
//! ever touching the state machine directly.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{RwLock, mpsc};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::protocol::{ChatMessage, InboundFrame, OutboundFrame};
use crate::transcript::Transcript;

/// Lifecycle of the underlying transport.
///
/// `Closed` is terminal for a given channel instance. There is no automatic
/// reconnection: a dropped transport freezes the transcript, and resuming
/// takes a fresh [`SessionChannel::open`] with a (possibly refreshed) token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
}

impl Default for ChannelState {
    fn default() -> Self {
        ChannelState::Connecting
    }
}

/// The three transport events the manager reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Opened,
    Frame(InboundFrame),
    Closed,
}

/// Pure session state: channel lifecycle plus the transcript derived from
/// the stream. No I/O; events are applied synchronously, one at a time.
#[derive(Debug, Default)]
pub struct ChatSession {
    state: ChannelState,
    transcript: Transcript,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Apply one transport event.
    ///
    /// Malformed frames are a no-op. A transport open event after the channel
    /// was already closed (an explicit close racing a slow handshake) does
    /// not reopen it: `Closed` is terminal.
    pub fn apply(&mut self, event: &ChannelEvent) {
        match event {
            ChannelEvent::Opened => {
                if self.state == ChannelState::Connecting {
                    self.state = ChannelState::Open;
                }
            }
            ChannelEvent::Frame(frame) => match frame {
                InboundFrame::RoomAssignment { room_id } => {
                    self.transcript.set_room(room_id.clone());
                }
                InboundFrame::Chat(message) => {
                    self.transcript.push_message(message.clone());
                }
                InboundFrame::Malformed => {}
            },
            ChannelEvent::Closed => {
                self.state = ChannelState::Closed;
            }
        }
    }

    /// Send gate: `Some` only while the channel is open and the text is
    /// non-blank after trimming. The composed frame carries no sender;
    /// identity is assigned by the server from the session token.
    pub fn compose(&self, text: &str) -> Option<OutboundFrame> {
        if self.state != ChannelState::Open || text.trim().is_empty() {
            return None;
        }
        Some(OutboundFrame::now(text))
    }
}

/// Handle to a live (or still-connecting) channel.
///
/// Owns the transport exclusively; nothing else writes to the transcript.
/// [`SessionChannel::close`] must be called when the owning session ends
/// (logout, token change, or teardown) to release the socket.
pub struct SessionChannel {
    session: Arc<RwLock<ChatSession>>,
    outbound_tx: mpsc::Sender<OutboundFrame>,
    shutdown: CancellationToken,
}

impl SessionChannel {
    /// Start connecting with `token` embedded in the connection request as a
    /// query parameter. Returns immediately in `Connecting`; the returned
    /// receiver yields `Opened`, then classified frames in arrival order,
    /// then `Closed`. A connect failure yields `Closed` without `Opened`.
    ///
    /// No connect timeout is enforced: a handshake that never completes
    /// leaves the channel in `Connecting` until [`SessionChannel::close`].
    pub fn open(config: &ClientConfig, token: &str) -> (Self, mpsc::Receiver<ChannelEvent>) {
        let url = config.ws_url(token);
        let session = Arc::new(RwLock::new(ChatSession::new()));
        let (outbound_tx, outbound_rx) = mpsc::channel::<OutboundFrame>(64);
        let (event_tx, event_rx) = mpsc::channel::<ChannelEvent>(256);
        let shutdown = CancellationToken::new();

        tokio::spawn(drive(
            url,
            Arc::clone(&session),
            outbound_rx,
            event_tx,
            shutdown.clone(),
        ));

        (
            Self {
                session,
                outbound_tx,
                shutdown,
            },
            event_rx,
        )
    }

    /// Fire-and-forget send. A silent no-op unless the channel is open and
    /// the text is non-blank; no acknowledgement is awaited. Frames queue in
    /// call order, waiting for capacity rather than dropping under a burst.
    pub async fn send(&self, text: &str) {
        let frame = self.session.read().await.compose(text);
        if let Some(frame) = frame {
            if self.outbound_tx.send(frame).await.is_err() {
                warn!("outbound queue gone; dropping message");
            }
        }
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> ChannelState {
        self.session.read().await.state()
    }

    /// Snapshot of the transcript so far, in arrival order.
    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.session.read().await.transcript().messages().to_vec()
    }

    /// Room the server placed this session in, once assigned.
    pub async fn room_id(&self) -> Option<String> {
        self.session
            .read()
            .await
            .transcript()
            .room_id()
            .map(str::to_string)
    }

    /// Tear the transport down. Safe to call any number of times and in any
    /// state; always leaves the channel `Closed` and releases the socket.
    pub async fn close(&self) {
        self.shutdown.cancel();
        self.session.write().await.apply(&ChannelEvent::Closed);
    }
}

/// Connect, then run the two unsynchronized halves of the full-duplex
/// stream: a writer draining the outbound queue and a reader applying
/// inbound frames. Neither path blocks the other.
async fn drive(
    url: String,
    session: Arc<RwLock<ChatSession>>,
    mut outbound_rx: mpsc::Receiver<OutboundFrame>,
    event_tx: mpsc::Sender<ChannelEvent>,
    shutdown: CancellationToken,
) {
    let ws = tokio::select! {
        _ = shutdown.cancelled() => return,
        connected = connect_async(url.as_str()) => match connected {
            Ok((ws, _response)) => ws,
            Err(e) => {
                warn!(error = %e, "websocket connect failed");
                apply_and_notify(&session, &event_tx, ChannelEvent::Closed).await;
                return;
            }
        },
    };

    debug!("websocket connected");
    apply_and_notify(&session, &event_tx, ChannelEvent::Opened).await;

    let (mut sink, mut stream) = ws.split();

    let writer_shutdown = shutdown.clone();
    let writer = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = writer_shutdown.cancelled() => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
                frame = outbound_rx.recv() => {
                    let Some(frame) = frame else { break };
                    let json = match serde_json::to_string(&frame) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!(error = %e, "failed to serialize outbound frame");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let frame = InboundFrame::classify(text.as_str());
                    if frame == InboundFrame::Malformed {
                        debug!("dropping malformed frame");
                        continue;
                    }
                    apply_and_notify(&session, &event_tx, ChannelEvent::Frame(frame)).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Ping/pong/binary are not part of the chat protocol.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "websocket read failed");
                    break;
                }
            },
        }
    }

    apply_and_notify(&session, &event_tx, ChannelEvent::Closed).await;
    // Stop the writer too if the server closed the stream first.
    shutdown.cancel();
    let _ = writer.await;
    debug!("websocket channel torn down");
}

async fn apply_and_notify(
    session: &Arc<RwLock<ChatSession>>,
    event_tx: &mpsc::Sender<ChannelEvent>,
    event: ChannelEvent,
) {
    session.write().await.apply(&event);
    let _ = event_tx.send(event).await;
}

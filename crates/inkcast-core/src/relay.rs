//! WebSocket relay client.
//!
//! Joins a named channel (room) on an inkcast relay server and carries
//! annotation payloads as base64 inside JSON envelopes:
//! ```json
//! { "type": "join", "room": "room-id" }
//! { "type": "annotation", "data": "<base64 payload>" }
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::transport::{ConnectionState, ReceivedMessage, TransportEvent, TransportPort};

/// Messages sent to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join a room
    Join { room: String },
    /// Leave current room
    Leave,
    /// Annotation payload (base64 encoded)
    Annotation { data: String },
}

/// Messages received from the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirm room join
    Joined { room: String, peer_count: usize },
    /// Peer joined the room
    PeerJoined { peer_id: String },
    /// Peer left the room
    PeerLeft { peer_id: String },
    /// Annotation payload from another peer
    Annotation { from: String, data: String },
    /// Error message
    Error { message: String },
}

/// Base64-encode a payload for an envelope.
pub fn encode_payload(payload: &[u8]) -> String {
    STANDARD.encode(payload)
}

/// Decode an envelope's base64 payload.
pub fn decode_payload(data: &str) -> Option<Vec<u8>> {
    STANDARD.decode(data).ok()
}

/// Turn a server message into a transport event.
///
/// Returns `None` for annotation envelopes whose payload is not valid base64.
pub fn server_event(msg: ServerMessage, room: &str) -> Option<TransportEvent> {
    let event = match msg {
        ServerMessage::Joined { room, peer_count } => TransportEvent::Joined {
            channel: room,
            peer_count,
        },
        ServerMessage::PeerJoined { peer_id } => TransportEvent::PeerJoined { peer: peer_id },
        ServerMessage::PeerLeft { peer_id } => TransportEvent::PeerLeft { peer: peer_id },
        ServerMessage::Annotation { from, data } => {
            let payload = decode_payload(&data)?;
            TransportEvent::Message(ReceivedMessage {
                sender: from,
                channel: room.to_string(),
                payload,
            })
        }
        ServerMessage::Error { message } => TransportEvent::Error { message },
    };
    Some(event)
}

mod native_client {
    use super::*;
    use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
    use std::thread::{self, JoinHandle};
    use std::time::Duration;
    use tungstenite::{Message, connect};
    use url::Url;

    /// Commands sent to the WebSocket thread.
    enum WsCommand {
        Send(String),
        Close,
    }

    /// Relay transport over a WebSocket.
    ///
    /// Uses a background thread so that `send` and `poll_events` never block
    /// the tick.
    pub struct RelayTransport {
        state: ConnectionState,
        room: String,
        joined: bool,
        events: Vec<TransportEvent>,
        /// Channel to send commands to the WebSocket thread.
        cmd_tx: Option<Sender<WsCommand>>,
        /// Channel to receive events from the WebSocket thread.
        event_rx: Option<Receiver<TransportEvent>>,
        /// Handle to the WebSocket thread.
        _thread: Option<JoinHandle<()>>,
    }

    impl RelayTransport {
        /// Create a new disconnected client for `room`.
        pub fn new(room: &str) -> Self {
            Self {
                state: ConnectionState::Disconnected,
                room: room.to_string(),
                joined: false,
                events: Vec::new(),
                cmd_tx: None,
                event_rx: None,
                _thread: None,
            }
        }

        /// Connect to a relay server and join the room once connected.
        pub fn connect(&mut self, url: &str) -> Result<(), TransportError> {
            if self.cmd_tx.is_some() {
                return Err(TransportError::AlreadyConnected);
            }

            let parsed_url = Url::parse(url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
            if parsed_url.scheme() != "ws" && parsed_url.scheme() != "wss" {
                return Err(TransportError::InvalidUrl(format!(
                    "unsupported scheme: {}",
                    parsed_url.scheme()
                )));
            }

            let join = serde_json::to_string(&ClientMessage::Join {
                room: self.room.clone(),
            })
            .map_err(|e| TransportError::Send(e.to_string()))?;

            self.state = ConnectionState::Connecting;

            let (cmd_tx, cmd_rx) = channel::<WsCommand>();
            let (event_tx, event_rx) = channel::<TransportEvent>();

            let url = url.to_string();
            let room = self.room.clone();

            let handle = thread::spawn(move || {
                log::info!("Relay thread: connecting to {}", url);

                let (mut socket, response) = match connect(&url) {
                    Ok(ok) => ok,
                    Err(e) => {
                        log::error!("Relay connection failed: {}", e);
                        let _ = event_tx.send(TransportEvent::Error {
                            message: format!("Connection failed: {}", e),
                        });
                        let _ = event_tx.send(TransportEvent::Disconnected);
                        return;
                    }
                };
                log::info!("Relay connected, status: {}", response.status());
                let _ = event_tx.send(TransportEvent::Connected);

                // Short read timeout so the loop can service outgoing commands
                if let tungstenite::stream::MaybeTlsStream::Plain(tcp) = socket.get_mut() {
                    let _ = tcp.set_read_timeout(Some(Duration::from_millis(20)));
                    let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
                }

                if let Err(e) = socket.send(Message::Text(join)) {
                    log::error!("Relay join failed: {}", e);
                    let _ = event_tx.send(TransportEvent::Disconnected);
                    return;
                }

                loop {
                    // Drain every queued command before reading
                    let mut closing = false;
                    loop {
                        match cmd_rx.try_recv() {
                            Ok(WsCommand::Send(msg)) => {
                                if let Err(e) = socket.send(Message::Text(msg)) {
                                    log::error!("Relay send error: {}", e);
                                    closing = true;
                                    break;
                                }
                            }
                            Ok(WsCommand::Close) => {
                                log::info!("Relay close requested");
                                let _ = socket.close(None);
                                closing = true;
                                break;
                            }
                            Err(TryRecvError::Disconnected) => {
                                closing = true;
                                break;
                            }
                            Err(TryRecvError::Empty) => break,
                        }
                    }
                    if closing {
                        break;
                    }

                    match socket.read() {
                        Ok(Message::Text(txt)) => match serde_json::from_str::<ServerMessage>(&txt) {
                            Ok(msg) => match server_event(msg, &room) {
                                Some(event) => {
                                    let _ = event_tx.send(event);
                                }
                                None => log::warn!("Dropping annotation with invalid base64 payload"),
                            },
                            Err(e) => log::warn!("Failed to parse relay message: {}", e),
                        },
                        Ok(Message::Ping(data)) => {
                            let _ = socket.send(Message::Pong(data));
                        }
                        Ok(Message::Close(_)) => {
                            log::info!("Relay sent close frame");
                            break;
                        }
                        Ok(_) => {}
                        Err(tungstenite::Error::Io(ref e))
                            if e.kind() == std::io::ErrorKind::WouldBlock
                                || e.kind() == std::io::ErrorKind::TimedOut =>
                        {
                            continue;
                        }
                        Err(e) => {
                            log::error!("Relay read error: {}", e);
                            break;
                        }
                    }
                }

                log::info!("Relay thread exiting");
                let _ = event_tx.send(TransportEvent::Disconnected);
            });

            self.cmd_tx = Some(cmd_tx);
            self.event_rx = Some(event_rx);
            self._thread = Some(handle);

            Ok(())
        }

        /// Leave the room and close the connection.
        pub fn disconnect(&mut self) {
            if let Some(tx) = self.cmd_tx.take() {
                if let Ok(leave) = serde_json::to_string(&ClientMessage::Leave) {
                    let _ = tx.send(WsCommand::Send(leave));
                }
                let _ = tx.send(WsCommand::Close);
            }
            self.event_rx = None;
            self._thread = None;
            self.joined = false;
            self.state = ConnectionState::Disconnected;
        }

        /// Get current connection state.
        pub fn state(&self) -> ConnectionState {
            self.state
        }

        pub fn room(&self) -> &str {
            &self.room
        }

        fn track(&mut self, event: &TransportEvent) {
            match event {
                TransportEvent::Connected => self.state = ConnectionState::Connected,
                TransportEvent::Disconnected => {
                    // The relay thread has exited; allow a fresh connect
                    self.state = ConnectionState::Disconnected;
                    self.joined = false;
                    self.cmd_tx = None;
                    self.event_rx = None;
                    self._thread = None;
                }
                TransportEvent::Error { .. } => self.state = ConnectionState::Error,
                TransportEvent::Joined { .. } => self.joined = true,
                _ => {}
            }
        }
    }

    impl TransportPort for RelayTransport {
        fn is_available(&self) -> bool {
            self.state == ConnectionState::Connected && self.joined
        }

        fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
            if !self.is_available() {
                return Err(TransportError::ChannelUnavailable);
            }
            let Some(tx) = self.cmd_tx.as_ref() else {
                return Err(TransportError::ChannelUnavailable);
            };
            let msg = ClientMessage::Annotation {
                data: encode_payload(payload),
            };
            let json = serde_json::to_string(&msg).map_err(|e| TransportError::Send(e.to_string()))?;
            tx.send(WsCommand::Send(json))
                .map_err(|e| TransportError::Send(e.to_string()))
        }

        fn poll_events(&mut self) -> Vec<TransportEvent> {
            let mut drained = Vec::new();
            if let Some(ref rx) = self.event_rx {
                while let Ok(event) = rx.try_recv() {
                    drained.push(event);
                }
            }
            for event in &drained {
                self.track(event);
            }
            self.events.extend(drained);
            std::mem::take(&mut self.events)
        }
    }

    impl Drop for RelayTransport {
        fn drop(&mut self) {
            self.disconnect();
        }
    }
}

pub use native_client::RelayTransport;

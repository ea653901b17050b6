//! Transport port: a reliable, ordered, message-oriented channel.
//!
//! The media engine (or the relay client) owns connection setup. This crate
//! only checks whether a channel is available, issues non-blocking sends,
//! and polls for arrived messages once per tick.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::TransportError;

/// A payload delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    /// Peer that sent the payload.
    pub sender: String,
    /// Channel (room) it arrived on.
    pub channel: String,
    pub payload: Vec<u8>,
}

/// Events from a transport, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Connected to the server.
    Connected,
    /// Disconnected from the server.
    Disconnected,
    /// Joined a channel.
    Joined { channel: String, peer_count: usize },
    /// A peer joined the channel.
    PeerJoined { peer: String },
    /// A peer left the channel.
    PeerLeft { peer: String },
    /// A payload arrived.
    Message(ReceivedMessage),
    /// Error occurred
    Error { message: String },
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Reliable, ordered channel used by both participants.
pub trait TransportPort {
    /// Whether a channel is currently open for sending.
    fn is_available(&self) -> bool;

    /// Enqueue a payload. Returns immediately; delivery is not confirmed.
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError>;

    /// Drain everything that arrived since the last poll (non-blocking).
    fn poll_events(&mut self) -> Vec<TransportEvent>;
}

#[derive(Debug, Default)]
struct Link {
    open: bool,
    inboxes: [VecDeque<TransportEvent>; 2],
}

/// In-process transport. Two ends share FIFO queues.
///
/// Single-threaded by construction, like the tick loop that drives it.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    link: Rc<RefCell<Link>>,
    side: usize,
    peer: String,
    remote_peer: String,
    channel: String,
}

impl MemoryTransport {
    /// Create two connected ends on `channel`.
    pub fn pair(channel: &str) -> (MemoryTransport, MemoryTransport) {
        let link = Rc::new(RefCell::new(Link {
            open: true,
            inboxes: Default::default(),
        }));
        let end = |side: usize, peer: &str, remote: &str| MemoryTransport {
            link: link.clone(),
            side,
            peer: peer.to_string(),
            remote_peer: remote.to_string(),
            channel: channel.to_string(),
        };
        (end(0, "peer-a", "peer-b"), end(1, "peer-b", "peer-a"))
    }

    /// This end's peer id.
    pub fn peer_id(&self) -> &str {
        &self.peer
    }

    /// Peer id of the other end.
    pub fn remote_peer_id(&self) -> &str {
        &self.remote_peer
    }

    /// Close the link. The other end sees the peer leave and a disconnect.
    pub fn disconnect(&mut self) {
        let mut link = self.link.borrow_mut();
        if !link.open {
            return;
        }
        link.open = false;
        let other = 1 - self.side;
        link.inboxes[other].push_back(TransportEvent::PeerLeft {
            peer: self.peer.clone(),
        });
        link.inboxes[other].push_back(TransportEvent::Disconnected);
        link.inboxes[self.side].push_back(TransportEvent::Disconnected);
    }
}

impl TransportPort for MemoryTransport {
    fn is_available(&self) -> bool {
        self.link.borrow().open
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let mut link = self.link.borrow_mut();
        if !link.open {
            return Err(TransportError::ChannelUnavailable);
        }
        let other = 1 - self.side;
        link.inboxes[other].push_back(TransportEvent::Message(ReceivedMessage {
            sender: self.peer.clone(),
            channel: self.channel.clone(),
            payload: payload.to_vec(),
        }));
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<TransportEvent> {
        let mut link = self.link.borrow_mut();
        link.inboxes[self.side].drain(..).collect()
    }
}

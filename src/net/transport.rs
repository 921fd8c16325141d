//! Transport boundary
//!
//! The protocol core never touches sockets. It talks to the connection
//! through the `Transport` trait: query the connection state, drain the
//! packets queued since the last tick, and send outbound packets.
//!
//! `channel()` provides the queue that crosses the thread boundary: an I/O
//! thread owns the `TransportHandle` and pushes decoded packets, while the
//! dispatch thread owns the `QueuedTransport` and drains them.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::{debug, trace};

use crate::error::{ProtocolError, Result, TransportError};
use crate::net::packet::Packet;

/// Connection lifecycle as reported by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No connection
    #[default]
    Disconnected,
    /// Connection attempt in progress
    Connecting,
    /// Connected, packets may flow
    Connected,
    /// Connection is shutting down
    Closing,
}

impl ConnectionState {
    /// Get a human-readable name for the state
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
            ConnectionState::Closing => "Closing",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Contract the dispatch loop consumes once per tick
pub trait Transport {
    /// Current connection state
    fn state(&self) -> ConnectionState;

    /// Take every packet received since the last call, in arrival order
    fn drain_queued_packets(&mut self) -> Vec<Packet>;

    /// Queue a packet for sending
    fn send(&mut self, packet: Packet) -> std::result::Result<(), TransportError>;
}

/// Create a connected pair of queue ends
pub fn channel() -> (QueuedTransport, TransportHandle) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let state = Arc::new(RwLock::new(ConnectionState::Disconnected));

    let transport = QueuedTransport {
        inbound: inbound_rx,
        outbound: outbound_tx,
        state: state.clone(),
    };
    let handle = TransportHandle {
        inbound: inbound_tx,
        outbound: outbound_rx,
        state,
    };
    (transport, handle)
}

/// Consumer end, owned by the dispatch thread
pub struct QueuedTransport {
    inbound: mpsc::UnboundedReceiver<Packet>,
    outbound: mpsc::UnboundedSender<Packet>,
    state: Arc<RwLock<ConnectionState>>,
}

impl Transport for QueuedTransport {
    fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    fn drain_queued_packets(&mut self) -> Vec<Packet> {
        let mut packets = Vec::new();
        loop {
            match self.inbound.try_recv() {
                Ok(packet) => packets.push(packet),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    trace!("Inbound queue producer dropped");
                    break;
                }
            }
        }
        packets
    }

    fn send(&mut self, packet: Packet) -> std::result::Result<(), TransportError> {
        if self.state() != ConnectionState::Connected {
            return Err(TransportError::Disconnected);
        }
        self.outbound
            .send(packet)
            .map_err(|_| TransportError::ChannelClosed)
    }
}

/// Producer end, owned by the I/O side of the connection
pub struct TransportHandle {
    inbound: mpsc::UnboundedSender<Packet>,
    outbound: mpsc::UnboundedReceiver<Packet>,
    state: Arc<RwLock<ConnectionState>>,
}

impl TransportHandle {
    /// Update the connection state seen by the dispatch loop
    pub fn set_state(&self, state: ConnectionState) {
        let mut current = self.state.write();
        let previous = *current;
        if previous != state {
            debug!(from = %previous, to = %state, "Connection state changed");
            *current = state;
        }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Queue a received packet
    pub fn push(&self, packet: Packet) -> std::result::Result<(), TransportError> {
        self.inbound
            .send(packet)
            .map_err(|_| TransportError::ChannelClosed)
    }

    /// Parse a received frame and queue it
    pub fn push_frame(&self, frame: &[u8]) -> Result<()> {
        let packet = Packet::from_frame(frame).map_err(ProtocolError::from)?;
        self.push(packet)?;
        Ok(())
    }

    /// Take every packet the core has sent since the last call
    pub fn drain_outbound(&mut self) -> Vec<Packet> {
        let mut packets = Vec::new();
        while let Ok(packet) = self.outbound.try_recv() {
            packets.push(packet);
        }
        packets
    }
}

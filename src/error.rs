//! Error handling module
//!
//! Defines the error types for the Aurora client protocol core.
//!
//! Decode failures (`PacketError`) are raised by the binary cursor and
//! propagated through handlers with `?`. The dispatch loop catches them at
//! the per-packet boundary, so none of these errors is fatal to the client.

use std::io;

use thiserror::Error;

use crate::state::LoginPhase;

/// Main error type for the Aurora client
#[derive(Error, Debug)]
pub enum ClientError {
    /// Protocol-related errors
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Transport boundary errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors raised while reading or writing packet fields
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    /// Fewer bytes remain than the field requires
    #[error("Truncated packet: needed {needed} bytes, {remaining} remaining")]
    TruncatedPacket { needed: usize, remaining: usize },

    /// String bytes are not valid UTF-8
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// A field decoded to a value outside its domain
    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: &'static str, value: String },

    /// A length or count does not fit its 16-bit prefix
    #[error("Field too long: {len} (max: {max})")]
    FieldTooLong { len: usize, max: usize },
}

impl PacketError {
    /// Shorthand for a truncation error
    pub fn truncated(needed: usize, remaining: usize) -> Self {
        Self::TruncatedPacket { needed, remaining }
    }

    /// Whether this error came from running off the end of the payload
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::TruncatedPacket { .. })
    }
}

/// Errors raised by packet handlers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A field failed to decode
    #[error(transparent)]
    Packet(#[from] PacketError),

    /// The handler was invoked while the login phase precludes it
    #[error("Unexpected packet {op:#010X} in phase {phase}")]
    UnexpectedState { op: u32, phase: LoginPhase },

    /// No handler is registered for the opcode
    #[error("Unknown opcode: {0:#010X}")]
    UnknownOpcode(u32),
}

/// Errors at the transport boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Not connected")]
    Disconnected,

    #[error("Transport channel closed")]
    ChannelClosed,
}

/// Result type alias for Aurora client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Result type alias for field decoding
pub type PacketResult<T> = std::result::Result<T, PacketError>;

/// Result type returned by packet handlers
pub type HandlerResult = std::result::Result<(), ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PacketError::truncated(4, 1);
        assert_eq!(err.to_string(), "Truncated packet: needed 4 bytes, 1 remaining");
        assert!(err.is_truncated());

        let err = ProtocolError::UnknownOpcode(0x26);
        assert_eq!(err.to_string(), "Unknown opcode: 0x00000026");

        let err = ProtocolError::UnexpectedState {
            op: 0x23,
            phase: LoginPhase::Idle,
        };
        assert_eq!(err.to_string(), "Unexpected packet 0x00000023 in phase Idle");
    }

    #[test]
    fn test_packet_error_is_transparent() {
        let err: ProtocolError = PacketError::InvalidEncoding("bad".to_string()).into();
        assert_eq!(err.to_string(), "Invalid encoding: bad");

        let err: ClientError = err.into();
        assert!(matches!(err, ClientError::Protocol(ProtocolError::Packet(_))));
    }
}

//! Packet envelope
//!
//! A `Packet` pairs an operation code with a `PacketBuffer` over its
//! payload. On the wire a packet is framed as:
//!
//! ```text
//! [Opcode(4, BE)] [Payload(N)]
//! ```

use std::fmt;

use bytes::{BufMut, BytesMut};

use crate::error::{PacketError, PacketResult};
use crate::net::buffer::PacketBuffer;
use crate::protocol::opcodes;

/// Size of the opcode header in a frame
pub const OPCODE_SIZE: usize = 4;

/// A protocol packet
#[derive(Debug, Clone)]
pub struct Packet {
    op: u32,
    buffer: PacketBuffer,
}

impl Packet {
    /// Create an empty outbound packet
    pub fn new(op: u32) -> Self {
        Self {
            op,
            buffer: PacketBuffer::with_capacity(64),
        }
    }

    /// Create a packet for reading from a payload
    pub fn from_payload(op: u32, payload: &[u8]) -> Self {
        Self {
            op,
            buffer: PacketBuffer::from_bytes(payload),
        }
    }

    /// Parse a frame (opcode followed by payload)
    pub fn from_frame(frame: &[u8]) -> PacketResult<Self> {
        if frame.len() < OPCODE_SIZE {
            return Err(PacketError::truncated(OPCODE_SIZE, frame.len()));
        }
        let (header, payload) = frame.split_at(OPCODE_SIZE);
        let op = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        Ok(Self::from_payload(op, payload))
    }

    /// Encode this packet as a frame
    pub fn to_frame(&self) -> Vec<u8> {
        let mut frame = BytesMut::with_capacity(OPCODE_SIZE + self.buffer.len());
        frame.put_u32(self.op);
        frame.extend_from_slice(self.buffer.as_bytes());
        frame.to_vec()
    }

    /// The operation code
    #[inline]
    pub fn op(&self) -> u32 {
        self.op
    }

    /// Symbolic name of the operation code
    pub fn name(&self) -> &'static str {
        opcodes::name(self.op)
    }

    /// The raw payload bytes
    #[inline]
    pub fn payload(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    /// Read access to the payload cursor
    #[inline]
    pub fn buffer(&mut self) -> &mut PacketBuffer {
        &mut self.buffer
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Op: {:08X} {} ({} bytes) [{}]",
            self.op,
            self.name(),
            self.buffer.len(),
            self.buffer.hex_dump()
        )
    }
}

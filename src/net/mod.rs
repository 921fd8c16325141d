//! Networking module
//!
//! Everything between the socket and the handlers:
//! - Binary cursor over packet payloads
//! - Packet envelope and framing
//! - Transport boundary and the in-process queue pair
//! - Text capture format used by the replay tool

pub mod buffer;
pub mod capture;
pub mod packet;
pub mod transport;

pub use buffer::PacketBuffer;
pub use packet::Packet;
pub use transport::{ConnectionState, Transport};

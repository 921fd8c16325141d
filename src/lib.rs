//! Aurora Client Protocol Core
//!
//! This library provides the protocol layer of the Aurora game client:
//! binary decoding, packet dispatch and the login handshake.
//!
//! ## Modules
//!
//! - `client` - Facade bundling the dispatcher and handler context
//! - `config` - Client configuration management
//! - `context` - State and queues handlers operate on
//! - `error` - Error types and result definitions
//! - `net` - Binary cursor, packet framing and transport boundary
//! - `protocol` - Opcodes, handler registry, dispatch loop and login handlers
//! - `state` - Session state populated by the login handshake

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod net;
pub mod protocol;
pub mod state;

// Re-export commonly used types
pub use client::Client;
pub use config::ClientConfig;
pub use context::{ClientContext, Credentials};
pub use error::{ClientError, PacketError, ProtocolError, Result};
pub use state::{ClientEvent, LoginPhase, SessionState};

/// Client version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

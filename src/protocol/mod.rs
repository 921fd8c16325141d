//! Protocol module
//!
//! Client-side protocol implementation:
//! - Operation codes and their symbolic names
//! - Roster records (servers, channels, characters, pets)
//! - Handler registry and the per-tick dispatch loop
//! - Login handshake handlers

pub mod dispatch;
pub mod login;
pub mod opcodes;
pub mod registry;
pub mod roster;

pub use dispatch::{Dispatcher, PacketOutcome, TickReport};
pub use registry::{HandlerFn, HandlerRegistry};

/// Build the registry of every handler the client knows
pub fn default_registry() -> HandlerRegistry {
    HandlerRegistry::from_table(login::HANDLERS)
}

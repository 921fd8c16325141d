//! Handler registry
//!
//! Maps opcodes to handler functions. The registry is assembled once from a
//! static declaration table (see `protocol::login::HANDLERS`) and is
//! read-only afterwards. One handler may serve several opcodes; each opcode
//! resolves to at most one handler.
//!
//! When an opcode is declared twice the later declaration wins. The
//! override is deterministic (declaration order) and logged at `warn`.

use std::collections::HashMap;

use tracing::{trace, warn};

use crate::context::ClientContext;
use crate::error::HandlerResult;
use crate::net::packet::Packet;
use crate::protocol::opcodes::{self, OpHex};

/// A packet handler
pub type HandlerFn = fn(&mut ClientContext, &mut Packet) -> HandlerResult;

/// A static handler declaration: the opcodes a handler serves
pub type HandlerDecl = (&'static [u32], HandlerFn);

/// Immutable opcode -> handler table
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<u32, HandlerFn>,
}

impl HandlerRegistry {
    /// Start building a registry
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Build a registry from a declaration table
    pub fn from_table(table: &[HandlerDecl]) -> Self {
        table
            .iter()
            .fold(Self::builder(), |builder, (ops, handler)| {
                builder.on(ops, *handler)
            })
            .build()
    }

    /// Look up the handler for an opcode
    #[inline]
    pub fn resolve(&self, op: u32) -> Option<HandlerFn> {
        self.handlers.get(&op).copied()
    }

    /// Check whether an opcode has a handler
    pub fn contains(&self, op: u32) -> bool {
        self.handlers.contains_key(&op)
    }

    /// Number of registered opcodes
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Builder used during initialization
#[derive(Default)]
pub struct RegistryBuilder {
    handlers: HashMap<u32, HandlerFn>,
}

impl RegistryBuilder {
    /// Register a handler for one or more opcodes
    pub fn on(mut self, ops: &[u32], handler: HandlerFn) -> Self {
        for &op in ops {
            if self.handlers.insert(op, handler).is_some() {
                warn!(
                    opcode = %OpHex(op),
                    name = opcodes::name(op),
                    "Duplicate handler registration, later registration overrides"
                );
            } else {
                trace!(
                    opcode = %OpHex(op),
                    name = opcodes::name(op),
                    "Registered handler"
                );
            }
        }
        self
    }

    /// Freeze the table
    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            handlers: self.handlers,
        }
    }
}

//! Dispatch loop
//!
//! Called once per frame by the host. Drains every packet the transport has
//! queued since the last tick and routes each one through the handler
//! registry. A failing packet is logged and skipped; it never aborts the
//! tick or disturbs the packets queued after it.

use tracing::{debug, info, trace, warn};

use crate::context::ClientContext;
use crate::error::{PacketError, ProtocolError};
use crate::net::packet::Packet;
use crate::net::transport::{ConnectionState, Transport};
use crate::protocol::opcodes::{self, OpHex};
use crate::protocol::registry::HandlerRegistry;

/// What happened to a single packet during a tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketOutcome {
    /// The handler ran to completion
    Handled,
    /// No handler is registered for the opcode
    Unhandled,
    /// The handler rejected the packet for the current login phase
    Dropped,
    /// The payload failed to decode
    Failed(PacketError),
}

/// Per-tick summary, in arrival order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub outcomes: Vec<(u32, PacketOutcome)>,
}

impl TickReport {
    fn count(&self, pred: impl Fn(&PacketOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }

    pub fn handled(&self) -> usize {
        self.count(|o| matches!(o, PacketOutcome::Handled))
    }

    pub fn unhandled(&self) -> usize {
        self.count(|o| matches!(o, PacketOutcome::Unhandled))
    }

    pub fn dropped(&self) -> usize {
        self.count(|o| matches!(o, PacketOutcome::Dropped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, PacketOutcome::Failed(_)))
    }

    /// Whether no packet was processed
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Routes queued packets to their handlers
#[derive(Clone)]
pub struct Dispatcher {
    registry: HandlerRegistry,
    log_unhandled: bool,
    dump_payloads: bool,
}

impl Dispatcher {
    /// Create a dispatcher with default logging settings
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry,
            log_unhandled: true,
            dump_payloads: true,
        }
    }

    /// Log unhandled opcodes at `info` instead of `debug`
    pub fn with_unhandled_logging(mut self, enabled: bool) -> Self {
        self.log_unhandled = enabled;
        self
    }

    /// Include the payload hex dump when a packet fails to decode
    pub fn with_payload_dumps(mut self, enabled: bool) -> Self {
        self.dump_payloads = enabled;
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Process every queued packet. Does nothing unless connected.
    pub fn tick<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        ctx: &mut ClientContext,
    ) -> TickReport {
        let mut report = TickReport::default();
        if transport.state() != ConnectionState::Connected {
            return report;
        }

        for mut packet in transport.drain_queued_packets() {
            let op = packet.op();
            let outcome = self.dispatch(&mut packet, ctx);

            if outcome == PacketOutcome::Handled {
                for outbound in ctx.take_outbox() {
                    let out_op = outbound.op();
                    if let Err(e) = transport.send(outbound) {
                        warn!(
                            opcode = %OpHex(out_op),
                            name = opcodes::name(out_op),
                            error = %e,
                            "Failed to send packet"
                        );
                    }
                }
            } else {
                let discarded = ctx.take_outbox();
                if !discarded.is_empty() {
                    trace!(count = discarded.len(), "Discarded packets queued by failed handler");
                }
            }

            report.outcomes.push((op, outcome));
        }

        if !report.is_empty() {
            trace!(
                handled = report.handled(),
                unhandled = report.unhandled(),
                dropped = report.dropped(),
                failed = report.failed(),
                "Tick complete"
            );
        }
        report
    }

    /// Route a single packet
    fn dispatch(&self, packet: &mut Packet, ctx: &mut ClientContext) -> PacketOutcome {
        let op = packet.op();
        let Some(handler) = self.registry.resolve(op) else {
            self.report_unhandled(packet);
            return PacketOutcome::Unhandled;
        };

        match handler(ctx, packet) {
            Ok(()) => PacketOutcome::Handled,
            Err(ProtocolError::UnexpectedState { phase, .. }) => {
                debug!(
                    opcode = %OpHex(op),
                    name = packet.name(),
                    phase = %phase,
                    "Packet not expected in current phase, dropped"
                );
                PacketOutcome::Dropped
            }
            Err(ProtocolError::UnknownOpcode(_)) => {
                self.report_unhandled(packet);
                PacketOutcome::Unhandled
            }
            Err(ProtocolError::Packet(e)) => {
                if self.dump_payloads {
                    warn!(
                        opcode = %OpHex(op),
                        name = packet.name(),
                        error = %e,
                        payload = %packet.buffer().hex_dump(),
                        "Failed to decode packet"
                    );
                } else {
                    warn!(
                        opcode = %OpHex(op),
                        name = packet.name(),
                        error = %e,
                        "Failed to decode packet"
                    );
                }
                PacketOutcome::Failed(e)
            }
        }
    }

    fn report_unhandled(&self, packet: &Packet) {
        let op = packet.op();
        if self.log_unhandled {
            info!(opcode = %OpHex(op), name = packet.name(), "Unhandled packet");
        } else {
            debug!(opcode = %OpHex(op), name = packet.name(), "Unhandled packet");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Credentials;
    use crate::error::HandlerResult;
    use crate::net::transport::{channel, TransportHandle, QueuedTransport};
    use crate::state::{ClientEvent, LoginPhase};

    const PING: u32 = 0x0001_0001;
    const ECHO: u32 = 0x0001_0002;

    /// Reads one int and emits an event
    fn ping(ctx: &mut ClientContext, packet: &mut Packet) -> HandlerResult {
        packet.buffer().get_int()?;
        ctx.emit(ClientEvent::ServerListChanged);
        Ok(())
    }

    /// Queues a reply, then reads one int
    fn echo(ctx: &mut ClientContext, packet: &mut Packet) -> HandlerResult {
        ctx.send(Packet::new(ECHO));
        packet.buffer().get_int()?;
        Ok(())
    }

    fn int_packet(op: u32, value: u32) -> Packet {
        let mut packet = Packet::new(op);
        packet.buffer().put_int(value);
        Packet::from_payload(op, packet.payload())
    }

    fn setup() -> (Dispatcher, QueuedTransport, TransportHandle, ClientContext) {
        let registry = HandlerRegistry::builder()
            .on(&[PING], ping)
            .on(&[ECHO], echo)
            .build();
        let (transport, handle) = channel();
        handle.set_state(ConnectionState::Connected);
        (Dispatcher::new(registry), transport, handle, ClientContext::default())
    }

    #[test]
    fn test_not_connected_is_noop() {
        let (dispatcher, mut transport, handle, mut ctx) = setup();
        handle.set_state(ConnectionState::Connecting);
        handle.push(int_packet(PING, 1)).unwrap();

        assert!(dispatcher.tick(&mut transport, &mut ctx).is_empty());
        assert!(ctx.drain_events().is_empty());

        // Still queued for the next connected tick
        handle.set_state(ConnectionState::Connected);
        assert_eq!(dispatcher.tick(&mut transport, &mut ctx).handled(), 1);
    }

    #[test]
    fn test_malformed_packet_is_isolated() {
        let (dispatcher, mut transport, handle, mut ctx) = setup();
        handle.push(Packet::from_payload(PING, &[0x00, 0x01])).unwrap();
        for i in 0..3 {
            handle.push(int_packet(PING, i)).unwrap();
        }

        let report = dispatcher.tick(&mut transport, &mut ctx);
        assert_eq!(report.outcomes.len(), 4);
        assert_eq!(
            report.outcomes[0],
            (PING, PacketOutcome::Failed(PacketError::truncated(4, 2)))
        );
        assert_eq!(report.handled(), 3);
        assert_eq!(report.failed(), 1);
        assert_eq!(ctx.drain_events().len(), 3);
    }

    #[test]
    fn test_unhandled_opcode() {
        let (dispatcher, mut transport, handle, mut ctx) = setup();
        handle.push(Packet::new(0xDEAD_BEEF)).unwrap();
        handle.push(int_packet(PING, 0)).unwrap();

        let report = dispatcher.tick(&mut transport, &mut ctx);
        assert_eq!(report.outcomes[0], (0xDEAD_BEEF, PacketOutcome::Unhandled));
        assert_eq!(report.unhandled(), 1);
        assert_eq!(report.handled(), 1);
    }

    #[test]
    fn test_outbox_flushed_only_on_success() {
        let (dispatcher, mut transport, mut handle, mut ctx) = setup();
        handle.push(int_packet(ECHO, 0)).unwrap();
        handle.push(Packet::from_payload(ECHO, &[0x01])).unwrap();

        let report = dispatcher.tick(&mut transport, &mut ctx);
        assert_eq!(report.handled(), 1);
        assert_eq!(report.failed(), 1);

        let sent = handle.drain_outbound();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].op(), ECHO);
    }

    #[test]
    fn test_phase_mismatch_is_dropped() {
        let registry = HandlerRegistry::from_table(crate::protocol::login::HANDLERS);
        let dispatcher = Dispatcher::new(registry);
        let (mut transport, handle) = channel();
        handle.set_state(ConnectionState::Connected);
        let mut ctx = ClientContext::default();

        handle.push(Packet::new(opcodes::CLIENT_IDENT_R)).unwrap();
        let report = dispatcher.tick(&mut transport, &mut ctx);
        assert_eq!(report.dropped(), 1);
        assert_eq!(ctx.phase(), LoginPhase::Idle);

        ctx.begin_login(Credentials::new("admin", "password"));
        handle.push(Packet::new(opcodes::CLIENT_IDENT_R)).unwrap();
        let report = dispatcher.tick(&mut transport, &mut ctx);
        assert_eq!(report.handled(), 1);
        assert_eq!(ctx.phase(), LoginPhase::AwaitingLoginResult);
    }

    #[test]
    fn test_empty_queue() {
        let (dispatcher, mut transport, _handle, mut ctx) = setup();
        let report = dispatcher.tick(&mut transport, &mut ctx);
        assert!(report.is_empty());
        assert_eq!(report, TickReport::default());
    }
}

//! Client facade
//!
//! Bundles the dispatcher and the handler context for hosts that drive the
//! protocol core from their frame loop.

use tracing::info;

use crate::config::ClientConfig;
use crate::context::{ClientContext, Credentials};
use crate::net::transport::Transport;
use crate::protocol::{self, Dispatcher, TickReport};
use crate::state::{ClientEvent, SessionState};

/// Protocol core of the game client
pub struct Client {
    dispatcher: Dispatcher,
    context: ClientContext,
}

impl Client {
    /// Create a client with every known handler registered
    pub fn new(config: &ClientConfig) -> Self {
        let registry = protocol::default_registry();
        info!(handlers = registry.len(), "Packet handlers registered");

        let dispatcher = Dispatcher::new(registry)
            .with_unhandled_logging(config.log_unhandled_packets)
            .with_payload_dumps(config.dump_failed_payloads);

        Self {
            dispatcher,
            context: ClientContext::new(config),
        }
    }

    /// Process every packet queued on the transport
    pub fn tick<T: Transport + ?Sized>(&mut self, transport: &mut T) -> TickReport {
        self.dispatcher.tick(transport, &mut self.context)
    }

    /// The user submitted the login form
    pub fn begin_login(&mut self, credentials: Credentials) {
        self.context.begin_login(credentials);
    }

    pub fn session(&self) -> &SessionState {
        self.context.session()
    }

    pub fn context(&self) -> &ClientContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ClientContext {
        &mut self.context
    }

    /// Take notifications raised since the last call
    pub fn drain_events(&mut self) -> Vec<ClientEvent> {
        self.context.drain_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::packet::Packet;
    use crate::net::transport::{channel, ConnectionState};
    use crate::protocol::opcodes;
    use crate::state::LoginPhase;

    #[test]
    fn test_ident_to_login_request() {
        let mut client = Client::new(&ClientConfig::default());
        let (mut transport, mut handle) = channel();
        handle.set_state(ConnectionState::Connected);

        client.begin_login(Credentials::new("admin", "password"));
        handle.push(Packet::new(opcodes::CLIENT_IDENT_R)).unwrap();

        let report = client.tick(&mut transport);
        assert_eq!(report.handled(), 1);
        assert_eq!(client.session().phase(), LoginPhase::AwaitingLoginResult);

        let sent = handle.drain_outbound();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].op(), opcodes::LOGIN);
        assert_eq!(sent[0].payload()[0], 12);
    }

    #[test]
    fn test_config_login_type() {
        let config = ClientConfig {
            login_type: 20,
            ..ClientConfig::default()
        };
        let mut client = Client::new(&config);
        let (mut transport, mut handle) = channel();
        handle.set_state(ConnectionState::Connected);

        client.begin_login(Credentials::new("admin", "password"));
        handle.push(Packet::new(opcodes::CLIENT_IDENT_R)).unwrap();
        client.tick(&mut transport);

        assert_eq!(handle.drain_outbound()[0].payload()[0], 20);
    }
}

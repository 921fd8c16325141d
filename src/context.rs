//! Handler context
//!
//! Everything a packet handler may touch: the session state, the
//! credentials the user submitted, the local settings the login request
//! needs, plus queues for outbound packets and host notifications. The
//! dispatch loop owns the flushing of both queues.

use std::fmt;

use tracing::debug;

use crate::config::ClientConfig;
use crate::net::packet::Packet;
use crate::state::{ClientEvent, LoginPhase, SessionState};

/// Default login type marker (normal login)
pub const DEFAULT_LOGIN_TYPE: u8 = 12;

/// Account credentials entered by the user
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Mutable context passed to every handler
#[derive(Debug)]
pub struct ClientContext {
    session: SessionState,
    credentials: Option<Credentials>,
    login_type: u8,
    local_address: String,
    outbox: Vec<Packet>,
    events: Vec<ClientEvent>,
}

impl Default for ClientContext {
    fn default() -> Self {
        Self {
            session: SessionState::new(),
            credentials: None,
            login_type: DEFAULT_LOGIN_TYPE,
            local_address: "127.0.0.1".to_string(),
            outbox: Vec::new(),
            events: Vec::new(),
        }
    }
}

impl ClientContext {
    /// Create a context from the client configuration
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            login_type: config.login_type,
            local_address: config.local_address.clone(),
            ..Self::default()
        }
    }

    // ============ Login control (host side) ============

    /// The user submitted the login form. Restarts the handshake from
    /// `Ident` regardless of the current phase.
    pub fn begin_login(&mut self, credentials: Credentials) {
        debug!(
            username = %credentials.username,
            previous = %self.session.phase(),
            "Login form submitted"
        );
        self.credentials = Some(credentials);
        self.session.set_message(None);
        self.session.set_phase(LoginPhase::Ident);
    }

    /// Return to `Idle`, showing `message` to the user
    pub fn reset_login(&mut self, message: &str) {
        debug!(message, phase = %self.session.phase(), "Login reset");
        self.clear_password();
        self.session.set_phase(LoginPhase::Idle);
        self.session.set_message(Some(message.to_string()));
        self.emit(ClientEvent::LoginFailed {
            message: message.to_string(),
        });
    }

    // ============ Accessors ============

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub(crate) fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    pub fn phase(&self) -> LoginPhase {
        self.session.phase()
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub(crate) fn clear_password(&mut self) {
        if let Some(credentials) = self.credentials.as_mut() {
            credentials.password.clear();
        }
    }

    pub fn login_type(&self) -> u8 {
        self.login_type
    }

    pub fn local_address(&self) -> &str {
        &self.local_address
    }

    /// Update the address reported in the login request
    pub fn set_local_address(&mut self, address: impl Into<String>) {
        self.local_address = address.into();
    }

    // ============ Queues ============

    /// Queue a packet for sending after the handler returns
    pub fn send(&mut self, packet: Packet) {
        self.outbox.push(packet);
    }

    /// Queue a notification for the host
    pub fn emit(&mut self, event: ClientEvent) {
        self.events.push(event);
    }

    /// Take queued outbound packets
    pub(crate) fn take_outbox(&mut self) -> Vec<Packet> {
        std::mem::take(&mut self.outbox)
    }

    /// Take queued notifications
    pub fn drain_events(&mut self) -> Vec<ClientEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_login_from_any_phase() {
        let mut ctx = ClientContext::default();
        ctx.session_mut().set_phase(LoginPhase::LoggedIn);

        ctx.begin_login(Credentials::new("admin", "secret"));
        assert_eq!(ctx.phase(), LoginPhase::Ident);
        assert_eq!(ctx.credentials().unwrap().username, "admin");
    }

    #[test]
    fn test_reset_login() {
        let mut ctx = ClientContext::default();
        ctx.begin_login(Credentials::new("admin", "secret"));
        ctx.reset_login("Login failed.");

        assert_eq!(ctx.phase(), LoginPhase::Idle);
        assert_eq!(ctx.session().last_message(), Some("Login failed."));
        assert!(ctx.credentials().unwrap().password.is_empty());
        assert_eq!(
            ctx.drain_events(),
            vec![ClientEvent::LoginFailed {
                message: "Login failed.".to_string()
            }]
        );
        assert!(ctx.drain_events().is_empty());
    }

    #[test]
    fn test_from_config() {
        let config = ClientConfig {
            login_type: 5,
            local_address: "10.0.0.2".to_string(),
            ..ClientConfig::default()
        };
        let ctx = ClientContext::new(&config);
        assert_eq!(ctx.login_type(), 5);
        assert_eq!(ctx.local_address(), "10.0.0.2");
        assert_eq!(ctx.phase(), LoginPhase::Idle);
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("admin", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
    }
}

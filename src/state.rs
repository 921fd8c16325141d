//! Session state
//!
//! Decoded session data owned by the client: the login phase, the account
//! identity, the session key and the server/character rosters received
//! during the handshake. Downstream scene and UI code reads it; only the
//! handshake handlers write it.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::protocol::roster::{CharacterInfo, ServerInfo};

/// Login handshake phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoginPhase {
    /// Nothing in progress
    #[default]
    Idle,
    /// Credentials entered, waiting for the identification challenge
    Ident,
    /// Login request sent, waiting for the result
    AwaitingLoginResult,
    /// Authenticated, rosters received
    LoggedIn,
}

impl LoginPhase {
    /// Get a human-readable name for the phase
    pub fn name(&self) -> &'static str {
        match self {
            LoginPhase::Idle => "Idle",
            LoginPhase::Ident => "Ident",
            LoginPhase::AwaitingLoginResult => "AwaitingLoginResult",
            LoginPhase::LoggedIn => "LoggedIn",
        }
    }
}

impl fmt::Display for LoginPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Notifications for the host application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Login failed; the form should be reset showing this message
    LoginFailed { message: String },
    /// Login succeeded; switch to character selection
    LoggedIn,
    /// The server list was replaced; refresh the selection view
    ServerListChanged,
}

/// A timed account service flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServiceStatus {
    pub active: bool,
    pub expires: DateTime<Utc>,
}

impl ServiceStatus {
    /// Whether the service is active and not yet expired at `now`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.active && self.expires > now
    }
}

/// Account services reported at login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PremiumServices {
    pub nao_support: ServiceStatus,
    pub extra_storage: ServiceStatus,
    pub advanced_play: ServiceStatus,
    pub inventory_plus: ServiceStatus,
    pub premium: ServiceStatus,
    pub vip: ServiceStatus,
    pub reserved_premium1: ServiceStatus,
    pub reserved_premium2: ServiceStatus,
    pub pc_cafe: u8,
    pub free_beginner: u8,
}

/// Session state populated by the login handshake
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    phase: LoginPhase,
    account_name: String,
    session_key: u64,
    servers: Vec<ServerInfo>,
    characters: Vec<CharacterInfo>,
    services: PremiumServices,
    last_login: Option<DateTime<Utc>>,
    last_logout: Option<DateTime<Utc>>,
    last_message: Option<String>,
}

impl SessionState {
    /// Create an idle session
    pub fn new() -> Self {
        Self::default()
    }

    // ============ Accessors ============

    pub fn phase(&self) -> LoginPhase {
        self.phase
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    pub fn session_key(&self) -> u64 {
        self.session_key
    }

    pub fn servers(&self) -> &[ServerInfo] {
        &self.servers
    }

    /// Characters followed by pets
    pub fn characters(&self) -> &[CharacterInfo] {
        &self.characters
    }

    pub fn services(&self) -> &PremiumServices {
        &self.services
    }

    pub fn last_login(&self) -> Option<DateTime<Utc>> {
        self.last_login
    }

    pub fn last_logout(&self) -> Option<DateTime<Utc>> {
        self.last_logout
    }

    /// Message shown by the last failed login
    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    /// Whether the handshake has completed
    pub fn is_logged_in(&self) -> bool {
        self.phase == LoginPhase::LoggedIn
    }

    /// Find a server by name
    pub fn server(&self, name: &str) -> Option<&ServerInfo> {
        self.servers.iter().find(|s| s.name == name)
    }

    // ============ Mutation (handshake only) ============

    pub(crate) fn set_phase(&mut self, phase: LoginPhase) {
        self.phase = phase;
    }

    pub(crate) fn set_message(&mut self, message: Option<String>) {
        self.last_message = message;
    }

    /// Replace the server list
    pub(crate) fn replace_servers(&mut self, servers: Vec<ServerInfo>) {
        self.servers = servers;
    }

    /// Replace everything a successful login reports. Pets are appended
    /// after characters.
    pub(crate) fn apply_login(&mut self, login: AccountLogin) {
        self.account_name = login.account_name;
        self.session_key = login.session_key;
        self.servers = login.servers;
        self.characters = login.characters;
        self.characters.extend(login.pets);
        self.services = login.services;
        self.last_login = Some(login.last_login);
        self.last_logout = Some(login.last_logout);
        self.last_message = None;
        self.phase = LoginPhase::LoggedIn;
    }
}

/// Fully decoded successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountLogin {
    pub account_name: String,
    pub account_id: String,
    pub session_key: u64,
    pub servers: Vec<ServerInfo>,
    pub last_login: DateTime<Utc>,
    pub last_logout: DateTime<Utc>,
    pub services: PremiumServices,
    pub characters: Vec<CharacterInfo>,
    pub pets: Vec<CharacterInfo>,
}

//! Login handshake
//!
//! Client side of the login exchange:
//! 1. The user submits the form (`ClientContext::begin_login`), phase `Ident`
//! 2. Server sends `ClientIdentR`; client answers with a `Login` request
//!    carrying the account name and the password digest
//! 3. Server sends `LoginR`; on success the account, rosters and services
//!    replace the session state, otherwise the form is reset with a message
//! 4. While logged in, `ChannelStatus` broadcasts replace the server list
//!
//! Every handler checks the phase before reading the payload, and decodes
//! the whole payload before touching the session.

use md5::{Digest, Md5};
use tracing::{debug, info};

use crate::context::ClientContext;
use crate::error::{HandlerResult, PacketResult, ProtocolError};
use crate::net::buffer::PacketBuffer;
use crate::net::packet::Packet;
use crate::protocol::opcodes;
use crate::protocol::registry::HandlerDecl;
use crate::protocol::roster::{CharacterInfo, CharacterKind};
use crate::state::{AccountLogin, ClientEvent, LoginPhase, PremiumServices, ServiceStatus};

/// Handlers for the login exchange
pub const HANDLERS: &[HandlerDecl] = &[
    (&[opcodes::CLIENT_IDENT_R], client_ident_r),
    (&[opcodes::LOGIN_R], login_r),
    (&[opcodes::CHANNEL_STATUS], channel_status),
];

/// Result codes of a `LoginR` packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginResult {
    Fail,
    Success,
    Empty,
    IdOrPassIncorrect,
    IdOrPassIncorrect2,
    AlreadyLoggedIn,
    UnderAge,
    /// Server supplied message follows
    Message,
    SecondaryReq,
    SecondaryFail,
    Other(u8),
}

impl LoginResult {
    /// Convert a wire value to a LoginResult
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Fail,
            1 => Self::Success,
            2 => Self::Empty,
            3 => Self::IdOrPassIncorrect,
            4 => Self::IdOrPassIncorrect2,
            7 => Self::AlreadyLoggedIn,
            33 => Self::UnderAge,
            51 => Self::Message,
            90 => Self::SecondaryReq,
            91 => Self::SecondaryFail,
            other => Self::Other(other),
        }
    }

    /// Get the wire value
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Fail => 0,
            Self::Success => 1,
            Self::Empty => 2,
            Self::IdOrPassIncorrect => 3,
            Self::IdOrPassIncorrect2 => 4,
            Self::AlreadyLoggedIn => 7,
            Self::UnderAge => 33,
            Self::Message => 51,
            Self::SecondaryReq => 90,
            Self::SecondaryFail => 91,
            Self::Other(value) => value,
        }
    }

    /// Message shown to the user for a failed login without a server text
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::IdOrPassIncorrect => "The username or password is incorrect.",
            Self::SecondaryFail => "The secondary password is incorrect.",
            Self::AlreadyLoggedIn => "This account is already logged in.",
            _ => "Login failed.",
        }
    }
}

/// MD5 of the UTF-8 password as 32 uppercase hex digits
pub fn credential_digest(password: &str) -> String {
    Md5::digest(password.as_bytes())
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect()
}

/// Build the `Login` request sent in answer to `ClientIdentR`
pub fn build_login_request(
    login_type: u8,
    account: &str,
    password: &str,
    local_address: &str,
) -> PacketResult<Packet> {
    let mut packet = Packet::new(opcodes::LOGIN);
    let buffer = packet.buffer();
    buffer.put_byte(login_type);
    buffer.put_string(account)?;
    buffer.put_bin(credential_digest(password).as_bytes())?;
    buffer.put_bin(&[])?;
    buffer.put_int(0);
    buffer.put_int(0);
    buffer.put_string(local_address)?;
    Ok(packet)
}

fn require_phase(ctx: &ClientContext, packet: &Packet, expected: LoginPhase) -> HandlerResult {
    let phase = ctx.phase();
    if phase != expected {
        return Err(ProtocolError::UnexpectedState {
            op: packet.op(),
            phase,
        });
    }
    Ok(())
}

// ============ Handlers ============

/// Identification challenge answered: send the login request
pub fn client_ident_r(ctx: &mut ClientContext, packet: &mut Packet) -> HandlerResult {
    require_phase(ctx, packet, LoginPhase::Ident)?;
    let credentials = ctx
        .credentials()
        .ok_or(ProtocolError::UnexpectedState {
            op: packet.op(),
            phase: LoginPhase::Ident,
        })?;

    let request = build_login_request(
        ctx.login_type(),
        &credentials.username,
        &credentials.password,
        ctx.local_address(),
    )?;

    debug!(username = %credentials.username, "Sending login request");
    ctx.send(request);
    ctx.session_mut().set_phase(LoginPhase::AwaitingLoginResult);
    Ok(())
}

/// Login result
pub fn login_r(ctx: &mut ClientContext, packet: &mut Packet) -> HandlerResult {
    require_phase(ctx, packet, LoginPhase::AwaitingLoginResult)?;
    let buffer = packet.buffer();

    let result = LoginResult::from_u8(buffer.get_byte()?);
    match result {
        LoginResult::Success => {
            let login = AccountLogin::decode(buffer)?;
            info!(
                account = %login.account_name,
                servers = login.servers.len(),
                characters = login.characters.len(),
                pets = login.pets.len(),
                "Logged in"
            );
            ctx.session_mut().apply_login(login);
            ctx.clear_password();
            ctx.emit(ClientEvent::LoggedIn);
        }
        LoginResult::Message => {
            let _reserved1 = buffer.get_int()?;
            let _reserved2 = buffer.get_int()?;
            let message = buffer.get_string()?;
            info!(message = %message, "Login rejected with server message");
            ctx.reset_login(&message);
        }
        other => {
            info!(result = ?other, code = other.as_u8(), "Login rejected");
            ctx.reset_login(other.failure_message());
        }
    }
    Ok(())
}

/// Server list broadcast while at character selection
pub fn channel_status(ctx: &mut ClientContext, packet: &mut Packet) -> HandlerResult {
    require_phase(ctx, packet, LoginPhase::LoggedIn)?;

    let servers = packet.buffer().get_server_list()?;
    debug!(servers = servers.len(), "Server list updated");
    ctx.session_mut().replace_servers(servers);
    ctx.emit(ClientEvent::ServerListChanged);
    Ok(())
}

// ============ Account payload ============

impl ServiceStatus {
    pub fn decode(buffer: &mut PacketBuffer) -> PacketResult<Self> {
        let active = buffer.get_bool()?;
        let expires = buffer.get_date_time()?;
        Ok(Self { active, expires })
    }

    pub fn encode(&self, buffer: &mut PacketBuffer) {
        buffer.put_bool(self.active);
        buffer.put_date_time(self.expires);
    }
}

impl AccountLogin {
    /// Decode the body of a successful `LoginR`, after the result byte
    pub fn decode(buffer: &mut PacketBuffer) -> PacketResult<Self> {
        let account_name = buffer.get_string()?;
        let account_id = buffer.get_string()?;
        let session_key = buffer.get_long()?;
        let _reserved = buffer.get_byte()?;
        let servers = buffer.get_server_list()?;
        let last_login = buffer.get_date_time()?;
        let last_logout = buffer.get_date_time()?;

        let _reserved_int1 = buffer.get_int()?;
        let _reserved_byte1 = buffer.get_byte()?;
        let _reserved_byte2 = buffer.get_byte()?;
        let _reserved_int2 = buffer.get_int()?;
        let _reserved_byte3 = buffer.get_byte()?;

        let nao_support = ServiceStatus::decode(buffer)?;
        let extra_storage = ServiceStatus::decode(buffer)?;
        let advanced_play = ServiceStatus::decode(buffer)?;
        let _reserved_byte4 = buffer.get_byte()?;
        let _reserved_byte5 = buffer.get_byte()?;
        let inventory_plus = ServiceStatus::decode(buffer)?;
        let premium = ServiceStatus::decode(buffer)?;
        let vip = ServiceStatus::decode(buffer)?;
        let reserved_premium1 = ServiceStatus::decode(buffer)?;
        let reserved_premium2 = ServiceStatus::decode(buffer)?;
        let _reserved_byte6 = buffer.get_byte()?;
        let pc_cafe = buffer.get_byte()?;
        let free_beginner = buffer.get_byte()?;

        let characters = buffer.get_list(CharacterInfo::decode_character)?;
        let pets = buffer.get_list(CharacterInfo::decode_pet)?;

        Ok(Self {
            account_name,
            account_id,
            session_key,
            servers,
            last_login,
            last_logout,
            services: PremiumServices {
                nao_support,
                extra_storage,
                advanced_play,
                inventory_plus,
                premium,
                vip,
                reserved_premium1,
                reserved_premium2,
                pc_cafe,
                free_beginner,
            },
            characters,
            pets,
        })
    }

    /// Encode the body of a successful `LoginR`, after the result byte.
    /// Pets are written to the pet list whatever list they are stored in.
    pub fn encode(&self, buffer: &mut PacketBuffer) -> PacketResult<()> {
        buffer.put_string(&self.account_name)?;
        buffer.put_string(&self.account_id)?;
        buffer.put_long(self.session_key);
        buffer.put_byte(0);
        buffer.put_server_list(&self.servers)?;
        buffer.put_date_time(self.last_login);
        buffer.put_date_time(self.last_logout);

        buffer.put_int(0);
        buffer.put_byte(0);
        buffer.put_byte(0);
        buffer.put_int(0);
        buffer.put_byte(0);

        let services = &self.services;
        services.nao_support.encode(buffer);
        services.extra_storage.encode(buffer);
        services.advanced_play.encode(buffer);
        buffer.put_byte(0);
        buffer.put_byte(0);
        services.inventory_plus.encode(buffer);
        services.premium.encode(buffer);
        services.vip.encode(buffer);
        services.reserved_premium1.encode(buffer);
        services.reserved_premium2.encode(buffer);
        buffer.put_byte(0);
        buffer.put_byte(services.pc_cafe);
        buffer.put_byte(services.free_beginner);

        let (pets, characters): (Vec<_>, Vec<_>) = self
            .characters
            .iter()
            .chain(self.pets.iter())
            .cloned()
            .partition(|c| matches!(c.kind, CharacterKind::Pet { .. }));
        buffer.put_list(&characters, |b, c| c.encode(b))?;
        buffer.put_list(&pets, |b, c| c.encode(b))
    }

    /// Build a complete successful `LoginR` packet
    pub fn to_packet(&self) -> PacketResult<Packet> {
        let mut packet = Packet::new(opcodes::LOGIN_R);
        packet.buffer().put_byte(LoginResult::Success.as_u8());
        self.encode(packet.buffer())?;
        Ok(packet)
    }
}

//! Operation codes
//!
//! Numeric values are a wire-compatibility contract with the login server
//! and must not change.

use std::fmt;

/// Client identification (client -> server)
pub const CLIENT_IDENT: u32 = 0x0FD1_020A;
/// Identification challenge response (server -> client)
pub const CLIENT_IDENT_R: u32 = 0x0000_001F;
/// Login request (client -> server)
pub const LOGIN: u32 = 0x0FD1_2002;
/// Login result (server -> client)
pub const LOGIN_R: u32 = 0x0000_0023;
/// Channel/server status broadcast (server -> client)
pub const CHANNEL_STATUS: u32 = 0x0000_0026;

/// Get the symbolic name of an opcode, for logging
pub fn name(op: u32) -> &'static str {
    match op {
        CLIENT_IDENT => "ClientIdent",
        CLIENT_IDENT_R => "ClientIdentR",
        LOGIN => "Login",
        LOGIN_R => "LoginR",
        CHANNEL_STATUS => "ChannelStatus",
        _ => "?",
    }
}

/// Displays an opcode as eight uppercase hex digits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpHex(pub u32);

impl fmt::Display for OpHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

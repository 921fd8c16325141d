//! Roster records
//!
//! Count-prefixed records embedded in login packets: servers with their
//! channels, characters and pets. Characters and pets have different wire
//! layouts but decode into the same `CharacterInfo` shape.
//!
//! Reserved fields carry no known meaning. They are still read in their
//! declared order and width so the cursor stays aligned, and written as
//! zero when encoding.

use crate::error::PacketResult;
use crate::net::buffer::PacketBuffer;

/// Channel load state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelState {
    Maintenance,
    Normal,
    Busy,
    Full,
    Bootup,
    Error,
    Other(u32),
}

impl ChannelState {
    /// Convert a wire value to a ChannelState
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => Self::Maintenance,
            1 => Self::Normal,
            2 => Self::Busy,
            3 => Self::Full,
            5 => Self::Bootup,
            6 => Self::Error,
            other => Self::Other(other),
        }
    }

    /// Get the wire value
    pub fn as_u32(self) -> u32 {
        match self {
            Self::Maintenance => 0,
            Self::Normal => 1,
            Self::Busy => 2,
            Self::Full => 3,
            Self::Bootup => 5,
            Self::Error => 6,
            Self::Other(value) => value,
        }
    }

    /// Whether players can join the channel
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::Normal | Self::Busy)
    }
}

/// A channel of a server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub name: String,
    pub state: ChannelState,
    /// Event bitfield
    pub events: u32,
    /// Load, 0-75
    pub stress: u16,
}

impl ChannelInfo {
    pub fn decode(buffer: &mut PacketBuffer) -> PacketResult<Self> {
        let name = buffer.get_string()?;
        let state = ChannelState::from_u32(buffer.get_int()?);
        let events = buffer.get_int()?;
        let _reserved = buffer.get_int()?;
        let stress = buffer.get_short()?;

        Ok(Self {
            name,
            state,
            events,
            stress,
        })
    }

    pub fn encode(&self, buffer: &mut PacketBuffer) -> PacketResult<()> {
        buffer.put_string(&self.name)?;
        buffer.put_int(self.state.as_u32());
        buffer.put_int(self.events);
        buffer.put_int(0);
        buffer.put_short(self.stress);
        Ok(())
    }
}

/// A server and its channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    pub channels: Vec<ChannelInfo>,
}

impl ServerInfo {
    pub fn decode(buffer: &mut PacketBuffer) -> PacketResult<Self> {
        let name = buffer.get_string()?;
        let _reserved1 = buffer.get_short()?;
        let _reserved2 = buffer.get_short()?;
        let _reserved3 = buffer.get_byte()?;
        let channels = buffer.get_list(ChannelInfo::decode)?;

        Ok(Self { name, channels })
    }

    pub fn encode(&self, buffer: &mut PacketBuffer) -> PacketResult<()> {
        buffer.put_string(&self.name)?;
        buffer.put_short(0);
        buffer.put_short(0);
        buffer.put_byte(0);
        buffer.put_list(&self.channels, |b, c| c.encode(b))
    }

    /// Find a channel by name
    pub fn channel(&self, name: &str) -> Option<&ChannelInfo> {
        self.channels.iter().find(|c| c.name == name)
    }
}

impl PacketBuffer {
    /// Read a count-prefixed server list
    pub fn get_server_list(&mut self) -> PacketResult<Vec<ServerInfo>> {
        self.get_list(ServerInfo::decode)
    }

    /// Write a count-prefixed server list
    pub fn put_server_list(&mut self, servers: &[ServerInfo]) -> PacketResult<()> {
        self.put_list(servers, |b, s| s.encode(b))
    }
}

/// Deletion status of a character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeletionFlag {
    /// Not marked for deletion
    Normal,
    /// Marked, can still be recovered
    Recoverable,
    /// Ready to be deleted
    Ready,
    /// Deletion delayed
    Delay,
    Other(u8),
}

impl DeletionFlag {
    /// Convert a wire value to a DeletionFlag
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Normal,
            1 => Self::Recoverable,
            2 => Self::Ready,
            3 => Self::Delay,
            other => Self::Other(other),
        }
    }

    /// Get the wire value
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Recoverable => 1,
            Self::Ready => 2,
            Self::Delay => 3,
            Self::Other(value) => value,
        }
    }
}

/// Whether a roster entry came from the character or the pet list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterKind {
    Character,
    Pet { race: u32 },
}

/// A selectable character or pet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterInfo {
    pub server: String,
    pub entity_id: u64,
    pub name: String,
    pub deletion_flag: DeletionFlag,
    pub kind: CharacterKind,
}

impl CharacterInfo {
    /// Create a character entry
    pub fn character(server: &str, entity_id: u64, name: &str) -> Self {
        Self {
            server: server.to_string(),
            entity_id,
            name: name.to_string(),
            deletion_flag: DeletionFlag::Normal,
            kind: CharacterKind::Character,
        }
    }

    /// Create a pet entry
    pub fn pet(server: &str, entity_id: u64, name: &str, race: u32) -> Self {
        Self {
            kind: CharacterKind::Pet { race },
            ..Self::character(server, entity_id, name)
        }
    }

    pub fn is_pet(&self) -> bool {
        matches!(self.kind, CharacterKind::Pet { .. })
    }

    /// Decode an element of the character list
    pub fn decode_character(buffer: &mut PacketBuffer) -> PacketResult<Self> {
        let server = buffer.get_string()?;
        let entity_id = buffer.get_long()?;
        let name = buffer.get_string()?;
        let deletion_flag = DeletionFlag::from_u8(buffer.get_byte()?);
        let _reserved_long = buffer.get_long()?;
        let _reserved_int = buffer.get_int()?;
        let _reserved_byte1 = buffer.get_byte()?;
        let _reserved_byte2 = buffer.get_byte()?;
        let _reserved_byte3 = buffer.get_byte()?;

        Ok(Self {
            server,
            entity_id,
            name,
            deletion_flag,
            kind: CharacterKind::Character,
        })
    }

    /// Decode an element of the pet list
    pub fn decode_pet(buffer: &mut PacketBuffer) -> PacketResult<Self> {
        let server = buffer.get_string()?;
        let entity_id = buffer.get_long()?;
        let name = buffer.get_string()?;
        let deletion_flag = DeletionFlag::from_u8(buffer.get_byte()?);
        let _reserved_long1 = buffer.get_long()?;
        let race = buffer.get_int()?;
        let _reserved_long2 = buffer.get_long()?;
        let _reserved_long3 = buffer.get_long()?;
        let _reserved_int = buffer.get_int()?;
        let _reserved_byte = buffer.get_byte()?;

        Ok(Self {
            server,
            entity_id,
            name,
            deletion_flag,
            kind: CharacterKind::Pet { race },
        })
    }

    /// Encode in the layout matching `kind`
    pub fn encode(&self, buffer: &mut PacketBuffer) -> PacketResult<()> {
        buffer.put_string(&self.server)?;
        buffer.put_long(self.entity_id);
        buffer.put_string(&self.name)?;
        buffer.put_byte(self.deletion_flag.as_u8());
        buffer.put_long(0);
        match self.kind {
            CharacterKind::Character => {
                buffer.put_int(0);
                buffer.put_bytes(&[0, 0, 0]);
            }
            CharacterKind::Pet { race } => {
                buffer.put_int(race);
                buffer.put_long(0);
                buffer.put_long(0);
                buffer.put_int(0);
                buffer.put_byte(0);
            }
        }
        Ok(())
    }
}

pub mod client_event;
pub mod error;
pub mod event_id;
pub mod received_event;
pub mod server_event;
mod wire;

use std::fmt;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ROOM: &str = "general";

pub const MAX_STRING_LENGTH: usize = u8::MAX as usize;
pub const MAX_AUDIO_CHUNK_LEN: usize = 1024 * 1024;
pub const MAX_PARTICIPANTS: usize = u16::MAX as usize;

pub type RoomId = String;

/// Identity of one client session. Assigned by the server at connect time and
/// never reused while the process lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// One entry of a participants snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ConnectionId,
    pub display_name: String,
    pub speaking: bool,
}

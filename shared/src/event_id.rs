use strum_macros::{Display, EnumIter};

use crate::error::ProtocolError;

const EVENT_BYTE_OFFSET: u8 = 69;

macro_rules! event_id_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident),* $(,)?
        }
    ) => {
        #[derive(Debug, PartialEq, Eq, Clone, Copy, Display, EnumIter)]
        #[strum(serialize_all = "kebab-case")]
        #[repr(u8)]
        $(#[$meta])*
        $vis enum $name {
            $($variant),*
        }

        impl $name {

            pub fn to_byte(&self) -> u8 {
                *self as u8 + EVENT_BYTE_OFFSET
            }

            pub fn from_byte(byte: u8) -> Result<Self, ProtocolError> {
                match byte.wrapping_sub(EVENT_BYTE_OFFSET) {
                    $(x if x == $name::$variant as u8 => Ok($name::$variant),)*
                    _ => Err(ProtocolError::UnknownEventId(byte)),
                }
            }
        }
    };
}

event_id_enum! {
    /// Frame tags sent by clients.
    pub enum ClientEventId {
        SwitchRoom,
        AudioChunk,
        SpeakingStarted,
        SpeakingStopped,
    }
}

event_id_enum! {
    /// Frame tags sent by the server.
    pub enum ServerEventId {
        ConnectSuccess,
        ParticipantsSnapshot,
        UserJoined,
        UserLeft,
        AudioChunk,
        SpeakingStarted,
        SpeakingStopped,
    }
}

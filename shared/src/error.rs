use std::string::FromUtf8Error;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("unknown event id byte {0}")]
    UnknownEventId(u8),

    #[error("{what} of {len} exceeds the limit of {max}")]
    PayloadTooLarge {
        what: &'static str,
        len: usize,
        max: usize,
    },

    #[error("invalid utf-8 in string field: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),
}

impl ProtocolError {
    /// True when the peer went away mid-frame rather than sending garbage.
    pub fn is_disconnect(&self) -> bool {
        match self {
            ProtocolError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}

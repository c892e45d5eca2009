use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::{
    ConnectionId, Participant, error::ProtocolError, event_id::ServerEventId,
    received_event::ReceivedEvent, wire,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    ConnectSuccess {
        id: ConnectionId,
        display_name: String,
    },
    ParticipantsSnapshot(Vec<Participant>),
    UserJoined {
        id: ConnectionId,
        display_name: String,
    },
    UserLeft(ConnectionId),
    AudioChunk {
        sender: ConnectionId,
        payload: Bytes,
        /// Milliseconds since the Unix epoch, stamped by the relay.
        delivered_at: i64,
    },
    SpeakingStarted(ConnectionId),
    SpeakingStopped(ConnectionId),
}

impl ServerEvent {
    pub fn id(&self) -> ServerEventId {
        match self {
            ServerEvent::ConnectSuccess { .. } => ServerEventId::ConnectSuccess,
            ServerEvent::ParticipantsSnapshot(_) => ServerEventId::ParticipantsSnapshot,
            ServerEvent::UserJoined { .. } => ServerEventId::UserJoined,
            ServerEvent::UserLeft(_) => ServerEventId::UserLeft,
            ServerEvent::AudioChunk { .. } => ServerEventId::AudioChunk,
            ServerEvent::SpeakingStarted(_) => ServerEventId::SpeakingStarted,
            ServerEvent::SpeakingStopped(_) => ServerEventId::SpeakingStopped,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut bytes = vec![self.id().to_byte()];

        match self {
            ServerEvent::ConnectSuccess { id, display_name }
            | ServerEvent::UserJoined { id, display_name } => {
                wire::put_id(&mut bytes, *id);
                wire::put_string(&mut bytes, "display name", display_name)?;
            }
            ServerEvent::ParticipantsSnapshot(participants) => {
                wire::put_participants(&mut bytes, participants)?;
            }
            ServerEvent::UserLeft(id)
            | ServerEvent::SpeakingStarted(id)
            | ServerEvent::SpeakingStopped(id) => wire::put_id(&mut bytes, *id),
            ServerEvent::AudioChunk {
                sender,
                payload,
                delivered_at,
            } => {
                wire::put_id(&mut bytes, *sender);
                wire::put_timestamp(&mut bytes, *delivered_at);
                wire::put_audio(&mut bytes, payload)?;
            }
        }

        Ok(bytes)
    }

    pub async fn write_to_stream<W>(&self, stream: &mut W) -> Result<(), ProtocolError>
    where
        W: AsyncWrite + Unpin,
    {
        let bytes = self.encode()?;
        stream.write_all(&bytes).await?;

        Ok(())
    }

    pub async fn read_from_stream<R>(stream: &mut R) -> Result<ReceivedEvent<Self>, ProtocolError>
    where
        R: AsyncRead + Unpin,
    {
        let first_byte = match wire::read_tag(stream).await? {
            Some(byte) => byte,
            None => return Ok(ReceivedEvent::EOF),
        };

        let event = match ServerEventId::from_byte(first_byte)? {
            ServerEventId::ConnectSuccess => ServerEvent::ConnectSuccess {
                id: wire::read_id(stream).await?,
                display_name: wire::read_string(stream).await?,
            },
            ServerEventId::ParticipantsSnapshot => {
                ServerEvent::ParticipantsSnapshot(wire::read_participants(stream).await?)
            }
            ServerEventId::UserJoined => ServerEvent::UserJoined {
                id: wire::read_id(stream).await?,
                display_name: wire::read_string(stream).await?,
            },
            ServerEventId::UserLeft => ServerEvent::UserLeft(wire::read_id(stream).await?),
            ServerEventId::AudioChunk => {
                let sender = wire::read_id(stream).await?;
                let delivered_at = wire::read_timestamp(stream).await?;
                let payload = wire::read_audio(stream).await?;

                ServerEvent::AudioChunk {
                    sender,
                    payload,
                    delivered_at,
                }
            }
            ServerEventId::SpeakingStarted => {
                ServerEvent::SpeakingStarted(wire::read_id(stream).await?)
            }
            ServerEventId::SpeakingStopped => {
                ServerEvent::SpeakingStopped(wire::read_id(stream).await?)
            }
        };

        Ok(ReceivedEvent::Event(event))
    }
}

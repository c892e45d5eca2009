use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::{
    RoomId, error::ProtocolError, event_id::ClientEventId, received_event::ReceivedEvent, wire,
};

/// Everything a client may send once connected. Connect and disconnect are
/// implied by the socket itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    SwitchRoom(RoomId),
    AudioChunk(Bytes),
    SpeakingStarted,
    SpeakingStopped,
}

impl ClientEvent {
    pub fn id(&self) -> ClientEventId {
        match self {
            ClientEvent::SwitchRoom(_) => ClientEventId::SwitchRoom,
            ClientEvent::AudioChunk(_) => ClientEventId::AudioChunk,
            ClientEvent::SpeakingStarted => ClientEventId::SpeakingStarted,
            ClientEvent::SpeakingStopped => ClientEventId::SpeakingStopped,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut bytes = vec![self.id().to_byte()];

        match self {
            ClientEvent::SwitchRoom(room) => wire::put_string(&mut bytes, "room name", room)?,
            ClientEvent::AudioChunk(payload) => wire::put_audio(&mut bytes, payload)?,
            ClientEvent::SpeakingStarted | ClientEvent::SpeakingStopped => {}
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

        let event = match ClientEventId::from_byte(first_byte)? {
            ClientEventId::SwitchRoom => ClientEvent::SwitchRoom(wire::read_string(stream).await?),
            ClientEventId::AudioChunk => ClientEvent::AudioChunk(wire::read_audio(stream).await?),
            ClientEventId::SpeakingStarted => ClientEvent::SpeakingStarted,
            ClientEventId::SpeakingStopped => ClientEvent::SpeakingStopped,
        };

        Ok(ReceivedEvent::Event(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_AUDIO_CHUNK_LEN;
    use std::io::Cursor;

    async fn decode(bytes: Vec<u8>) -> Result<ReceivedEvent<ClientEvent>, ProtocolError> {
        ClientEvent::read_from_stream(&mut Cursor::new(bytes)).await
    }

    #[tokio::test]
    async fn empty_stream_is_eof() {
        assert!(matches!(decode(Vec::new()).await, Ok(ReceivedEvent::EOF)));
    }

    #[tokio::test]
    async fn frames_are_read_back_in_order_over_a_pipe() {
        let (mut client, mut server) = tokio::io::duplex(64);

        let writer = tokio::spawn(async move {
            ClientEvent::SwitchRoom("team".to_string())
                .write_to_stream(&mut client)
                .await
                .unwrap();
            ClientEvent::SpeakingStarted
                .write_to_stream(&mut client)
                .await
                .unwrap();
            ClientEvent::AudioChunk(Bytes::from(vec![7u8; 300]))
                .write_to_stream(&mut client)
                .await
                .unwrap();
        });

        let mut received = Vec::new();
        loop {
            match ClientEvent::read_from_stream(&mut server).await.unwrap() {
                ReceivedEvent::EOF => break,
                ReceivedEvent::Event(event) => received.push(event),
            }
        }
        writer.await.unwrap();

        assert_eq!(
            received,
            vec![
                ClientEvent::SwitchRoom("team".to_string()),
                ClientEvent::SpeakingStarted,
                ClientEvent::AudioChunk(Bytes::from(vec![7u8; 300])),
            ]
        );
    }

    #[tokio::test]
    async fn truncated_audio_frame_is_an_io_error() {
        let mut bytes = ClientEvent::AudioChunk(Bytes::from_static(b"abcdef"))
            .encode()
            .unwrap();
        bytes.truncate(bytes.len() - 2);

        let err = decode(bytes).await.unwrap_err();
        assert!(err.is_disconnect());
    }

    #[tokio::test]
    async fn oversized_audio_length_is_rejected_before_allocating() {
        let mut bytes = vec![ClientEventId::AudioChunk.to_byte()];
        bytes.extend_from_slice(&((MAX_AUDIO_CHUNK_LEN as u32) + 1).to_be_bytes());

        match decode(bytes).await {
            Err(ProtocolError::PayloadTooLarge { len, .. }) => {
                assert_eq!(len, MAX_AUDIO_CHUNK_LEN + 1)
            }
            other => panic!("expected payload too large, got {other:?}"),
        }
    }

    #[test]
    fn room_name_longer_than_a_byte_cannot_be_encoded() {
        let event = ClientEvent::SwitchRoom("r".repeat(256));
        assert!(matches!(
            event.encode(),
            Err(ProtocolError::PayloadTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn invalid_utf8_room_name_is_rejected() {
        let bytes = vec![ClientEventId::SwitchRoom.to_byte(), 2, 0xff, 0xfe];
        assert!(matches!(
            decode(bytes).await,
            Err(ProtocolError::InvalidUtf8(_))
        ));
    }

    #[tokio::test]
    async fn server_tag_is_not_a_client_event() {
        let bytes = vec![0x01];
        assert!(matches!(
            decode(bytes).await,
            Err(ProtocolError::UnknownEventId(0x01))
        ));
    }
}

//! Field-level encoding shared by the client and server frames.
//!
//! Encoders append to a buffer so a whole frame goes out in one `write_all`.
//! Decoders pull exactly one field off the stream.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{
    ConnectionId, MAX_AUDIO_CHUNK_LEN, MAX_PARTICIPANTS, MAX_STRING_LENGTH, Participant,
    error::ProtocolError,
};

pub(crate) fn put_id(buf: &mut Vec<u8>, id: ConnectionId) {
    buf.extend_from_slice(&id.0.to_be_bytes());
}

pub(crate) fn put_string(
    buf: &mut Vec<u8>,
    what: &'static str,
    value: &str,
) -> Result<(), ProtocolError> {
    if value.len() > MAX_STRING_LENGTH {
        return Err(ProtocolError::PayloadTooLarge {
            what,
            len: value.len(),
            max: MAX_STRING_LENGTH,
        });
    }

    buf.push(value.len() as u8);
    buf.extend_from_slice(value.as_bytes());

    Ok(())
}

pub(crate) fn put_audio(buf: &mut Vec<u8>, payload: &[u8]) -> Result<(), ProtocolError> {
    if payload.len() > MAX_AUDIO_CHUNK_LEN {
        return Err(ProtocolError::PayloadTooLarge {
            what: "audio chunk",
            len: payload.len(),
            max: MAX_AUDIO_CHUNK_LEN,
        });
    }

    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(payload);

    Ok(())
}

pub(crate) fn put_timestamp(buf: &mut Vec<u8>, millis: i64) {
    buf.extend_from_slice(&millis.to_be_bytes());
}

pub(crate) fn put_participant(
    buf: &mut Vec<u8>,
    participant: &Participant,
) -> Result<(), ProtocolError> {
    put_id(buf, participant.id);
    put_string(buf, "display name", &participant.display_name)?;
    buf.push(participant.speaking as u8);

    Ok(())
}

pub(crate) fn put_participants(
    buf: &mut Vec<u8>,
    participants: &[Participant],
) -> Result<(), ProtocolError> {
    if participants.len() > MAX_PARTICIPANTS {
        return Err(ProtocolError::PayloadTooLarge {
            what: "participant list",
            len: participants.len(),
            max: MAX_PARTICIPANTS,
        });
    }

    buf.extend_from_slice(&(participants.len() as u16).to_be_bytes());
    for participant in participants {
        put_participant(buf, participant)?;
    }

    Ok(())
}

pub(crate) async fn read_id<R>(stream: &mut R) -> Result<ConnectionId, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    Ok(ConnectionId(stream.read_u64().await?))
}

pub(crate) async fn read_string<R>(stream: &mut R) -> Result<String, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let len = stream.read_u8().await? as usize;

    let mut buf = vec![0; len];
    stream.read_exact(&mut buf).await?;

    Ok(String::from_utf8(buf)?)
}

pub(crate) async fn read_audio<R>(stream: &mut R) -> Result<Bytes, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let len = stream.read_u32().await? as usize;
    if len > MAX_AUDIO_CHUNK_LEN {
        return Err(ProtocolError::PayloadTooLarge {
            what: "audio chunk",
            len,
            max: MAX_AUDIO_CHUNK_LEN,
        });
    }

    let mut buf = vec![0; len];
    stream.read_exact(&mut buf).await?;

    Ok(Bytes::from(buf))
}

pub(crate) async fn read_timestamp<R>(stream: &mut R) -> Result<i64, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    Ok(stream.read_i64().await?)
}

pub(crate) async fn read_participant<R>(stream: &mut R) -> Result<Participant, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let id = read_id(stream).await?;
    let display_name = read_string(stream).await?;
    let speaking = stream.read_u8().await? != 0;

    Ok(Participant {
        id,
        display_name,
        speaking,
    })
}

pub(crate) async fn read_participants<R>(stream: &mut R) -> Result<Vec<Participant>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let count = stream.read_u16().await? as usize;

    let mut participants = Vec::with_capacity(count);
    for _ in 0..count {
        participants.push(read_participant(stream).await?);
    }

    Ok(participants)
}

/// Reads the leading tag byte. `None` means the peer closed cleanly between
/// frames.
pub(crate) async fn read_tag<R>(stream: &mut R) -> Result<Option<u8>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0; 1];

    match stream.read(&mut buf).await {
        Ok(0) => Ok(None),
        Ok(_) => Ok(Some(buf[0])),
        Err(e) => Err(e.into()),
    }
}

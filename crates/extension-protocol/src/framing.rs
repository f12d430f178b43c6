//! Native-messaging framing.
//!
//! Each message is a `u32` length in native byte order followed by that many
//! bytes of UTF-8 JSON. Browsers refuse host messages over 1 MiB and send at
//! most 64 MiB.

use crate::{ExtensionMessage, ProtocolError, ProtocolResult};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// Largest message the host may send to the browser.
pub const MAX_OUTGOING_MESSAGE_BYTES: usize = 1024 * 1024;

/// Largest message accepted from the browser.
pub const MAX_INCOMING_MESSAGE_BYTES: usize = 64 * 1024 * 1024;

/// Read one frame. Returns `None` on a clean end of stream.
pub async fn read_frame<R>(reader: &mut R) -> ProtocolResult<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    let mut filled = 0;
    while filled < header.len() {
        let n = reader.read(&mut header[filled..]).await?;
        if n == 0 {
            return if filled == 0 {
                Ok(None)
            } else {
                Err(ProtocolError::Truncated)
            };
        }
        filled += n;
    }

    let len = u32::from_ne_bytes(header) as usize;
    if len > MAX_INCOMING_MESSAGE_BYTES {
        return Err(ProtocolError::MessageTooLarge {
            len,
            limit: MAX_INCOMING_MESSAGE_BYTES,
        });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await.map_err(|err| {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            ProtocolError::Truncated
        } else {
            ProtocolError::Io(err)
        }
    })?;
    Ok(Some(payload))
}

/// Write one frame and flush.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> ProtocolResult<()>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > MAX_OUTGOING_MESSAGE_BYTES {
        return Err(ProtocolError::MessageTooLarge {
            len: payload.len(),
            limit: MAX_OUTGOING_MESSAGE_BYTES,
        });
    }
    let len = u32::try_from(payload.len())
        .map_err(|_| ProtocolError::Protocol("frame length overflows u32".to_string()))?;
    writer.write_all(&len.to_ne_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read and decode the next message. Returns `None` when the browser closes
/// the pipe.
pub async fn read_message<R>(reader: &mut R) -> ProtocolResult<Option<ExtensionMessage>>
where
    R: AsyncRead + Unpin,
{
    let Some(payload) = read_frame(reader).await? else {
        return Ok(None);
    };
    let message = ExtensionMessage::from_slice(&payload)?;
    debug!(kind = message.kind(), bytes = payload.len(), "Received message");
    Ok(Some(message))
}

/// Encode and send one message.
pub async fn write_message<W>(writer: &mut W, message: &ExtensionMessage) -> ProtocolResult<()>
where
    W: AsyncWrite + Unpin,
{
    let payload = serde_json::to_vec(message)?;
    if let Err(err) = write_frame(writer, &payload).await {
        warn!(kind = message.kind(), error = %err, "Failed to send message");
        return Err(err);
    }
    debug!(kind = message.kind(), bytes = payload.len(), "Sent message");
    Ok(())
}

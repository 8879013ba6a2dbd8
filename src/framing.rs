//! Length-prefixed JSON framing
//!
//! All frames are JSON-encoded, prefixed with a 4-byte little-endian length.
//! Shared by the dialog-bus attachment and the player link.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on a single frame; larger frames disconnect the peer
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Read one frame from the stream.
///
/// Returns `Ok(None)` on a clean end of stream (peer closed between
/// frames); any other shortfall or oversized frame is an error.
pub async fn read_frame<T, R>(stream: &mut R) -> Result<Option<T>>
where
    T: DeserializeOwned,
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match stream.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        anyhow::bail!("frame too large ({} bytes)", len);
    }

    let mut msg_buf = vec![0u8; len];
    stream
        .read_exact(&mut msg_buf)
        .await
        .context("truncated frame")?;

    let msg = serde_json::from_slice(&msg_buf).context("failed to parse frame")?;
    Ok(Some(msg))
}

/// Write one length-prefixed JSON frame
pub async fn write_frame<T, W>(stream: &mut W, msg: &T) -> Result<()>
where
    T: Serialize,
    W: AsyncWrite + Unpin,
{
    let msg_bytes = serde_json::to_vec(msg)?;
    let msg_len = (msg_bytes.len() as u32).to_le_bytes();

    stream.write_all(&msg_len).await?;
    stream.write_all(&msg_bytes).await?;

    Ok(())
}

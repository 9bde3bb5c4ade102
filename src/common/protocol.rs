//! Control-channel wire protocol. Every message is a single ASCII line
//! terminated by one line-feed byte; there is no other framing.

use tokio::io::{self, AsyncWrite, AsyncWriteExt};

/// Sent by the broker when the agent's credential matched.
pub const VALIDATION_OK: &str = "VALIDATION_OK";

/// Liveness probe written to the attached agent every few seconds.
pub const KEEP_ALIVE: &str = "KEEP_ALIVE";

/// Tells the agent a user connection is waiting for a tunnel.
pub const NEW_CONNECTION: &str = "NEW_CONNECTION";

/// Writes one protocol line, terminator included, and flushes it out.
pub async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, message: &str) -> io::Result<()> {
    writer.write_all(message.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

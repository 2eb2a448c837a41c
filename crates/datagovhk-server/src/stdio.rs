//! Newline-delimited JSON-RPC over a byte stream pair (stdin/stdout).
//!
//! No sessions: the stream itself is the session. Each response is written
//! as one line. The loop ends at EOF.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::dispatch::{Dispatcher, parse_message};
use crate::error::Result;

/// Serve messages from `reader`, writing responses to `writer`, until EOF.
pub async fn serve_stdio<R, W>(dispatcher: &Dispatcher, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match parse_message(line.as_bytes()) {
            Ok(message) => dispatcher.handle(message).await,
            Err(error) => Some(*error),
        };

        if let Some(response) = response {
            let mut json = serde_json::to_string(&response)?;
            json.push('\n');
            writer.write_all(json.as_bytes()).await?;
            writer.flush().await?;
        }
    }

    tracing::info!("stdin closed, stopping stdio server");
    Ok(())
}

//! Shutdown triggers for the HTTP server.

use tokio::io::AsyncReadExt;

/// Resolve on Ctrl-C, or when stdin reaches EOF if `watch_stdin` is set.
///
/// A parent process that spawned the server closes the server's stdin to
/// ask it to stop.
pub async fn shutdown_signal(watch_stdin: bool) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
        tracing::info!("received Ctrl-C");
    };

    let stdin_closed = async {
        if !watch_stdin {
            return std::future::pending::<()>().await;
        }
        stdin_eof(tokio::io::stdin()).await;
        tracing::info!("stdin closed");
    };

    tokio::select! {
        _ = ctrl_c => {}
        _ = stdin_closed => {}
    }

    tracing::info!("shutting down");
}

/// Read and discard input until EOF or a read error.
pub async fn stdin_eof<R: tokio::io::AsyncRead + Unpin>(mut reader: R) {
    let mut buf = [0u8; 256];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => return,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!(error = %e, "stdin read failed");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stdin_eof_returns_after_input() {
        stdin_eof(&b"some bytes"[..]).await;
    }
}

//! Raw TCP transport
//!
//! One exchange per connection: the client writes the UTF-8 question, the
//! server replies with the MP3 bytes in chunks followed by the
//! `<END_OF_AUDIO>` marker, then closes.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use super::Gateway;
use crate::config::Transport;
use crate::{Error, Result};

/// Marker terminating the audio response stream
pub const END_OF_AUDIO: &[u8] = b"<END_OF_AUDIO>";

/// Cap on the question read and the response write granularity (1 MiB)
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Serve the TCP transport
///
/// # Errors
///
/// Returns error if the listener fails to bind
pub async fn serve(gateway: Arc<Gateway>, host: &str, port: u16) -> Result<()> {
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Transport(format!("failed to bind {addr}: {e}")))?;

    tracing::info!(%addr, "TCP server listening");

    loop {
        let (stream, peer) = listener
            .accept()
            .await
            .map_err(|e| Error::Transport(format!("accept failed: {e}")))?;

        let gateway = Arc::clone(&gateway);
        tokio::spawn(async move {
            tracing::info!(%peer, "client connected");
            if let Err(e) = handle_client(&gateway, stream, peer).await {
                tracing::error!(%peer, error = %e, "client handling failed");
            }
            tracing::info!(%peer, "client connection closed");
        });
    }
}

/// Handle one question/answer exchange
async fn handle_client(
    gateway: &Gateway,
    mut stream: TcpStream,
    peer: SocketAddr,
) -> Result<()> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let n = stream.read(&mut buf).await?;
    if n == 0 {
        tracing::warn!(%peer, "no data received from client");
        return Ok(());
    }

    let question = std::str::from_utf8(&buf[..n])
        .map_err(|e| Error::Transport(format!("question is not valid UTF-8: {e}")))?;

    let audio = gateway
        .answer(Transport::Tcp, &peer.ip().to_string(), question)
        .await?;

    tracing::info!(%peer, bytes = audio.len(), "sending audio");
    for chunk in audio.chunks(CHUNK_SIZE) {
        stream.write_all(chunk).await?;
    }
    stream.write_all(END_OF_AUDIO).await?;
    stream.flush().await?;
    stream.shutdown().await?;

    Ok(())
}

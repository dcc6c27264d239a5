//! Ask client: send a question over TCP, collect the audio response
//!
//! Speaks the raw TCP protocol: write the question, then read until the
//! `<END_OF_AUDIO>` marker (or EOF) and strip the marker from the audio.

use std::path::PathBuf;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::server::tcp::END_OF_AUDIO;
use crate::{Error, Result};

/// Read granularity for the audio response
const READ_CHUNK: usize = 64 * 1024;

/// TCP client for the question/audio exchange
pub struct AskClient {
    host: String,
    port: u16,
}

impl AskClient {
    /// Create a client for the given server address
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Send a question and return the MP3 audio response
    ///
    /// # Errors
    ///
    /// Returns error if the connection, send, or receive fails, or the
    /// server closes without sending any audio
    pub async fn send_question(&self, question: &str) -> Result<Vec<u8>> {
        let addr = format!("{}:{}", self.host, self.port);
        let mut stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| Error::Transport(format!("failed to connect to {addr}: {e}")))?;
        tracing::info!(%addr, "connected to server");

        stream.write_all(question.as_bytes()).await?;
        stream.flush().await?;
        tracing::info!(question, "question sent");

        let mut audio = Vec::new();
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = stream.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            if append_and_strip_marker(&mut audio, &buf[..n]) {
                break;
            }
        }

        if audio.is_empty() {
            return Err(Error::Transport(
                "server closed without sending audio".to_string(),
            ));
        }

        tracing::info!(bytes = audio.len(), "received complete audio");
        Ok(audio)
    }

    /// Write audio bytes to a temp MP3 file and return its path
    ///
    /// The file is kept on disk so a player can open it after this call.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be created or written
    pub fn save_temp_mp3(audio: &[u8]) -> Result<PathBuf> {
        let file = tempfile::Builder::new()
            .prefix("aria-answer-")
            .suffix(".mp3")
            .tempfile()?;
        std::fs::write(file.path(), audio)?;
        let (_, path) = file.keep().map_err(|e| Error::Io(e.error))?;
        Ok(path)
    }
}

/// Append a chunk to the audio buffer and strip the end-of-audio marker if
/// it is now present. Returns true once the marker was found.
///
/// Only the tail that could contain the marker is rescanned: the new chunk
/// plus the last `marker - 1` bytes already buffered, in case the marker
/// straddles a read boundary.
fn append_and_strip_marker(audio: &mut Vec<u8>, chunk: &[u8]) -> bool {
    let scan_from = audio.len().saturating_sub(END_OF_AUDIO.len() - 1);
    audio.extend_from_slice(chunk);

    if let Some(pos) = find_marker(&audio[scan_from..]) {
        audio.truncate(scan_from + pos);
        return true;
    }
    false
}

/// Find the start of the end-of-audio marker in the buffer, if present
fn find_marker(buf: &[u8]) -> Option<usize> {
    buf.windows(END_OF_AUDIO.len())
        .position(|window| window == END_OF_AUDIO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_found_at_end() {
        let mut data = vec![1u8, 2, 3];
        data.extend_from_slice(END_OF_AUDIO);
        assert_eq!(find_marker(&data), Some(3));
    }

    #[test]
    fn marker_found_when_split_mid_buffer() {
        let mut data = vec![9u8; 100];
        data.extend_from_slice(END_OF_AUDIO);
        data.extend_from_slice(&[0u8; 4]);
        assert_eq!(find_marker(&data), Some(100));
    }

    #[test]
    fn no_marker_in_plain_audio() {
        let data = vec![0xffu8; 256];
        assert_eq!(find_marker(&data), None);
    }

    #[test]
    fn partial_marker_is_not_a_match() {
        let mut data = vec![1u8, 2, 3];
        data.extend_from_slice(&END_OF_AUDIO[..5]);
        assert_eq!(find_marker(&data), None);
    }

    #[test]
    fn marker_split_across_appends_is_stripped() {
        let mut audio = vec![7u8; 300];
        assert!(!append_and_strip_marker(&mut audio, &END_OF_AUDIO[..6]));
        assert!(append_and_strip_marker(&mut audio, &END_OF_AUDIO[6..]));
        assert_eq!(audio, vec![7u8; 300]);
    }

    #[test]
    fn marker_inside_one_append_is_stripped() {
        let mut audio = Vec::new();
        let mut chunk = vec![1u8, 2, 3];
        chunk.extend_from_slice(END_OF_AUDIO);
        chunk.extend_from_slice(&[9u8; 8]);

        assert!(append_and_strip_marker(&mut audio, &chunk));
        assert_eq!(audio, [1, 2, 3]);
    }

    #[test]
    fn append_without_marker_keeps_accumulating() {
        let mut audio = Vec::new();
        assert!(!append_and_strip_marker(&mut audio, &[0xffu8; 100]));
        assert!(!append_and_strip_marker(&mut audio, &[0xeeu8; 100]));
        assert_eq!(audio.len(), 200);
    }

    #[test]
    fn temp_file_keeps_audio() {
        let audio = [0x49u8, 0x44, 0x33, 0x04];
        let path = AskClient::save_temp_mp3(&audio).unwrap();
        let read_back = std::fs::read(&path).unwrap();
        assert_eq!(read_back, audio);
        std::fs::remove_file(path).ok();
    }
}

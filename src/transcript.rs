//! Append-only interaction log
//!
//! Every completed exchange is recorded as one JSON line at a fixed path
//! under the data directory. Writes are best-effort — a failed append is
//! logged and never propagates to the request path.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::Result;

/// One audited question/answer exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// ISO 8601 timestamp
    pub timestamp: String,
    /// Session the exchange belongs to
    pub session_id: String,
    /// Transport that carried the exchange ("websocket" or "tcp")
    pub transport: String,
    /// The question as received
    pub question: String,
    /// The assistant's textual answer
    pub answer: String,
    /// Size of the synthesized audio response
    pub audio_bytes: usize,
}

impl InteractionRecord {
    /// Create a record stamped with the current time
    #[must_use]
    pub fn new(
        session_id: &str,
        transport: &str,
        question: &str,
        answer: &str,
        audio_bytes: usize,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            session_id: session_id.to_string(),
            transport: transport.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            audio_bytes,
        }
    }
}

/// Append-only interaction log writer
#[derive(Debug, Clone)]
pub struct Transcript {
    path: PathBuf,
}

impl Transcript {
    /// Create a transcript writer for the given path, creating parent
    /// directories as needed
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        Self { path }
    }

    /// Log file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a record as one JSON line
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or written
    pub fn append(&self, record: &InteractionRecord) -> Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;

        Ok(())
    }

    /// Append a record, logging (not propagating) failures
    pub fn log(&self, record: &InteractionRecord) {
        if let Err(e) = self.append(record) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to append interaction record"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_append_as_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let transcript = Transcript::new(dir.path().join("interactions.log"));

        transcript
            .append(&InteractionRecord::new("s-1", "tcp", "why?", "because", 1024))
            .unwrap();
        transcript
            .append(&InteractionRecord::new("s-1", "tcp", "more?", "sure", 2048))
            .unwrap();

        let content = std::fs::read_to_string(transcript.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: InteractionRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.question, "why?");
        assert_eq!(first.answer, "because");
        assert_eq!(first.audio_bytes, 1024);

        let second: InteractionRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.question, "more?");
    }

    #[test]
    fn missing_parent_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let transcript = Transcript::new(dir.path().join("nested").join("log"));

        transcript.log(&InteractionRecord::new("s-2", "websocket", "q", "a", 0));
        assert!(transcript.path().exists());
    }

    #[test]
    fn record_timestamp_is_rfc3339() {
        let record = InteractionRecord::new("s-3", "tcp", "q", "a", 0);
        assert!(chrono::DateTime::parse_from_rfc3339(&record.timestamp).is_ok());
    }
}

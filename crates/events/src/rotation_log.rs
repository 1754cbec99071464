//! Durable, append-only rotation log.
//!
//! One line per attempt: `[<ISO-8601 timestamp>] SUCCESS|ERROR: <message>`.

use std::io;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use urlist_core::RotationOutcome;

/// Default log location, relative to the working directory.
pub const DEFAULT_LOG_PATH: &str = "logs/jwt-rotation.log";

/// Append-only text log of rotation attempts.
#[derive(Debug, Clone)]
pub struct RotationLog {
    path: PathBuf,
}

impl RotationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Log at `ROTATION_LOG_PATH`, or [`DEFAULT_LOG_PATH`] when unset.
    pub fn from_env() -> Self {
        let path = std::env::var("ROTATION_LOG_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_PATH.to_string());
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render the log line for `outcome`, including the trailing newline.
    pub fn format_line(outcome: &RotationOutcome) -> String {
        format!(
            "[{}] {}: {}\n",
            outcome.timestamp(),
            outcome.status_label(),
            outcome.message()
        )
    }

    /// Append one line for `outcome`.
    ///
    /// If the log's directory does not exist yet it is created and the append
    /// is retried exactly once.
    pub async fn append(&self, outcome: &RotationOutcome) -> io::Result<()> {
        let line = Self::format_line(outcome);

        match self.append_line(&line).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await?;
                }
                self.append_line(&line).await
            }
            other => other,
        }
    }

    async fn append_line(&self, line: &str) -> io::Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.sync_data().await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

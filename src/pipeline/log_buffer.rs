// file: src/pipeline/log_buffer.rs
// description: run-scoped timestamped log buffer mirrored into tracing
// reference: https://docs.rs/tracing

use crate::error::{PipelineError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::path::Path;
use tokio::fs;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn line(&self) -> String {
        format!(
            "[{}] {} {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.level,
            self.message
        )
    }
}

/// Append-only log for one run. Every entry is also emitted through
/// `tracing`; when disabled the buffer keeps nothing.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    enabled: bool,
    entries: Vec<LogEntry>,
}

impl LogBuffer {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn push(&mut self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Debug => debug!("{}", message),
            LogLevel::Info => info!("{}", message),
            LogLevel::Warn => warn!("{}", message),
            LogLevel::Error => error!("{}", message),
        }

        if self.enabled {
            self.entries.push(LogEntry {
                timestamp: Utc::now(),
                level,
                message,
            });
        }
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Debug, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warn, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Error, message);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(LogEntry::line).collect()
    }

    pub fn render(&self) -> String {
        self.lines().join("\n")
    }

    /// Writes one line per entry to `path`, creating parent directories.
    pub async fn export(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        fs::write(path, self.render())
            .await
            .map_err(|source| PipelineError::FileOperation {
                path: path.to_path_buf(),
                source,
            })?;

        debug!("Exported {} log lines to {}", self.len(), path.display());
        Ok(())
    }
}

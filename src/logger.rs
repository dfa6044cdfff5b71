// 📝 Progress Log - Timestamped audit trail of each run
// Every stage reports start, completion, and failure through a ProgressLog
// handed to it by the caller. The file-backed log is append-only and never
// truncated; the in-memory log exists so tests can inspect the messages.

use crate::error::{EtlError, Stage};
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Timestamp format of each progress line
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Logging capability injected into every pipeline stage
pub trait ProgressLog: Send + Sync {
    fn log(&self, message: &str);
}

// ============================================================================
// FILE LOG
// ============================================================================

/// Appends `<timestamp>: <message>` lines to a text file
#[derive(Debug, Clone)]
pub struct FileProgressLog {
    path: PathBuf,
}

impl FileProgressLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileProgressLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)
    }
}

impl ProgressLog for FileProgressLog {
    fn log(&self, message: &str) {
        tracing::info!("{}", message);

        let line = format_line(&Local::now().format(TIMESTAMP_FORMAT).to_string(), message);
        // A broken log file must not take the pipeline down with it
        if let Err(e) = self.append(&line) {
            tracing::warn!("could not write progress log {}: {}", self.path.display(), e);
        }
    }
}

// ============================================================================
// MEMORY LOG
// ============================================================================

/// Keeps messages in memory (without timestamps)
#[derive(Debug, Default)]
pub struct MemoryProgressLog {
    messages: Mutex<Vec<String>>,
}

impl MemoryProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages().iter().any(|m| m.contains(needle))
    }
}

impl ProgressLog for MemoryProgressLog {
    fn log(&self, message: &str) {
        match self.messages.lock() {
            Ok(mut guard) => guard.push(message.to_string()),
            Err(poisoned) => poisoned.into_inner().push(message.to_string()),
        }
    }
}

pub fn format_line(timestamp: &str, message: &str) -> String {
    format!("{}: {}", timestamp, message)
}

// ============================================================================
// STAGE BRACKETING
// ============================================================================

/// Progress messages for one stage
#[derive(Debug, Clone, Copy)]
pub struct StageMessages {
    pub started: &'static str,
    pub completed: &'static str,
    pub failed: &'static str,
}

/// Run `body` between a start and a completion message.
///
/// On failure the cause is logged as `"<failed>: <cause>"` and returned as the
/// stage's `EtlError` kind.
pub fn logged_stage<T>(
    log: &dyn ProgressLog,
    stage: Stage,
    messages: StageMessages,
    body: impl FnOnce() -> anyhow::Result<T>,
) -> Result<T, EtlError> {
    log.log(messages.started);

    match body() {
        Ok(value) => {
            log.log(messages.completed);
            Ok(value)
        }
        Err(e) => {
            log.log(&format!("{}: {:#}", messages.failed, e));
            Err(stage.error(&e))
        }
    }
}

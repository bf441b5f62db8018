// crates/docchain-cli/src/oplog.rs
// ============================================================================
// Module: Operation Log
// Description: Structured JSON-line records of CLI registry operations.
// Purpose: Give operators one log line per command, separate from the audit log.
// Dependencies: docchain-config, docchain-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Each `docchain` invocation emits exactly one [`OperationLogEvent`] through
//! an [`OperationLogSink`]. The registry audit log records verification
//! decisions; this log records what the host was asked to do and how it
//! ended, including failures that never reach the engine.
//!
//! Sinks never fail the command. Write errors are dropped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use docchain_config::LogSinkType;
use docchain_config::LoggingConfig;
use docchain_core::Timestamp;
use serde::Serialize;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Event label carried by every operation log line.
pub const OPERATION_EVENT: &str = "docchain_operation";

/// How a command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationOutcome {
    /// The command completed.
    Succeeded,
    /// Verification ran and the content did not verify.
    NotVerified,
    /// The command failed.
    Failed,
}

/// One operation log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationLogEvent {
    /// Constant event label.
    pub event: &'static str,
    /// Wall time of completion in unix milliseconds.
    pub timestamp_ms: i64,
    /// Command name.
    pub operation: String,
    /// Command outcome.
    pub outcome: OperationOutcome,
    /// Document the command concerned, when known.
    pub document_id: Option<String>,
    /// Error class for failed commands.
    pub error_kind: Option<String>,
    /// Free-form detail such as an error message or verification reason.
    pub detail: Option<String>,
}

impl OperationLogEvent {
    /// Builds an event for a completed command.
    #[must_use]
    pub fn completed(
        timestamp: Timestamp,
        operation: &str,
        outcome: OperationOutcome,
        document_id: Option<String>,
        detail: Option<String>,
    ) -> Self {
        Self {
            event: OPERATION_EVENT,
            timestamp_ms: timestamp.as_unix_millis(),
            operation: operation.to_string(),
            outcome,
            document_id,
            error_kind: None,
            detail,
        }
    }

    /// Builds an event for a failed command.
    #[must_use]
    pub fn failed(
        timestamp: Timestamp,
        operation: &str,
        document_id: Option<String>,
        error_kind: &str,
        detail: String,
    ) -> Self {
        Self {
            event: OPERATION_EVENT,
            timestamp_ms: timestamp.as_unix_millis(),
            operation: operation.to_string(),
            outcome: OperationOutcome::Failed,
            document_id,
            error_kind: Some(error_kind.to_string()),
            detail: Some(detail),
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Destination for operation log lines.
pub trait OperationLogSink: Send + Sync {
    /// Records one event.
    fn record(&self, event: &OperationLogEvent);
}

/// Sink that writes JSON lines to stderr.
pub struct StderrOperationLogSink;

impl OperationLogSink for StderrOperationLogSink {
    fn record(&self, event: &OperationLogEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Sink that appends JSON lines to a file.
pub struct FileOperationLogSink {
    /// File handle used for append-only logging.
    file: Mutex<File>,
}

impl FileOperationLogSink {
    /// Opens the log file in append mode, creating it when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl OperationLogSink for FileOperationLogSink {
    fn record(&self, event: &OperationLogEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Sink that discards events.
pub struct NoopOperationLogSink;

impl OperationLogSink for NoopOperationLogSink {
    fn record(&self, _event: &OperationLogEvent) {}
}

/// Builds the sink selected by `[logging]`.
///
/// # Errors
///
/// Returns an error when the file sink cannot open its path.
pub fn build_sink(config: &LoggingConfig) -> io::Result<Box<dyn OperationLogSink>> {
    match config.sink {
        LogSinkType::Stderr => Ok(Box::new(StderrOperationLogSink)),
        LogSinkType::None => Ok(Box::new(NoopOperationLogSink)),
        LogSinkType::File => {
            let path = config.path.as_deref().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "file logging sink requires path")
            })?;
            Ok(Box::new(FileOperationLogSink::new(path)?))
        }
    }
}

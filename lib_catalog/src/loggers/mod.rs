//! # Loggers
//!
//! Components in this crate never configure process-wide logging. They receive
//! an `Arc<dyn LogSink>` and write to it, so the caller decides where entries go:
//! the colored TTY / rotating-file [`LoggerLocal`], the in-memory
//! [`MemoryLogger`], or the discarding [`NullLogger`].

use serde_json::Value;
use std::sync::{Mutex, PoisonError};

/// Defines the log record and level types.
pub mod logrecord;
/// Implements a local logger with TTY and file output.
pub mod loggerlocal;

pub use loggerlocal::{LoggerLocal, LoggerLocalOptions};
pub use logrecord::{LogLevel, LogRecord, LoggerError};

/// A destination for log entries.
pub trait LogSink: Send + Sync {
    /// Records one entry.
    fn log(&self, level: LogLevel, message: &str, extras: Option<Value>);

    /// Logs at [`LogLevel::Debug`].
    fn debug(&self, message: &str, extras: Option<Value>) {
        self.log(LogLevel::Debug, message, extras);
    }

    /// Logs at [`LogLevel::Info`].
    fn info(&self, message: &str, extras: Option<Value>) {
        self.log(LogLevel::Info, message, extras);
    }

    /// Logs at [`LogLevel::Warn`].
    fn warn(&self, message: &str, extras: Option<Value>) {
        self.log(LogLevel::Warn, message, extras);
    }

    /// Logs at [`LogLevel::Error`].
    fn error(&self, message: &str, extras: Option<Value>) {
        self.log(LogLevel::Error, message, extras);
    }

    /// Logs at [`LogLevel::Fatal`].
    fn fatal(&self, message: &str, extras: Option<Value>) {
        self.log(LogLevel::Fatal, message, extras);
    }
}

/// # Memory Logger
///
/// Keeps every entry in memory. Handy for tests and for callers that want to
/// inspect what a component reported.
#[derive(Debug)]
pub struct MemoryLogger {
    app_name: String,
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogger {
    /// Creates an empty recorder.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            records: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of all entries, oldest first.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages logged at exactly `level`, oldest first.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|r| r.level == level)
            .map(|r| r.message)
            .collect()
    }

    /// Number of entries logged at exactly `level`.
    pub fn count(&self, level: LogLevel) -> usize {
        self.messages(level).len()
    }
}

impl Default for MemoryLogger {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl LogSink for MemoryLogger {
    fn log(&self, level: LogLevel, message: &str, extras: Option<Value>) {
        let record = LogRecord::new(&self.app_name, level, message, extras);
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl LogSink for NullLogger {
    fn log(&self, _level: LogLevel, _message: &str, _extras: Option<Value>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_logger_records_in_order() {
        let logger = MemoryLogger::new("unit");
        logger.error("first", None);
        logger.info("second", Some(json!({"attempt": 1})));
        logger.error("third", None);

        assert_eq!(logger.count(LogLevel::Error), 2);
        assert_eq!(logger.messages(LogLevel::Info), vec!["second".to_string()]);

        let records = logger.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].app, "unit");
        assert_eq!(records[1].tags, Some(json!({"attempt": 1})));
    }
}

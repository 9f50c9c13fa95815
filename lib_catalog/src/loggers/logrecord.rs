use chrono::{Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while configuring a logger.
#[derive(Debug, Error)]
pub enum LoggerError {
    /// A level name that matches no [`LogLevel`].
    #[error("Unknown log level: {0}")]
    UnknownLevel(String),

    /// The log directory could not be created or scanned.
    #[error("Cannot prepare log directory {path}: {source}")]
    LogDir {
        /// The directory in question.
        path: String,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// # Log Level
///
/// Severity of a log entry. Levels are ordered, `Silly` being the most verbose
/// and `Fatal` the most severe, so a minimum level can be expressed with `>=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Very fine-grained output, rarely needed.
    Silly = 0,
    /// Execution-flow tracing.
    Trace = 1,
    /// Internal details useful while debugging.
    Debug = 2,
    /// General progress.
    Info = 3,
    /// Unusual but recoverable events.
    Warn = 4,
    /// A failed operation.
    Error = 5,
    /// A failure the caller is not expected to recover from.
    Fatal = 6,
}

impl LogLevel {
    /// Every level, least severe first.
    pub const ALL: [LogLevel; 7] = [
        LogLevel::Silly,
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    /// Lowercase name of the level.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Silly => "silly",
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        }
    }

    /// All levels at least as severe as `self`.
    pub fn and_above(self) -> Vec<LogLevel> {
        LogLevel::ALL.into_iter().filter(|l| *l >= self).collect()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "silly" => Ok(LogLevel::Silly),
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "fatal" | "critical" => Ok(LogLevel::Fatal),
            other => Err(LoggerError::UnknownLevel(other.to_string())),
        }
    }
}

/// # Log Record
///
/// A single log entry as handed to a sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    /// Name of the application or component that produced the entry.
    pub app: String,
    /// Severity.
    pub level: LogLevel,
    /// The message text.
    pub message: String,
    /// Optional structured extras.
    pub tags: Option<Value>,
    /// Local timestamp in RFC 3339 with milliseconds.
    pub rfc3339: String,
}

impl LogRecord {
    /// Builds a record stamped with the current local time.
    pub fn new(app: &str, level: LogLevel, message: &str, tags: Option<Value>) -> Self {
        Self {
            app: app.to_string(),
            level,
            message: message.to_string(),
            tags,
            rfc3339: Local::now().to_rfc3339_opts(SecondsFormat::Millis, false),
        }
    }

    /// Plain-text rendering used for log files: one header line, plus one line of tags if any.
    pub fn file_lines(&self) -> String {
        let mut out = format!(
            "{} [{}] {} {}\n",
            self.rfc3339,
            self.app,
            self.level.as_str().to_uppercase(),
            self.message
        );
        if let Some(tags) = &self.tags {
            if let Ok(tags_str) = serde_json::to_string(tags) {
                out.push_str(&tags_str);
                out.push('\n');
            }
        }
        out
    }
}

use super::logrecord::{LogLevel, LogRecord, LoggerError};
use super::LogSink;
use chrono::Local;
use colored::*;
use glob::glob;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
/// # Logger Local Options
///
/// Controls where and for which levels `LoggerLocal` writes.
pub struct LoggerLocalOptions {
    /// Levels printed to the terminal (stderr). `None` disables terminal output.
    pub use_tty: Option<Vec<LogLevel>>,
    /// Levels appended to the log file. `None` disables file output.
    pub use_file: Option<Vec<LogLevel>>,
    /// Directory for log files. Defaults to the current directory.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggerLocalOptions {
    /// Terminal output for every level, no file.
    fn default() -> Self {
        Self {
            use_tty: Some(LogLevel::ALL.to_vec()),
            use_file: None,
            log_dir: None,
        }
    }
}

impl LoggerLocalOptions {
    /// Terminal and, if `log_dir` is given, file output for `min_level` and above.
    pub fn from_min_level(min_level: LogLevel, log_dir: Option<PathBuf>) -> Self {
        let levels = min_level.and_above();
        Self {
            use_tty: Some(levels.clone()),
            use_file: log_dir.as_ref().map(|_| levels),
            log_dir,
        }
    }
}

/// # Logger Local
///
/// A synchronous logger writing colored lines to the terminal and plain lines to
/// a per-run log file named `{app_name}-{YYYYmmdd_HHMMSS}.log`.
pub struct LoggerLocal {
    /// The name of the application associated with this logger instance.
    app_name: String,
    /// Configuration options determining logging behavior.
    options: LoggerLocalOptions,
    /// The path to the currently active log file, if file logging is enabled.
    current_log_file: Option<PathBuf>,
    /// Serializes appends to the log file.
    file_lock: Mutex<()>,
}

impl LoggerLocal {
    /// Keeps only the newest `{app_name}-*.log` file in `log_dir` and deletes the rest.
    fn rotate_logs(app_name: &str, log_dir: &Path) {
        let pattern = format!("{}/{}-*.log", log_dir.display(), app_name);
        let entries = match glob(&pattern) {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!("Invalid log rotation pattern {}: {}", pattern, e);
                return;
            }
        };

        let mut log_files: Vec<PathBuf> = entries.flatten().collect();

        // Timestamped names sort chronologically; newest first.
        log_files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));

        for old_file in log_files.iter().skip(1) {
            if let Err(e) = std::fs::remove_file(old_file) {
                eprintln!("Error deleting old log file {}: {}", old_file.display(), e);
            }
        }
    }

    /// Creates a new `LoggerLocal`.
    ///
    /// When file logging is enabled the log directory is created if needed,
    /// older log files of the same application are rotated away, and a fresh
    /// timestamped file name is chosen. The file itself is created on first write.
    ///
    /// # Arguments
    /// * `app_name` - Name used in every line and in the log file name.
    /// * `options` - Output configuration; `None` uses [`LoggerLocalOptions::default`].
    pub fn new(app_name: impl Into<String>, options: Option<LoggerLocalOptions>) -> Result<Self, LoggerError> {
        let app_name = app_name.into();
        let options = options.unwrap_or_default();

        let current_log_file = if options.use_file.is_some() {
            let log_base_dir = options.log_dir.clone().unwrap_or_else(|| PathBuf::from("."));

            std::fs::create_dir_all(&log_base_dir).map_err(|source| LoggerError::LogDir {
                path: log_base_dir.display().to_string(),
                source,
            })?;

            LoggerLocal::rotate_logs(&app_name, &log_base_dir);

            let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
            Some(log_base_dir.join(format!("{}-{}.log", app_name, timestamp)))
        } else {
            None
        };

        Ok(Self {
            app_name,
            options,
            current_log_file,
            file_lock: Mutex::new(()),
        })
    }

    /// Path of the file this logger appends to, if file logging is enabled.
    pub fn current_log_file(&self) -> Option<&Path> {
        self.current_log_file.as_deref()
    }

    fn write_tty(&self, record: &LogRecord) {
        let ts = record.rfc3339.as_str().truecolor(128, 128, 128);
        let app_name_colored = format!("[{}]", self.app_name).truecolor(128, 128, 128);

        let message = record.message.as_str();
        let colored_message = match record.level {
            LogLevel::Fatal => message.bright_white().on_bright_red(),
            LogLevel::Error => message.bright_red(),
            LogLevel::Warn => message.bright_yellow(),
            LogLevel::Info => message.bright_green(),
            LogLevel::Debug => message.bright_white(),
            LogLevel::Trace => message.bright_cyan(),
            LogLevel::Silly => message.blue(),
        };

        eprintln!("{}{} {}", ts, app_name_colored, colored_message);
        if let Some(tags) = &record.tags {
            if let Ok(tags_str) = serde_json::to_string(tags) {
                eprintln!("{}{} {}", ts, app_name_colored, tags_str.truecolor(128, 128, 128));
            }
        }
    }

    fn write_file(&self, record: &LogRecord) {
        let Some(log_file_path) = &self.current_log_file else {
            return;
        };

        let _guard = self.file_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file_path)
            .and_then(|mut file| file.write_all(record.file_lines().as_bytes()));

        if let Err(e) = result {
            eprintln!("Error writing log file {}: {}", log_file_path.display(), e);
        }
    }
}

impl LogSink for LoggerLocal {
    fn log(&self, level: LogLevel, message: &str, extras: Option<Value>) {
        let record = LogRecord::new(&self.app_name, level, message, extras);

        if let Some(tty_levels) = &self.options.use_tty {
            if tty_levels.contains(&level) {
                self.write_tty(&record);
            }
        }

        if let Some(file_levels) = &self.options.use_file {
            if file_levels.contains(&level) {
                self.write_file(&record);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_output_honors_levels() {
        let dir = tempfile::tempdir().unwrap();
        let options = LoggerLocalOptions {
            use_tty: None,
            use_file: Some(vec![LogLevel::Error]),
            log_dir: Some(dir.path().to_path_buf()),
        };
        let logger = LoggerLocal::new("filetest", Some(options)).unwrap();

        logger.info("not written", None);
        logger.error("written", Some(json!({"endpoint": "http://x"})));

        let path = logger.current_log_file().unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(!content.contains("not written"));
        assert!(content.contains("[filetest] ERROR written"));
        assert!(content.contains(r#"{"endpoint":"http://x"}"#));
    }

    #[test]
    fn rotation_keeps_only_newest_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        for stamp in ["20240101_000000", "20240102_000000", "20240103_000000"] {
            std::fs::write(dir.path().join(format!("rot-{}.log", stamp)), "old").unwrap();
        }
        std::fs::write(dir.path().join("other-20240101_000000.log"), "keep").unwrap();

        let options = LoggerLocalOptions::from_min_level(LogLevel::Info, Some(dir.path().to_path_buf()));
        let _logger = LoggerLocal::new("rot", Some(options)).unwrap();

        assert!(dir.path().join("rot-20240103_000000.log").exists());
        assert!(!dir.path().join("rot-20240102_000000.log").exists());
        assert!(!dir.path().join("rot-20240101_000000.log").exists());
        assert!(dir.path().join("other-20240101_000000.log").exists());
    }

    #[test]
    fn no_file_without_file_levels() {
        let logger = LoggerLocal::new("ttyonly", None).unwrap();
        assert!(logger.current_log_file().is_none());
    }
}

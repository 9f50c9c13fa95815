use clap::{Parser, ValueEnum};
use lib_catalog::loggers::{LogLevel, LoggerError, LoggerLocalOptions};
use lib_catalog::DEFAULT_MAX_RETRIES;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_VQ_URL: &str = "https://ko3vcqvszf.execute-api.eu-west-1.amazonaws.com/vq";
pub const DEFAULT_TQ_URL: &str = "https://ko3vcqvszf.execute-api.eu-west-1.amazonaws.com/tq";
pub const DEFAULT_CONFIG_FILE: &str = "rights_report.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse config file {path}: {source}")]
    ParseFile {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing required setting `{name}` (use --{flag} or {env})")]
    Missing {
        name: &'static str,
        flag: &'static str,
        env: &'static str,
    },

    #[error(transparent)]
    LogLevel(#[from] LoggerError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Deserialize, Debug, Clone, Default)]
#[clap(name = "rights-report", about = "Titles playable on a device, their active licensing windows and level3 HD manifests", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "CATALOG_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "CATALOG_VQ_URL", help = "Rights (vq) endpoint URL.")]
    pub vq_url: Option<String>,

    #[clap(long, env = "CATALOG_TQ_URL", help = "Assets (tq) endpoint URL.")]
    pub tq_url: Option<String>,

    #[clap(long, env = "CATALOG_USERNAME", help = "Basic-auth user name.")]
    pub username: Option<String>,

    #[clap(long, env = "CATALOG_PASSWORD", hide_env_values = true, help = "Basic-auth password.")]
    pub password: Option<String>,

    #[clap(long, env = "CATALOG_DEVICE_PLATFORM", help = "Device platform to list titles for.")]
    pub device_platform: Option<String>,

    #[clap(long, env = "CATALOG_MAX_RETRIES", help = "Attempts per endpoint before giving up.")]
    pub max_retries: Option<u32>,

    #[clap(long, env = "CATALOG_BACKOFF_BASE_MS", help = "Backoff unit in milliseconds; waits are unit * 2^attempt.")]
    pub backoff_base_ms: Option<u64>,

    #[clap(long, env = "CATALOG_LOG_DIR", help = "Directory for log files. No file logging when unset.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "CATALOG_LOG_LEVEL", help = "Minimum log level (silly, trace, debug, info, warn, error, fatal).")]
    pub log_level: Option<String>,

    #[clap(long, env = "CATALOG_OUTPUT", value_enum, help = "Report format.")]
    pub output: Option<OutputFormat>,
}

impl Config {
    fn defaults() -> Config {
        Config {
            vq_url: Some(DEFAULT_VQ_URL.to_string()),
            tq_url: Some(DEFAULT_TQ_URL.to_string()),
            device_platform: Some("ROKU".to_string()),
            max_retries: Some(DEFAULT_MAX_RETRIES),
            backoff_base_ms: Some(1000),
            log_level: Some("info".to_string()),
            output: Some(OutputFormat::Text),
            ..Default::default()
        }
    }

    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            config_path: other.config_path.or(self.config_path),
            vq_url: other.vq_url.or(self.vq_url),
            tq_url: other.tq_url.or(self.tq_url),
            username: other.username.or(self.username),
            password: other.password.or(self.password),
            device_platform: other.device_platform.or(self.device_platform),
            max_retries: other.max_retries.or(self.max_retries),
            backoff_base_ms: other.backoff_base_ms.or(self.backoff_base_ms),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            output: other.output.or(self.output),
        }
    }

    fn into_settings(self) -> Result<Settings, ConfigError> {
        fn required(
            value: Option<String>,
            name: &'static str,
            flag: &'static str,
            env: &'static str,
        ) -> Result<String, ConfigError> {
            value
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing { name, flag, env })
        }

        let log_level = self.log_level.as_deref().unwrap_or("info").parse::<LogLevel>()?;

        Ok(Settings {
            vq_url: required(self.vq_url, "vqUrl", "vq-url", "CATALOG_VQ_URL")?,
            tq_url: required(self.tq_url, "tqUrl", "tq-url", "CATALOG_TQ_URL")?,
            username: required(self.username, "username", "username", "CATALOG_USERNAME")?,
            password: required(self.password, "password", "password", "CATALOG_PASSWORD")?,
            device_platform: required(self.device_platform, "devicePlatform", "device-platform", "CATALOG_DEVICE_PLATFORM")?,
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            backoff_base: Duration::from_millis(self.backoff_base_ms.unwrap_or(1000)),
            log_dir: self.log_dir,
            log_level,
            output: self.output.unwrap_or_default(),
        })
    }
}

/// Fully resolved settings for one run.
#[derive(Clone, PartialEq)]
pub struct Settings {
    pub vq_url: String,
    pub tq_url: String,
    pub username: String,
    pub password: String,
    pub device_platform: String,
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub log_dir: Option<PathBuf>,
    pub log_level: LogLevel,
    pub output: OutputFormat,
}

impl Settings {
    pub fn logger_options(&self) -> LoggerLocalOptions {
        LoggerLocalOptions::from_min_level(self.log_level, self.log_dir.clone())
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("vq_url", &self.vq_url)
            .field("tq_url", &self.tq_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("device_platform", &self.device_platform)
            .field("max_retries", &self.max_retries)
            .field("backoff_base", &self.backoff_base)
            .field("log_dir", &self.log_dir)
            .field("log_level", &self.log_level)
            .field("output", &self.output)
            .finish()
    }
}

pub fn read_config_file(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str::<Config>(&content).map_err(|source| ConfigError::ParseFile {
        path: path.display().to_string(),
        source,
    })
}

/// Layers defaults, the JSON config file and the command line (which already
/// carries environment values) into final settings.
///
/// An explicitly given config file must exist; the default one is optional.
pub fn resolve(cli: Config) -> Result<Settings, ConfigError> {
    let mut current_config = Config::defaults();

    let (config_file_path, explicit) = match &cli.config_path {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    if explicit || config_file_path.exists() {
        current_config = current_config.merge(read_config_file(&config_file_path)?);
    }

    current_config.merge(cli).into_settings()
}

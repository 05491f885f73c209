//! Configuration types.
//!
//! This module defines the library configuration struct, its validation, and the
//! enums shared with command-line parsing.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use thiserror::Error;

use crate::config::constants::{
    API_KEY_ENV, DEFAULT_BIND_ADDR, DEFAULT_UPSTREAM_URL, HTTP_TIMEOUT_SECS, MAX_UPLOAD_BYTES,
};
use crate::models::EngineAllowList;
use crate::poll::PollPolicy;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// A configuration value that failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid `{field}`: {message}")]
pub struct ConfigValidationError {
    /// Name of the offending field
    pub field: &'static str,
    /// What is wrong and how to fix it
    pub message: String,
}

impl ConfigValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// The upstream API key.
///
/// `Debug` never prints the secret, so a `Config` can be logged safely.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a key value.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Reads the key from `VT_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigValidationError` when the variable is unset, not valid
    /// unicode, or blank. There is no fallback value.
    pub fn from_env() -> Result<Self, ConfigValidationError> {
        match std::env::var(API_KEY_ENV) {
            Ok(value) if !value.trim().is_empty() => Ok(Self(value.trim().to_string())),
            Ok(_) => Err(ConfigValidationError::new(
                "api_key",
                format!("{} is set but empty", API_KEY_ENV),
            )),
            Err(_) => Err(ConfigValidationError::new(
                "api_key",
                format!(
                    "{} is not set; export it or add it to a .env file",
                    API_KEY_ENV
                ),
            )),
        }
    }

    /// The raw key, for building request headers.
    pub fn expose(&self) -> &str {
        &self.0
    }

    fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_blank() {
            f.write_str("ApiKey(<unset>)")
        } else {
            f.write_str("ApiKey(<redacted>)")
        }
    }
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use scan_relay::config::ApiKey;
/// use scan_relay::Config;
///
/// let config = Config {
///     api_key: ApiKey::new("my-key"),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the relay HTTP server listens on
    pub bind_addr: SocketAddr,

    /// Base URL of the upstream scanning API
    pub upstream_url: String,

    /// Upstream API key
    pub api_key: ApiKey,

    /// Engines whose verdicts are surfaced
    pub engines: EngineAllowList,

    /// How long and how often to poll for a completed analysis
    pub poll: PollPolicy,

    /// Per-request timeout for upstream calls in seconds
    pub timeout_seconds: u64,

    /// Directory for staged uploads
    pub staging_dir: PathBuf,

    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8000))),
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            api_key: ApiKey::default(),
            engines: EngineAllowList::default(),
            poll: PollPolicy::default(),
            timeout_seconds: HTTP_TIMEOUT_SECS,
            staging_dir: std::env::temp_dir(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    /// Checks the configuration before any resource is created.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.api_key.is_blank() {
            return Err(ConfigValidationError::new(
                "api_key",
                format!("an API key is required (set {})", API_KEY_ENV),
            ));
        }

        match url::Url::parse(&self.upstream_url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => {
                return Err(ConfigValidationError::new(
                    "upstream_url",
                    format!("scheme must be http or https, got {}", parsed.scheme()),
                ));
            }
            Err(e) => {
                return Err(ConfigValidationError::new(
                    "upstream_url",
                    format!("not a valid URL ({}): {}", e, self.upstream_url),
                ));
            }
        }

        if self.engines.is_empty() {
            return Err(ConfigValidationError::new(
                "engines",
                "at least one engine name is required",
            ));
        }

        if self.poll.max_attempts == 0 {
            return Err(ConfigValidationError::new(
                "poll_max_attempts",
                "must be greater than 0",
            ));
        }

        if self.poll.interval == Duration::ZERO {
            return Err(ConfigValidationError::new(
                "poll_interval",
                "must be greater than 0",
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(ConfigValidationError::new(
                "timeout_seconds",
                "must be greater than 0",
            ));
        }

        if self.max_upload_bytes == 0 {
            return Err(ConfigValidationError::new(
                "max_upload_bytes",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            api_key: ApiKey::new("test-key"),
            ..Default::default()
        }
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_config_default_requires_api_key() {
        let err = Config::default().validate().unwrap_err();
        assert_eq!(err.field, "api_key");
        assert!(err.message.contains(API_KEY_ENV));
    }

    #[test]
    fn test_config_valid() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_config_rejects_blank_api_key() {
        let config = Config {
            api_key: ApiKey::new("   "),
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().field, "api_key");
    }

    #[test]
    fn test_config_rejects_bad_upstream_url() {
        let mut config = valid_config();
        config.upstream_url = "not a url".to_string();
        assert_eq!(config.validate().unwrap_err().field, "upstream_url");

        config.upstream_url = "ftp://example.com/api".to_string();
        let err = config.validate().unwrap_err();
        assert_eq!(err.field, "upstream_url");
        assert!(err.message.contains("ftp"));
    }

    #[test]
    fn test_config_rejects_empty_engines() {
        let mut config = valid_config();
        config.engines = EngineAllowList::new(Vec::<String>::new());
        assert_eq!(config.validate().unwrap_err().field, "engines");
    }

    #[test]
    fn test_config_rejects_zero_poll_budget() {
        let mut config = valid_config();
        config.poll.max_attempts = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.field, "poll_max_attempts");
        assert!(err.message.contains("greater than 0"));
    }

    #[test]
    fn test_config_rejects_zero_timeout() {
        let mut config = valid_config();
        config.timeout_seconds = 0;
        assert_eq!(config.validate().unwrap_err().field, "timeout_seconds");
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("super-secret");
        let printed = format!("{:?}", key);
        assert!(!printed.contains("super-secret"));
        assert_eq!(printed, "ApiKey(<redacted>)");

        let config = Config {
            api_key: key,
            ..Default::default()
        };
        assert!(!format!("{:?}", config).contains("super-secret"));
    }

    #[test]
    fn test_api_key_debug_unset() {
        assert_eq!(format!("{:?}", ApiKey::default()), "ApiKey(<unset>)");
    }
}

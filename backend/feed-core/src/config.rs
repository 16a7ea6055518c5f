/// Configuration management for the feed core
///
/// Loads configuration from environment variables. The binary loads a
/// `.env` file first when present.
use resilience::RetryConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Failed to parse {key}='{value}': {message}")]
    Invalid {
        key: String,
        value: String,
        message: String,
    },

    #[error("{0}")]
    Missing(String),
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Backing store configuration
    pub store: StoreConfig,
    /// Content rules
    pub content: ContentConfig,
    /// Logged-in user for command-line use
    pub session_user: Option<String>,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Redis,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "redis" => Ok(StoreBackend::Redis),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

/// Backing store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Redis URL
    pub redis_url: String,
    /// Per-command timeout for Redis
    pub timeout_ms: u64,
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Values supplied on the command line, applied over the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub backend: Option<StoreBackend>,
    pub session_user: Option<String>,
}

/// Content rules and write behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Longest accepted post/comment text, in characters
    pub max_text_chars: usize,
    /// Feed size used when a caller doesn't give one
    pub default_page_size: usize,
    /// Retries for a downvote that hits a write conflict
    pub downvote_retry_attempts: u32,
    /// Initial backoff between conflict retries
    pub downvote_retry_backoff_ms: u64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            max_text_chars: default_max_text_chars(),
            default_page_size: default_page_size(),
            downvote_retry_attempts: default_downvote_retry_attempts(),
            downvote_retry_backoff_ms: default_downvote_retry_backoff_ms(),
        }
    }
}

impl ContentConfig {
    /// Retry policy for downvote conflicts
    pub fn downvote_retry(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.downvote_retry_attempts,
            initial_backoff: Duration::from_millis(self.downvote_retry_backoff_ms),
            max_backoff: Duration::from_millis(self.downvote_retry_backoff_ms.saturating_mul(20)),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

// Default values
fn default_max_text_chars() -> usize {
    500
}

fn default_page_size() -> usize {
    20
}

fn default_downvote_retry_attempts() -> u32 {
    5
}

fn default_downvote_retry_backoff_ms() -> u64 {
    10
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(ConfigOverrides::default())
    }

    /// Load configuration from environment variables, with `overrides` taking
    /// precedence. Checks run against the overridden values.
    pub fn from_env_with(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let backend = match (overrides.backend, std::env::var("FEED_STORE_BACKEND")) {
            (Some(backend), _) => backend,
            (None, Ok(value)) => {
                value.parse::<StoreBackend>().map_err(|message| ConfigError::Invalid {
                    key: "FEED_STORE_BACKEND".to_string(),
                    value,
                    message,
                })?
            }
            (None, Err(_)) => StoreBackend::Memory,
        };

        let redis_url = match std::env::var("REDIS_URL") {
            Ok(url) => url,
            Err(_)
                if backend == StoreBackend::Redis
                    && app_env.eq_ignore_ascii_case("production") =>
            {
                return Err(ConfigError::Missing(
                    "REDIS_URL must be set in production".to_string(),
                ))
            }
            Err(_) => "redis://localhost:6379".to_string(),
        };

        Ok(Config {
            app: AppConfig { env: app_env },
            store: StoreConfig {
                backend,
                redis_url,
                timeout_ms: parse_env_or_default("FEED_STORE_TIMEOUT_MS", 2_000)?,
            },
            content: ContentConfig {
                max_text_chars: parse_env_or_default(
                    "FEED_MAX_TEXT_CHARS",
                    default_max_text_chars(),
                )?,
                default_page_size: parse_env_or_default(
                    "FEED_DEFAULT_PAGE_SIZE",
                    default_page_size(),
                )?,
                downvote_retry_attempts: parse_env_or_default(
                    "FEED_DOWNVOTE_RETRY_ATTEMPTS",
                    default_downvote_retry_attempts(),
                )?,
                downvote_retry_backoff_ms: parse_env_or_default(
                    "FEED_DOWNVOTE_RETRY_BACKOFF_MS",
                    default_downvote_retry_backoff_ms(),
                )?,
            },
            session_user: overrides
                .session_user
                .or_else(|| std::env::var("FEED_SESSION_USER").ok())
                .filter(|s| !s.trim().is_empty()),
        })
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key: key.to_string(),
            value: val.clone(),
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

//! Environment-driven configuration.
//!
//! Settings are read from environment variables at the composition root
//! and passed down as plain values; nothing below this module reads the
//! environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `AWS_REGION` | `us-east-1` |
//! | `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` | unset (ambient credentials) |
//! | `SQS_ENDPOINT_URL` | unset (provider default; e.g. `http://localhost:4566` for LocalStack) |
//! | `SQS_REQUEST_QUEUE_URL` | unset (consumer disabled) |
//! | `SQS_MAX_MESSAGES` | `10`, clamped to 1–10 |
//! | `SQS_WAIT_TIME_SECONDS` | `20`, clamped to 0–20 |
//! | `SQS_ERROR_BACKOFF_MS` | `5000` |
//! | `ROLE_ID_ADMIN` / `ROLE_ID_PROFESSIONAL` / `ROLE_ID_CLIENT` | `1` / `2` / `3` |

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Upper bound on messages per receive.
pub const MAX_MESSAGES_LIMIT: usize = 10;
/// Upper bound on the long-poll wait.
pub const MAX_WAIT_TIME: Duration = Duration::from_secs(20);

/// Error reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Settings the consumer loop runs with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsumerConfig {
    /// Address of the shared request queue
    pub queue: String,
    /// Messages requested per poll, 1–10
    pub max_messages: usize,
    /// Long-poll wait per receive
    pub wait_time: Duration,
    /// Pause after a failed receive
    pub error_backoff: Duration,
}

impl ConsumerConfig {
    /// Defaults: 10 messages, 20 s wait, 5 s back-off.
    pub fn new(queue: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            max_messages: MAX_MESSAGES_LIMIT,
            wait_time: MAX_WAIT_TIME,
            error_backoff: Duration::from_secs(5),
        }
    }

    /// Clamped to 1–10.
    pub fn with_max_messages(mut self, max_messages: usize) -> Self {
        self.max_messages = max_messages.clamp(1, MAX_MESSAGES_LIMIT);
        self
    }

    /// Clamped to at most 20 s.
    pub fn with_wait_time(mut self, wait_time: Duration) -> Self {
        self.wait_time = wait_time.min(MAX_WAIT_TIME);
        self
    }

    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }
}

/// Static credentials for the queue provider.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Queue provider and consumer settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueSettings {
    pub region: String,
    /// Only set when both key id and secret are present
    pub credentials: Option<Credentials>,
    /// Custom endpoint, e.g. a local emulator
    pub endpoint_url: Option<String>,
    /// Queue receiving profile requests from other services
    pub request_queue_url: Option<String>,
    pub max_messages: usize,
    pub wait_time: Duration,
    pub error_backoff: Duration,
}

impl QueueSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let credentials = match (
            non_empty("AWS_ACCESS_KEY_ID"),
            non_empty("AWS_SECRET_ACCESS_KEY"),
        ) {
            (Some(access_key_id), Some(secret_access_key)) => Some(Credentials {
                access_key_id,
                secret_access_key,
            }),
            _ => None,
        };

        let max_messages: usize = parse_or(&lookup, "SQS_MAX_MESSAGES", MAX_MESSAGES_LIMIT)?;
        let wait_seconds: u64 =
            parse_or(&lookup, "SQS_WAIT_TIME_SECONDS", MAX_WAIT_TIME.as_secs())?;
        let backoff_ms: u64 = parse_or(&lookup, "SQS_ERROR_BACKOFF_MS", 5_000)?;

        Ok(Self {
            region: non_empty("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            credentials,
            endpoint_url: non_empty("SQS_ENDPOINT_URL"),
            request_queue_url: non_empty("SQS_REQUEST_QUEUE_URL"),
            max_messages: max_messages.clamp(1, MAX_MESSAGES_LIMIT),
            wait_time: Duration::from_secs(wait_seconds).min(MAX_WAIT_TIME),
            error_backoff: Duration::from_millis(backoff_ms),
        })
    }

    /// Consumer settings, or `None` when no request queue is configured.
    pub fn consumer_config(&self) -> Option<ConsumerConfig> {
        let queue = self.request_queue_url.as_ref()?;
        Some(
            ConsumerConfig::new(queue.clone())
                .with_max_messages(self.max_messages)
                .with_wait_time(self.wait_time)
                .with_error_backoff(self.error_backoff),
        )
    }
}

/// Role ids shared with the roles service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoleIds {
    pub admin: i64,
    pub professional: i64,
    pub client: i64,
}

impl Default for RoleIds {
    fn default() -> Self {
        Self {
            admin: 1,
            professional: 2,
            client: 3,
        }
    }
}

impl RoleIds {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            admin: parse_or(&lookup, "ROLE_ID_ADMIN", defaults.admin)?,
            professional: parse_or(&lookup, "ROLE_ID_PROFESSIONAL", defaults.professional)?,
            client: parse_or(&lookup, "ROLE_ID_CLIENT", defaults.client)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

//! Configuration management for the task manager.
//!
//! Configuration can be set via environment variables:
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.
//! - `GEMINI_API_KEY` - Optional. Enables AI enrichment of new tasks.
//! - `GEMINI_MODEL` - Optional. Enrichment model. Defaults to `gemini-2.0-flash`.
//! - `ENRICHMENT_TIMEOUT_SECS` - Optional. Per-request deadline for the
//!   enrichment call. Defaults to `10`.
//! - `EVENT_PROXY_URL` - Optional. Base URL of the Kafka/Redpanda REST proxy.
//!   When unset, events are not published.
//! - `EVENT_TOPIC` - Optional. Topic for task events. Defaults to `tasks-topic`.
//! - `EVENT_FLUSH_TIMEOUT_SECS` - Optional. Upper bound for draining pending
//!   events on shutdown. Defaults to `10`.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// AI enrichment configuration.
#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    /// Gemini API key; enrichment is skipped entirely when absent
    pub api_key: Option<String>,

    /// Model identifier for the `generateContent` endpoint
    pub model: String,

    /// Deadline for a single enrichment request
    pub timeout: Duration,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl EnrichmentConfig {
    /// Check if enrichment is enabled (API key configured)
    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Event bus configuration.
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// REST proxy base URL; events are dropped with a log line when absent
    pub proxy_url: Option<String>,

    /// Topic task lifecycle events are published to
    pub topic: String,

    /// Upper bound for the shutdown flush
    pub flush_timeout: Duration,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            proxy_url: None,
            topic: "tasks-topic".to_string(),
            flush_timeout: Duration::from_secs(10),
        }
    }
}

impl EventBusConfig {
    /// Check if event publishing is enabled (proxy URL configured)
    pub fn is_enabled(&self) -> bool {
        self.proxy_url.is_some()
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// AI enrichment configuration
    pub enrichment: EnrichmentConfig,

    /// Event bus configuration
    pub events: EventBusConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Both external collaborators are optional: an unset `GEMINI_API_KEY`
    /// disables enrichment, an unset `EVENT_PROXY_URL` disables event
    /// publishing. Neither is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let enrichment = EnrichmentConfig {
            api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|v| !v.is_empty()),
            model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
            timeout: Duration::from_secs(env_secs("ENRICHMENT_TIMEOUT_SECS", 10)?),
        };

        let events = EventBusConfig {
            proxy_url: std::env::var("EVENT_PROXY_URL")
                .ok()
                .filter(|v| !v.is_empty()),
            topic: std::env::var("EVENT_TOPIC").unwrap_or_else(|_| "tasks-topic".to_string()),
            flush_timeout: Duration::from_secs(env_secs("EVENT_FLUSH_TIMEOUT_SECS", 10)?),
        };

        Ok(Self {
            host,
            port,
            enrichment,
            events,
        })
    }

    /// Create a config with both collaborators disabled (useful for testing).
    pub fn new(host: String, port: u16) -> Self {
        Self {
            host,
            port,
            enrichment: EnrichmentConfig::default(),
            events: EventBusConfig::default(),
        }
    }
}

fn env_secs(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(value) => value
            .parse()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
    }
}

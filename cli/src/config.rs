//! Run configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use tally_client::PAGE_SIZE;
use tally_index::DEFAULT_TOP_K;
use tally_ingest::{IngestOptions, RetryPolicy};
use tally_utils::LogFormat;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for one tally run.
///
/// Every field has a default, so an empty file (or no file) is a valid
/// configuration targeting the Aave space on the public Snapshot hub.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TallyConfig {
    /// GraphQL endpoint of the registry.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Space whose closed proposals are analysed.
    #[serde(default = "default_space")]
    pub space: String,

    /// Address for the single-address rate report.
    #[serde(default = "default_target_address")]
    pub target_address: String,

    /// Leaderboard length.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Rows per registry page (1..=1000).
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Count an address at most once per proposal.
    #[serde(default)]
    pub dedupe_votes: bool,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub retry: RetryConfig,
}

/// `[retry]` table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per proposal including the first; 0 retries forever.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_endpoint() -> String {
    "https://hub.snapshot.org/graphql".to_string()
}

fn default_space() -> String {
    "aave.eth".to_string()
}

fn default_target_address() -> String {
    "0x070341aA5Ed571f0FB2c4a5641409B1A46b4961b".to_string()
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_page_size() -> u32 {
    PAGE_SIZE
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_attempts() -> u32 {
    tally_ingest::retry::DEFAULT_MAX_ATTEMPTS
}

fn default_initial_delay_secs() -> u64 {
    tally_ingest::retry::DEFAULT_RETRY_DELAY.as_secs()
}

fn default_backoff_factor() -> f64 {
    1.0
}

fn default_max_delay_secs() -> u64 {
    tally_ingest::retry::DEFAULT_MAX_DELAY.as_secs()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl TallyConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values the run cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint must not be empty".into()));
        }
        if self.space.trim().is_empty() {
            return Err(ConfigError::Invalid("space must not be empty".into()));
        }
        if !(1..=PAGE_SIZE).contains(&self.page_size) {
            return Err(ConfigError::Invalid(format!(
                "page_size must be between 1 and {PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        if !self.retry.backoff_factor.is_finite() || self.retry.backoff_factor < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "retry.backoff_factor must be a finite number >= 1.0, got {}",
                self.retry.backoff_factor
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            initial_delay: Duration::from_secs(self.retry.initial_delay_secs),
            backoff_factor: self.retry.backoff_factor,
            max_delay: Duration::from_secs(self.retry.max_delay_secs),
        }
    }

    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            retry: self.retry_policy(),
            dedupe_votes: self.dedupe_votes,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_secs: default_initial_delay_secs(),
            backoff_factor: default_backoff_factor(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            space: default_space(),
            target_address: default_target_address(),
            top_k: default_top_k(),
            page_size: default_page_size(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            dedupe_votes: false,
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            retry: RetryConfig::default(),
        }
    }
}

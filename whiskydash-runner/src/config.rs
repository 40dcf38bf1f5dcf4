//! Serializable loader configuration.
//!
//! Every field has a default, so an empty TOML file (or none at all) gives the
//! stock settings: the public WhiskyHunter API, top 50 distilleries, 100 ms
//! between series requests.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use whiskydash_core::data::{
    http::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT},
    BuildOptions, FetchError, HttpTransport, DEFAULT_BASE_URL, DEFAULT_REQUEST_DELAY, DEFAULT_TOP_N,
};

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings for the client, the pipeline and the HTTP transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// API root, without the endpoint path.
    pub base_url: String,
    /// Number of highest-rated distilleries to load series for.
    pub top_n: usize,
    /// Fixed pause between consecutive series requests, in milliseconds.
    pub request_delay_ms: u64,
    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            top_n: DEFAULT_TOP_N,
            request_delay_ms: DEFAULT_REQUEST_DELAY.as_millis() as u64,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl LoaderConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_n == 0 {
            return Err(ConfigError::Invalid("top_n must be at least 1".into()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            top_n: self.top_n,
            request_delay: self.request_delay(),
        }
    }

    /// HTTP transport with this config's timeout and user agent.
    pub fn http_transport(&self) -> Result<HttpTransport, FetchError> {
        HttpTransport::new(self.timeout(), &self.user_agent)
    }
}

//! Configuration module for Beacon.
//!
//! Provides the YAML-backed [`ReporterConfig`] with loading, defaults,
//! environment overrides and validation. Runtime-only injections (HTTP
//! client, opt-out signal, cancellation parent) are supplied through the
//! reporter builder instead.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::opt_out::DO_NOT_TRACK_ENV;

/// Default number of deliveries allowed in flight at once.
pub const DEFAULT_MAX_CONCURRENT_REPORTS: usize = 16;

/// Upper bound accepted for `max_concurrent_reports`.
pub const MAX_CONCURRENT_REPORTS_LIMIT: usize = 4096;

/// Default absolute upper bound for a single delivery, in seconds.
pub const DEFAULT_DELIVERY_TIMEOUT_SECS: u64 = 30;

/// Default graceful shutdown budget used by the CLI, in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 5;

/// Environment variable overriding `base_url`.
pub const BASE_URL_ENV: &str = "BEACON_BASE_URL";

/// Environment variable overriding `auth_token`.
pub const AUTH_TOKEN_ENV: &str = "BEACON_AUTH_TOKEN";

// ---------------------------------------------------------------------------
// ReporterConfig
// ---------------------------------------------------------------------------

/// Telemetry reporter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    /// Collector base URL; events go to `{base_url}/v1alpha1/events`.
    pub base_url: String,
    /// API bearer token. Sent only when non-empty.
    pub auth_token: String,
    /// Tags appended to every reported event.
    pub tags: Vec<String>,
    /// Maximum number of deliveries in flight; extra events are dropped.
    pub max_concurrent_reports: usize,
    /// Absolute upper bound for one delivery, in seconds.
    pub delivery_timeout_secs: u64,
    /// Graceful shutdown budget, in seconds.
    pub shutdown_timeout_secs: u64,
    /// Environment variable whose non-empty value disables reporting.
    pub opt_out_env: String,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth_token: String::new(),
            tags: Vec::new(),
            max_concurrent_reports: DEFAULT_MAX_CONCURRENT_REPORTS,
            delivery_timeout_secs: DEFAULT_DELIVERY_TIMEOUT_SECS,
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            opt_out_env: DO_NOT_TRACK_ENV.to_string(),
        }
    }
}

impl ReporterConfig {
    /// Creates a default configuration pointing at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Sets the auth token.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = token.into();
        self
    }

    /// Sets the default tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the concurrency bound.
    pub fn with_max_concurrent_reports(mut self, max: usize) -> Self {
        self.max_concurrent_reports = max;
        self
    }

    /// Sets the per-delivery timeout in seconds.
    pub fn with_delivery_timeout_secs(mut self, secs: u64) -> Self {
        self.delivery_timeout_secs = secs;
        self
    }

    /// Per-delivery timeout as a [`Duration`].
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery_timeout_secs)
    }

    /// Graceful shutdown budget as a [`Duration`].
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ReporterConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`ReporterConfig::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/beacon/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("beacon")
            .join("config.yaml")
    }

    /// Apply `BEACON_BASE_URL` / `BEACON_AUTH_TOKEN` when set and non-empty.
    pub fn apply_env_overrides(&mut self) {
        if let Some(url) = non_empty_env(BASE_URL_ENV) {
            self.base_url = url;
        }
        if let Some(token) = non_empty_env(AUTH_TOKEN_ENV) {
            self.auth_token = token;
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

// ---------------------------------------------------------------------------
// ReporterConfig::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Name of the offending field, e.g. `"base_url"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ReporterConfig {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.base_url.is_empty() {
            errors.push(ValidationError {
                field: "base_url".into(),
                message: "must not be empty".into(),
            });
        } else if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://"))
        {
            errors.push(ValidationError {
                field: "base_url".into(),
                message: format!("must be an http(s) URL, got '{}'", self.base_url),
            });
        }

        if self.max_concurrent_reports == 0 {
            errors.push(ValidationError {
                field: "max_concurrent_reports".into(),
                message: "must be greater than 0".into(),
            });
        } else if self.max_concurrent_reports > MAX_CONCURRENT_REPORTS_LIMIT {
            errors.push(ValidationError {
                field: "max_concurrent_reports".into(),
                message: format!(
                    "must be at most {}, got {}",
                    MAX_CONCURRENT_REPORTS_LIMIT, self.max_concurrent_reports
                ),
            });
        }
        if self.delivery_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "delivery_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.opt_out_env.is_empty() {
            errors.push(ValidationError {
                field: "opt_out_env".into(),
                message: "must not be empty".into(),
            });
        }
        if self.tags.iter().any(|tag| tag.trim().is_empty()) {
            errors.push(ValidationError {
                field: "tags".into(),
                message: "tags must not be blank".into(),
            });
        }

        errors
    }
}

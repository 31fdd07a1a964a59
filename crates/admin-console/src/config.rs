//! Configuration loading for the admin console.
//!
//! The file is TOML, located by `--config <path>` or `ADMIN_CONSOLE_CONFIG`. Every section
//! is optional; without a file the console runs on defaults and without a guarded
//! endpoint.
//!
//! ```toml
//! [endpoint]
//! base_url = "https://admin.example.com"
//! session_token = "..."
//! timeout_ms = 10000
//!
//! [cache]
//! fetch_timeout_ms = 15000
//! subscribe_timeout_ms = 10000
//!
//! [cache.resubscribe]
//! initial_ms = 500
//! max_ms = 30000
//! multiplier = 2.0
//! jitter_ms = 250
//!
//! [resources.testimonials]
//! guarded = true
//! order = { field = "rating", direction = "desc" }
//! columns = ["author", "quote", "rating", "status"]
//! ```

use crate::model::RESOURCE_NAMES;
use resource_sync::{CacheConfig, OrderBy, Projection, ResourceSpec};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const CONFIG_ENV: &str = "ADMIN_CONSOLE_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsoleConfig {
    pub endpoint: Option<EndpointConfig>,
    pub cache: CacheConfig,
    pub resources: BTreeMap<String, ResourceOverride>,
}

/// Privileged write route for guarded resources.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    pub base_url: String,
    pub session_token: String,
    #[serde(default = "default_endpoint_timeout")]
    pub timeout_ms: u64,
}

fn default_endpoint_timeout() -> u64 {
    10_000
}

/// Per-resource adjustments to the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResourceOverride {
    pub order: Option<OrderBy>,
    pub columns: Option<Vec<String>>,
    pub guarded: Option<bool>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

fn invalid(field: impl Into<String>, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        reason: reason.to_string(),
    }
}

impl ConsoleConfig {
    /// Loads the file named on the command line or in the environment, or the defaults
    /// when neither names one.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match config_path_from_args().or_else(config_path_from_env) {
            Some(path) => Self::from_path(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ConsoleConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(endpoint) = &self.endpoint {
            let base = endpoint.base_url.trim();
            if !(base.starts_with("http://") || base.starts_with("https://")) {
                return Err(invalid("endpoint.base_url", "must be an http(s) URL"));
            }
            if endpoint.session_token.trim().is_empty() {
                return Err(invalid("endpoint.session_token", "must not be empty"));
            }
            if endpoint.timeout_ms == 0 {
                return Err(invalid("endpoint.timeout_ms", "must be > 0"));
            }
        }

        if self.cache.fetch_timeout_ms == Some(0) {
            return Err(invalid("cache.fetch_timeout_ms", "must be > 0 when set"));
        }
        if self.cache.subscribe_timeout_ms == Some(0) {
            return Err(invalid("cache.subscribe_timeout_ms", "must be > 0 when set"));
        }
        if self.cache.invalidation_capacity == 0 {
            return Err(invalid("cache.invalidation_capacity", "must be > 0"));
        }
        let resubscribe = &self.cache.resubscribe;
        if resubscribe.initial_ms == 0 {
            return Err(invalid("cache.resubscribe.initial_ms", "must be > 0"));
        }
        if resubscribe.max_ms < resubscribe.initial_ms {
            return Err(invalid("cache.resubscribe.max_ms", "must be >= initial_ms"));
        }
        if resubscribe.multiplier < 1.0 {
            return Err(invalid("cache.resubscribe.multiplier", "must be >= 1.0"));
        }

        for (name, resource) in &self.resources {
            if !RESOURCE_NAMES.contains(&name.as_str()) {
                return Err(invalid(format!("resources.{name}"), "unknown resource"));
            }
            if let Some(order) = &resource.order {
                if order.field.trim().is_empty() {
                    return Err(invalid(format!("resources.{name}.order.field"), "must not be empty"));
                }
            }
            if let Some(columns) = &resource.columns {
                if columns.is_empty() || columns.iter().any(|c| c.trim().is_empty()) {
                    return Err(invalid(
                        format!("resources.{name}.columns"),
                        "must list at least one non-empty column",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Applies the override for `base.name`, if any.
    pub fn spec(&self, base: ResourceSpec) -> ResourceSpec {
        let Some(resource) = self.resources.get(base.name.as_str()) else {
            return base;
        };
        let mut spec = base;
        if let Some(order) = &resource.order {
            spec = spec.order_by(order.clone());
        }
        if let Some(columns) = &resource.columns {
            spec = spec.project(Projection::columns(columns.iter().cloned()));
        }
        spec
    }

    pub fn is_guarded(&self, name: &str, default: bool) -> bool {
        self.resources
            .get(name)
            .and_then(|r| r.guarded)
            .unwrap_or(default)
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV).ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

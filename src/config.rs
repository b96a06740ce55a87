//! Runtime configuration for the hub, the bus and the interception layer.
//!
//! Every field has a default, so an empty document is a valid config:
//!
//! ```yaml
//! dispatch:
//!   max_depth: 16
//!   reject_cycles: true
//! notify:
//!   catch_panics: true
//! interception:
//!   log_rejections: false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Default bound on nested `send_request` calls.
pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 32;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub dispatch: DispatchConfig,
    pub notify: NotifyConfig,
    pub interception: InterceptionConfig,
}

/// Dispatch hub tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Maximum number of nested in-flight requests before the hub fails
    /// with `ReentrantDispatch`.
    pub max_depth: usize,
    /// Reject a request whose recipient is already handling a request
    /// further up the current chain.
    pub reject_cycles: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DISPATCH_DEPTH,
            reject_cycles: false,
        }
    }
}

/// Notification bus tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Catch listener panics and report them as failures instead of
    /// unwinding through `notify`.
    pub catch_panics: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self { catch_panics: true }
    }
}

/// Interception layer tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptionConfig {
    /// Log refused writes at `warn` level.
    pub log_rejections: bool,
}

impl Default for InterceptionConfig {
    fn default() -> Self {
        Self {
            log_rejections: true,
        }
    }
}

impl RelayConfig {
    /// Create a config with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        log::debug!("Loading relay config from {}", path.as_ref().display());
        Self::from_yaml(&content)
    }

    /// Check values that deserialize fine but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch.max_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "dispatch.max_depth",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

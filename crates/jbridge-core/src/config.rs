//! Bridge configuration (jbridge.toml)
//!
//! ```toml
//! debug = false
//! clear_faults = false
//! runtime_exception_class = "java/lang/RuntimeException"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid config: {0}")]
    Validation(String),
}

/// Bridge settings carried by a [`crate::BridgeContext`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Initial value of the debug flag
    pub debug: bool,

    /// Clear a pending foreign fault after surfacing it as a script error.
    /// Off by default so the host still sees the fault.
    pub clear_faults: bool,

    /// Slash-separated class thrown when translating script faults
    pub runtime_exception_class: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            debug: false,
            clear_faults: false,
            runtime_exception_class: "java/lang/RuntimeException".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Validation(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let class = &self.runtime_exception_class;
        if class.is_empty() {
            return Err(ConfigError::Validation(
                "runtime_exception_class cannot be empty".to_string(),
            ));
        }
        if class.contains('.') {
            return Err(ConfigError::Validation(format!(
                "runtime_exception_class must be slash-separated: {}",
                class
            )));
        }
        Ok(())
    }
}

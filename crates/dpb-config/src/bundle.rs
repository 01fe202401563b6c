//! Bundle configuration types.

use crate::resolve::resolve_config;
use crate::validate::{validate_config, ValidationError, ValidationResult};
use crate::{CONFIG_SCHEMA_VERSION, DEFAULT_EPSILON_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Process-wide settings for bundle construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleConfig {
    pub schema_version: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Per-mechanism epsilon cap applied by the budget split.
    #[serde(default = "default_epsilon_threshold")]
    pub epsilon_threshold: f64,
}

fn default_epsilon_threshold() -> f64 {
    DEFAULT_EPSILON_THRESHOLD
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION.to_string(),
            description: None,
            epsilon_threshold: DEFAULT_EPSILON_THRESHOLD,
        }
    }
}

impl BundleConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a JSON string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> ValidationResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Override the epsilon threshold.
    pub fn with_epsilon_threshold(mut self, threshold: f64) -> Self {
        self.epsilon_threshold = threshold;
        self
    }

    /// Run semantic validation.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_config(self)
    }
}

/// Resolve, load, and validate the bundle configuration.
///
/// Falls back to `BundleConfig::default()` when no file is found.
pub fn load_config(cli_path: Option<&Path>) -> ValidationResult<BundleConfig> {
    let paths = resolve_config(cli_path);

    let config = match paths.config.as_deref() {
        Some(path) => {
            debug!(path = %path.display(), source = %paths.source, "Loading bundle config");
            BundleConfig::from_file(path)?
        }
        None => BundleConfig::default(),
    };

    config.validate()?;

    info!(
        source = %paths.source,
        epsilon_threshold = config.epsilon_threshold,
        "Bundle config loaded"
    );

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = BundleConfig::default();
        assert_eq!(config.schema_version, CONFIG_SCHEMA_VERSION);
        assert_eq!(config.epsilon_threshold, DEFAULT_EPSILON_THRESHOLD);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_threshold_uses_default() {
        let config = BundleConfig::from_str(r#"{"schema_version": "1.0.0"}"#).unwrap();
        assert_eq!(config.epsilon_threshold, DEFAULT_EPSILON_THRESHOLD);
    }

    #[test]
    fn test_parse_explicit_threshold() {
        let config = BundleConfig::from_str(
            r#"{"schema_version": "1.0.0", "epsilon_threshold": 1.0, "description": "test"}"#,
        )
        .unwrap();
        assert_eq!(config.epsilon_threshold, 1.0);
        assert_eq!(config.description.as_deref(), Some("test"));
    }

    #[test]
    fn test_parse_error() {
        let err = BundleConfig::from_str("{not json").unwrap_err();
        assert!(matches!(err, ValidationError::ParseError(_)));
    }

    #[test]
    fn test_with_epsilon_threshold() {
        let config = BundleConfig::default().with_epsilon_threshold(5.0);
        assert_eq!(config.epsilon_threshold, 5.0);
    }
}

//! Configuration validation errors and semantic validation.

use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

/// Validate bundle configuration semantically.
pub fn validate_config(config: &crate::BundleConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    validate_epsilon_threshold(config.epsilon_threshold)
}

/// The threshold must be a finite positive number.
pub fn validate_epsilon_threshold(threshold: f64) -> ValidationResult<()> {
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "epsilon_threshold".to_string(),
            message: format!("Must be finite and positive, got {}", threshold),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BundleConfig;

    #[test]
    fn test_threshold_validation() {
        assert!(validate_epsilon_threshold(1.0).is_ok());
        assert!(validate_epsilon_threshold(0.0).is_err());
        assert!(validate_epsilon_threshold(-3.0).is_err());
        assert!(validate_epsilon_threshold(f64::NAN).is_err());
        assert!(validate_epsilon_threshold(f64::INFINITY).is_err());
    }

    #[test]
    fn test_version_mismatch() {
        let config = BundleConfig {
            schema_version: "0.9.0".to_string(),
            ..BundleConfig::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ValidationError::VersionMismatch { .. }));
        assert_eq!(err.code(), 66);
    }

    #[test]
    fn test_invalid_threshold_reports_field() {
        let config = BundleConfig::default().with_epsilon_threshold(-1.0);
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("epsilon_threshold"));
        assert_eq!(err.code(), 65);
    }
}

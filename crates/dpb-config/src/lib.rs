//! DP aggregator bundle configuration loading and validation.
//!
//! This crate provides:
//! - The typed `BundleConfig` struct for bundle.json
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation

pub mod bundle;
pub mod resolve;
pub mod validate;

pub use bundle::{load_config, BundleConfig};
pub use resolve::{resolve_config, ConfigPaths, ConfigSource};
pub use validate::{ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// Per-mechanism epsilon cap used when splitting a bundle budget.
///
/// A requested epsilon at or above this value is not divided across the
/// nested mechanisms; each one receives exactly this value and the rest of
/// the request stays unspent.
pub const DEFAULT_EPSILON_THRESHOLD: f64 = 20.0;

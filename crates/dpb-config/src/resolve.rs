//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI argument → environment variables → XDG path → defaults.

use std::path::{Path, PathBuf};

/// Discovered configuration file path.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Path to bundle.json (or None if not found).
    pub config: Option<PathBuf>,

    /// Where the path came from (for diagnostics).
    pub source: ConfigSource,
}

/// Where a configuration file was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
pub const ENV_CONFIG_PATH: &str = "DPB_CONFIG";
pub const ENV_CONFIG_DIR: &str = "DPB_CONFIG_DIR";

/// Standard config file name.
pub const CONFIG_FILENAME: &str = "bundle.json";

/// Application name for XDG directories.
const APP_NAME: &str = "dp-bundle";

/// Resolve the configuration path.
///
/// 1. Explicit CLI path (if it exists)
/// 2. DPB_CONFIG environment variable
/// 3. DPB_CONFIG_DIR environment variable + bundle.json
/// 4. XDG config directory (~/.config/dp-bundle/bundle.json)
/// 5. Built-in defaults (None)
pub fn resolve_config(cli_path: Option<&Path>) -> ConfigPaths {
    let mut paths = ConfigPaths::default();

    if let Some(path) = cli_path {
        if path.exists() {
            paths.config = Some(path.to_path_buf());
            paths.source = ConfigSource::CliArgument;
            return paths;
        }
    }

    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            paths.config = Some(path);
            paths.source = ConfigSource::Environment;
            return paths;
        }
    }

    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(CONFIG_FILENAME);
        if path.exists() {
            paths.config = Some(path);
            paths.source = ConfigSource::Environment;
            return paths;
        }
    }

    if let Some(dir) = xdg_config_dir() {
        let path = dir.join(CONFIG_FILENAME);
        if path.exists() {
            paths.config = Some(path);
            paths.source = ConfigSource::XdgConfig;
            return paths;
        }
    }

    paths.source = ConfigSource::BuiltinDefault;
    paths
}

/// Get the XDG config directory for dp-bundle.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

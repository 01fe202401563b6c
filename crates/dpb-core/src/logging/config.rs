//! Logging configuration.
//!
//! Level precedence, highest first: explicit override, `DPB_LOG`,
//! `RUST_LOG`, built-in default. `RUST_LOG` is only consulted when neither
//! of the first two is present, and then its directives are used verbatim.

use serde::{Deserialize, Serialize};

/// Level override, takes precedence over `RUST_LOG`.
pub const ENV_LOG_LEVEL: &str = "DPB_LOG";

/// Output format override.
pub const ENV_LOG_FORMAT: &str = "DPB_LOG_FORMAT";

/// Crates whose events the level directives cover.
const CRATE_TARGETS: [&str; 3] = ["dpb_core", "dpb_config", "dpb_state"];

/// Where log lines go and how they look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per line.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            _ => Err(format!("unknown log format: {}", s)),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LogFormat::Human => "human",
            LogFormat::Jsonl => "jsonl",
        })
    }
}

/// Minimum level for this workspace's crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    /// Construction summaries and budget caps.
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    const ALL: [LogLevel; 6] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Off,
    ];

    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        LogLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == lower)
            .ok_or_else(|| format!("unknown log level: {}", s))
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `target=level` directives for every crate in the workspace.
pub fn default_directives(level: LogLevel) -> String {
    CRATE_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Include timestamps in human output.
    pub timestamps: bool,
    /// Raw `RUST_LOG` directives, kept only when no higher-precedence level
    /// was supplied.
    pub rust_log: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Info,
            timestamps: true,
            rust_log: None,
        }
    }
}

impl LogConfig {
    /// Build from the process environment plus explicit overrides.
    pub fn from_env(level: Option<LogLevel>, format: Option<LogFormat>) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), level, format)
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        level: Option<LogLevel>,
        format: Option<LogFormat>,
    ) -> Self {
        let mut config = LogConfig::default();

        if let Some(level) = level {
            config.level = level;
        } else if let Some(val) = lookup(ENV_LOG_LEVEL) {
            config.level = val.parse().unwrap_or_default();
        } else if let Some(val) = lookup("RUST_LOG").filter(|v| !v.trim().is_empty()) {
            config.rust_log = Some(val);
        }

        config.format = format
            .or_else(|| lookup(ENV_LOG_FORMAT).and_then(|v| v.parse().ok()))
            .unwrap_or_default();

        config
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the level; any `RUST_LOG` directives are dropped.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self.rust_log = None;
        self
    }

    /// Filter directives the subscriber should install.
    pub fn filter_directives(&self) -> String {
        self.rust_log
            .clone()
            .unwrap_or_else(|| default_directives(self.level))
    }
}

//! Configuration management for trimcase
//!
//! Two layers live here:
//!
//! - [`Config`]: the engine's immutable parameters, threaded explicitly into
//!   every operation that needs them and never written into session state.
//! - [`Settings`]: the `trimcase.toml` file (logging, artifact paths, judge
//!   behaviour), which the CLI resolves and then narrows down to a [`Config`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::verdict::DEFAULT_INVALID_EXIT_CODE;

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "trimcase.toml";

/// Engine parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// The smallest sequence is never shrunk below this many lines.
    pub min_test_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_test_size: default_min_test_size(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-friendly output
    #[default]
    Pretty,
    /// JSON lines
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => f.write_str("pretty"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown log format: {s}. Expected pretty or json")),
        }
    }
}

/// Contents of `trimcase.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// General settings
    #[serde(default)]
    pub general: GeneralSettings,

    /// Artifact locations
    #[serde(default)]
    pub session: SessionSettings,

    /// Shrinking parameters
    #[serde(default)]
    pub shrink: ShrinkSettings,

    /// Scripted-judge behaviour
    #[serde(default)]
    pub judge: JudgeSettings,
}

/// General configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,

    /// Optional log file, appended to
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            log_file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Where session artifacts live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Session storage directory
    #[serde(default = "default_session_dir")]
    pub dir: PathBuf,

    /// Fixed path the judge reads the candidate from
    #[serde(default = "default_candidate_path")]
    pub candidate: PathBuf,

    /// Where the final smallest input is copied; defaults to `candidate`
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            dir: default_session_dir(),
            candidate: default_candidate_path(),
            output: None,
        }
    }
}

impl SessionSettings {
    /// Final-output location after fallback to the candidate path.
    #[must_use]
    pub fn output_path(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.candidate)
    }
}

fn default_session_dir() -> PathBuf {
    PathBuf::from(".trimcase")
}

fn default_candidate_path() -> PathBuf {
    PathBuf::from("current-input")
}

/// Shrinking parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShrinkSettings {
    #[serde(default = "default_min_test_size")]
    pub min_test_size: usize,
}

impl Default for ShrinkSettings {
    fn default() -> Self {
        Self {
            min_test_size: default_min_test_size(),
        }
    }
}

fn default_min_test_size() -> usize {
    1
}

/// Scripted-judge behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeSettings {
    /// Exit code that maps to `invalid`
    #[serde(default = "default_invalid_exit_code")]
    pub invalid_exit_code: i32,

    /// Kill the judge after this many seconds and record `invalid`
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for JudgeSettings {
    fn default() -> Self {
        Self {
            invalid_exit_code: default_invalid_exit_code(),
            timeout_secs: None,
        }
    }
}

impl JudgeSettings {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn default_invalid_exit_code() -> i32 {
    DEFAULT_INVALID_EXIT_CODE
}

impl Settings {
    /// Load settings from an explicit path, or from the first default
    /// location that exists, or fall back to built-in defaults.
    ///
    /// An explicit path that does not exist is an error; missing default
    /// locations are not.
    pub fn load(explicit: Option<&Path>) -> crate::Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.display().to_string()).into());
            }
            return Self::load_from(path);
        }

        match resolve_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.display().to_string(), e.to_string()))?;
        let settings = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(settings)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        let settings: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> crate::Result<()> {
        if self.session.dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError("session.dir must not be empty".into()).into());
        }
        if self.session.candidate.as_os_str().is_empty() {
            return Err(
                ConfigError::ValidationError("session.candidate must not be empty".into()).into(),
            );
        }
        if self.judge.invalid_exit_code == 0 {
            return Err(ConfigError::ValidationError(
                "judge.invalid_exit_code must not be 0 (0 means pass)".into(),
            )
            .into());
        }
        if self.judge.timeout_secs == Some(0) {
            return Err(
                ConfigError::ValidationError("judge.timeout_secs must be positive".into()).into(),
            );
        }
        Ok(())
    }

    /// Engine parameters derived from these settings.
    #[must_use]
    pub fn engine_config(&self) -> Config {
        Config {
            min_test_size: self.shrink.min_test_size,
        }
    }
}

/// First existing config file among the default locations:
/// `./trimcase.toml`, then `<config_dir>/trimcase/config.toml`.
pub fn resolve_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    let user = dirs::config_dir()?.join("trimcase").join("config.toml");
    user.is_file().then_some(user)
}

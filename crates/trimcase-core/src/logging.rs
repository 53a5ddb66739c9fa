//! Structured logging for trimcase
//!
//! One global `tracing` subscriber: a stderr layer (pretty or JSON), an
//! optional append-only file layer in the same format, and an `EnvFilter`
//! where `RUST_LOG` beats the configured level.
//!
//! ```ignore
//! use trimcase_core::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::from(&settings.general))?;
//! ```
//!
//! Step events carry `bucket_size`, `cut_idx`, `drop_count`, `smallest_len`
//! and `verdict`. Line contents are never logged.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::{Level, Subscriber};
use tracing_subscriber::fmt::time::SystemTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt};

pub use crate::config::LogFormat;
use crate::config::GeneralSettings;

static INSTALLED: OnceLock<()> = OnceLock::new();

/// What to log, how, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Level directive (trace, debug, info, warn, error); `RUST_LOG` wins
    pub level: String,
    pub format: LogFormat,
    /// Also append to this file
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

impl From<&GeneralSettings> for LogConfig {
    fn from(general: &GeneralSettings) -> Self {
        Self {
            level: general.log_level.clone(),
            format: general.log_format,
            file: general.log_file.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("logging already initialized")]
    AlreadyInitialized,

    #[error("invalid log level `{0}`; expected trace, debug, info, warn or error")]
    InvalidLevel(String),

    #[error("cannot open log file {path}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install subscriber: {0}")]
    Install(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Level filter for `level`, unless `RUST_LOG` is set.
fn level_filter(level: &str) -> Result<EnvFilter, LogError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let level: Level = level
        .parse()
        .map_err(|_| LogError::InvalidLevel(level.to_string()))?;
    Ok(EnvFilter::default().add_directive(level.into()))
}

fn console_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_timer(SystemTime)
            .with_writer(std::io::stderr)
            .flatten_event(true)
            .boxed(),
    }
}

fn file_layer<S>(
    path: &Path,
    format: LogFormat,
) -> Result<Box<dyn Layer<S> + Send + Sync>, LogError>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let open_err = |source| LogError::OpenFile {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(open_err)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(open_err)?;

    Ok(match format {
        LogFormat::Pretty => fmt::layer().with_writer(file).with_ansi(false).boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_timer(SystemTime)
            .with_writer(file)
            .flatten_event(true)
            .boxed(),
    })
}

/// Install the global subscriber. Only the first call in a process succeeds.
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    if INSTALLED.get().is_some() {
        return Err(LogError::AlreadyInitialized);
    }

    let filter = level_filter(&config.level)?;
    let file = config
        .file
        .as_deref()
        .map(|path| file_layer(path, config.format))
        .transpose()?;

    let subscriber = tracing_subscriber::registry()
        .with(console_layer(config.format))
        .with(file)
        .with(filter);
    tracing::subscriber::set_global_default(subscriber)?;
    let _ = INSTALLED.set(());

    tracing::debug!(
        log_level = %config.level,
        log_format = %config.format,
        log_file = ?config.file,
        "Logging initialized"
    );
    Ok(())
}

pub fn is_logging_initialized() -> bool {
    INSTALLED.get().is_some()
}

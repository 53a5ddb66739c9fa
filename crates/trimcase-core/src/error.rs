//! Error types for trimcase-core

use std::fmt;
use thiserror::Error;

/// A command the user can run to recover.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RemediationCommand {
    pub label: String,
    pub command: String,
}

/// Recovery advice attached to an [`Error`], printed by the CLI.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Remediation {
    pub summary: String,
    pub commands: Vec<RemediationCommand>,
    pub alternatives: Vec<String>,
}

impl Remediation {
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            commands: Vec::new(),
            alternatives: Vec::new(),
        }
    }

    #[must_use]
    pub fn command(mut self, label: impl Into<String>, command: impl Into<String>) -> Self {
        self.commands.push(RemediationCommand {
            label: label.into(),
            command: command.into(),
        });
        self
    }

    #[must_use]
    pub fn alternative(mut self, alternative: impl Into<String>) -> Self {
        self.alternatives.push(alternative.into());
        self
    }

    /// Multi-line plain text, ending in a newline.
    #[must_use]
    pub fn render_plain(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Remediation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "To fix:")?;
        writeln!(f, "  {}", self.summary)?;
        if !self.commands.is_empty() {
            writeln!(f, "  Commands:")?;
        }
        for RemediationCommand { label, command } in &self.commands {
            writeln!(f, "    - {label}: {command}")?;
        }
        if !self.alternatives.is_empty() {
            writeln!(f, "  Alternatives:")?;
        }
        for alternative in &self.alternatives {
            writeln!(f, "    - {alternative}")?;
        }
        Ok(())
    }
}

/// Result type alias using the library's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for trimcase-core
#[derive(Error, Debug)]
pub enum Error {
    /// A state-dependent command ran with no session artifacts present
    #[error("no active shrinking session found")]
    SessionNotFound,

    /// `start` ran while a session's artifacts already exist
    #[error("a shrinking session is already active")]
    SessionAlreadyActive,

    /// The session already met its completion predicate
    #[error("the shrinking session has already completed")]
    SessionFinished,

    /// A persisted artifact could not be decoded
    #[error("corrupt session artifact `{artifact}`: {details}")]
    PersistenceCorruption {
        artifact: &'static str,
        details: String,
    },

    /// I/O errors on persisted artifacts
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The judge could not be run at all (distinct from a verdict)
    #[error("Judge error: {0}")]
    Judge(#[from] JudgeError),
}

impl Error {
    pub(crate) fn corruption(artifact: &'static str, details: impl Into<String>) -> Self {
        Self::PersistenceCorruption {
            artifact,
            details: details.into(),
        }
    }

    /// Distinguishing process exit code for this error category.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::SessionNotFound => 2,
            Self::SessionAlreadyActive => 3,
            Self::PersistenceCorruption { .. } => 4,
            Self::Io(_) => 5,
            Self::Config(_) => 6,
            Self::Judge(_) => 7,
            Self::SessionFinished => 8,
        }
    }

    /// Return remediation guidance when available.
    #[must_use]
    pub fn remediation(&self) -> Option<Remediation> {
        match self {
            Self::SessionNotFound => Some(
                Remediation::new("Start a session before marking or resuming.")
                    .command("Start", "trimcase start <file>")
                    .alternative("Check that --session-dir points at the intended directory."),
            ),
            Self::SessionAlreadyActive => Some(
                Remediation::new("Finish or abandon the existing session first.")
                    .command("Inspect", "trimcase status")
                    .command("Abandon", "trimcase abandon"),
            ),
            Self::SessionFinished => Some(
                Remediation::new("The smallest failing input has already been written out.")
                    .command("Inspect", "trimcase status")
                    .command("Start over", "trimcase abandon"),
            ),
            Self::PersistenceCorruption { .. } => Some(
                Remediation::new(
                    "Session state is corrupt. Automatic recovery is not possible.",
                )
                .command("Abandon", "trimcase abandon")
                .alternative("Restart the session from the original failing input."),
            ),
            Self::Io(_) => Some(
                Remediation::new("Check filesystem permissions and paths, then retry.")
                    .alternative("The last persisted state is still intact; rerun the command."),
            ),
            Self::Config(err) => Some(err.remediation()),
            Self::Judge(err) => Some(err.remediation()),
        }
    }
}

/// Config-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read config {0}: {1}")]
    ReadFailed(String, String),

    #[error("Failed to parse config: {0}")]
    ParseFailed(String),

    #[error("Invalid config value: {0}")]
    ValidationError(String),
}

impl ConfigError {
    #[must_use]
    pub fn remediation(&self) -> Remediation {
        match self {
            Self::FileNotFound(path) => {
                Remediation::new(format!("Create the config file or fix the path: {path}"))
                    .alternative("Omit --config to fall back to ./trimcase.toml or defaults.")
            }
            Self::ReadFailed(path, _) => {
                Remediation::new(format!("Check that {path} is readable."))
            }
            Self::ParseFailed(_) => Remediation::new("Fix the TOML syntax in the config file.")
                .alternative("Known tables: [general], [session], [shrink], [judge]."),
            Self::ValidationError(_) => {
                Remediation::new("Correct the invalid value and retry.")
            }
        }
    }
}

/// Judge-invocation errors
#[derive(Error, Debug)]
pub enum JudgeError {
    #[error("failed to launch judge `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for judge `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl JudgeError {
    #[must_use]
    pub fn remediation(&self) -> Remediation {
        match self {
            Self::Spawn { program, .. } => {
                Remediation::new(format!("Make sure `{program}` exists and is executable."))
                    .command("Make executable", format!("chmod +x {program}"))
                    .alternative("Run the judge by hand against the candidate file.")
            }
            Self::Wait { .. } => Remediation::new("The judge process could not be monitored.")
                .command("Resume", "trimcase script --resume <judge>"),
        }
    }
}

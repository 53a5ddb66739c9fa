//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use trimcase_core::Verdict;
use trimcase_core::config::{LogFormat, Settings};

/// trimcase - shrink a failing line-based input, one verdict at a time
#[derive(Parser, Debug)]
#[command(name = "trimcase")]
#[command(version, about, long_about = None)]
#[command(after_help = "Examples:
  trimcase start crash.txt             Begin shrinking crash.txt
  ./repro.sh current-input             Judge the candidate by hand...
  trimcase mark fail                   ...and report what happened
  trimcase script ./judge.sh crash.txt Let a judge script drive every step
  trimcase status --json               Machine-readable progress
")]
pub struct Cli {
    /// Config file (default: ./trimcase.toml, then the user config dir)
    #[arg(long, global = true, value_name = "PATH", env = "TRIMCASE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding session artifacts
    #[arg(long, global = true, value_name = "DIR", env = "TRIMCASE_SESSION_DIR")]
    pub session_dir: Option<PathBuf>,

    /// Where the candidate for the judge is written
    #[arg(long, global = true, value_name = "PATH", env = "TRIMCASE_CANDIDATE")]
    pub candidate: Option<PathBuf>,

    /// Where the final smallest input is written (default: the candidate path)
    #[arg(long, global = true, value_name = "PATH", env = "TRIMCASE_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Never shrink below this many lines
    #[arg(long, global = true, value_name = "N", env = "TRIMCASE_MIN_TEST_SIZE")]
    pub min_test_size: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "LEVEL", env = "TRIMCASE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log format for stderr
    #[arg(long, global = true, value_name = "FORMAT", env = "TRIMCASE_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Begin a session from a failing input file
    Start {
        /// The failing input
        file: PathBuf,
    },

    /// Record the judge's verdict on the current candidate
    Mark {
        /// pass, fail or invalid
        verdict: Verdict,
    },

    /// Delete the session and all of its artifacts
    Abandon,

    /// Show session progress
    Status {
        /// Emit JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Drive a session to completion with a judge executable
    Script {
        /// Executable run once per step; exit 0 = pass, the invalid code =
        /// invalid, anything else = fail
        judge: PathBuf,

        /// The failing input (omit with --resume)
        #[arg(required_unless_present = "resume", conflicts_with = "resume")]
        file: Option<PathBuf>,

        /// Continue the existing session instead of starting one
        #[arg(long)]
        resume: bool,

        /// Kill the judge after this many seconds and record invalid
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Judge exit code that means invalid
        #[arg(long, value_name = "N")]
        invalid_exit_code: Option<i32>,
    },
}

impl Cli {
    /// Fold command-line overrides into file settings.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(dir) = &self.session_dir {
            settings.session.dir.clone_from(dir);
        }
        if let Some(candidate) = &self.candidate {
            settings.session.candidate.clone_from(candidate);
        }
        if let Some(output) = &self.output {
            settings.session.output = Some(output.clone());
        }
        if let Some(min) = self.min_test_size {
            settings.shrink.min_test_size = min;
        }
        if let Some(level) = &self.log_level {
            settings.general.log_level.clone_from(level);
        }
        if let Some(format) = self.log_format {
            settings.general.log_format = format;
        }
        if let Commands::Script {
            timeout,
            invalid_exit_code,
            ..
        } = &self.command
        {
            if timeout.is_some() {
                settings.judge.timeout_secs = *timeout;
            }
            if let Some(code) = invalid_exit_code {
                settings.judge.invalid_exit_code = *code;
            }
        }
    }
}

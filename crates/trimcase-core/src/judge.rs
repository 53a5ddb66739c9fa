//! Judges: whatever classifies a candidate as pass, fail or invalid.

use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::JudgeError;
use crate::verdict::{DEFAULT_INVALID_EXIT_CODE, Verdict};
use crate::Result;

/// Something that can classify one candidate.
///
/// The candidate lines are passed for in-process judges; an external judge
/// reads the candidate file instead.
pub trait Judge {
    fn evaluate(&mut self, candidate: &[String]) -> Result<Verdict>;
}

impl<F> Judge for F
where
    F: FnMut(&[String]) -> Result<Verdict>,
{
    fn evaluate(&mut self, candidate: &[String]) -> Result<Verdict> {
        self(candidate)
    }
}

/// External judge executable, run once per candidate with no arguments.
///
/// The judge's stdout is sent to trimcase's stderr, so stdout stays free for
/// machine-readable output.
///
/// Exit 0 is `pass`, the invalid sentinel (125 by default) is `invalid`, and
/// anything else, including death by signal, is `fail`. With a timeout set, a
/// judge that overruns is killed and the step counts as `invalid`.
#[derive(Debug, Clone)]
pub struct CommandJudge {
    program: PathBuf,
    invalid_exit_code: i32,
    timeout: Option<Duration>,
    poll_interval: Duration,
}

impl CommandJudge {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            invalid_exit_code: DEFAULT_INVALID_EXIT_CODE,
            timeout: None,
            poll_interval: Duration::from_millis(20),
        }
    }

    #[must_use]
    pub fn with_invalid_exit_code(mut self, code: i32) -> Self {
        self.invalid_exit_code = code;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    /// Wait for the child, killing it once `timeout` has passed.
    /// `None` means it was killed.
    fn wait_with_timeout(
        &self,
        child: &mut std::process::Child,
        timeout: Duration,
    ) -> std::io::Result<Option<ExitStatus>> {
        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(Some(status));
            }
            if start.elapsed() >= timeout {
                child.kill()?;
                child.wait()?;
                return Ok(None);
            }
            std::thread::sleep(self.poll_interval);
        }
    }
}

impl Judge for CommandJudge {
    fn evaluate(&mut self, _candidate: &[String]) -> Result<Verdict> {
        let mut child = Command::new(&self.program)
            .stdin(Stdio::null())
            .stdout(std::io::stderr())
            .spawn()
            .map_err(|source| JudgeError::Spawn {
                program: self.program_name(),
                source,
            })?;

        let waited = match self.timeout {
            Some(timeout) => self.wait_with_timeout(&mut child, timeout),
            None => child.wait().map(Some),
        };
        let status = waited.map_err(|source| JudgeError::Wait {
            program: self.program_name(),
            source,
        })?;

        let Some(status) = status else {
            warn!(
                program = %self.program.display(),
                timeout_secs = self.timeout.map_or(0, |t| t.as_secs()),
                "Judge timed out; recording invalid"
            );
            return Ok(Verdict::Invalid);
        };

        let verdict = Verdict::from_exit_code(status.code(), self.invalid_exit_code);
        debug!(exit_code = ?status.code(), verdict = %verdict, "Judge finished");
        Ok(verdict)
    }
}

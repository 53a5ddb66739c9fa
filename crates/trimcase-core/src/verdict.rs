//! Judge verdicts.

use serde::{Deserialize, Serialize};

/// Exit code conventionally used by judges to say "cannot tell" (as with
/// `git bisect run`).
pub const DEFAULT_INVALID_EXIT_CODE: i32 = 125;

/// Classification of a candidate by the judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The failure did not reproduce; the removed slice was needed.
    Pass,
    /// The failure still reproduces without the removed slice.
    Fail,
    /// The judge could not reach a conclusion.
    Invalid,
}

impl Verdict {
    /// All verdicts, in log-token order.
    pub const ALL: [Self; 3] = [Self::Pass, Self::Fail, Self::Invalid];

    /// Literal token used in the session log and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Invalid => "invalid",
        }
    }

    /// Map a judge's exit status to a verdict.
    ///
    /// `None` means the process ended without an exit code (killed by a
    /// signal), which counts as a reproduced failure like any other non-zero
    /// status.
    #[must_use]
    pub fn from_exit_code(code: Option<i32>, invalid_code: i32) -> Self {
        match code {
            Some(0) => Self::Pass,
            Some(code) if code == invalid_code => Self::Invalid,
            _ => Self::Fail,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pass" => Ok(Self::Pass),
            "fail" => Ok(Self::Fail),
            "invalid" => Ok(Self::Invalid),
            _ => Err(format!(
                "unknown verdict: {s}. Expected one of: pass, fail, invalid"
            )),
        }
    }
}

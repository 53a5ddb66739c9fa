//! Append-only audit log of decision points.
//!
//! One record per verdict, `bucket_size,cut_idx,drop_count,verdict`, taken
//! from the state *before* the verdict was applied.

use serde::{Deserialize, Serialize};

use crate::state::SessionState;
use crate::verdict::Verdict;
use crate::{Error, Result};

/// A single decision point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub bucket_size: usize,
    pub cut_idx: usize,
    pub drop_count: usize,
    pub verdict: Verdict,
}

impl LogEntry {
    /// Pair the pre-transition state with the verdict applied to it.
    #[must_use]
    pub fn at(state: &SessionState, verdict: Verdict) -> Self {
        Self {
            bucket_size: state.bucket_size,
            cut_idx: state.cut_idx,
            drop_count: state.drop_count,
            verdict,
        }
    }

    /// Parse one log line.
    pub fn parse(line: &str) -> Result<Self> {
        let parts: Vec<&str> = line.trim().split(',').collect();
        let [bucket_size, cut_idx, drop_count, verdict] = parts.as_slice() else {
            return Err(Error::corruption(
                "log",
                format!("expected 4 comma-separated fields: {line:?}"),
            ));
        };

        let number = |name: &str, raw: &str| {
            raw.parse::<usize>().map_err(|_| {
                Error::corruption("log", format!("{name} is not an integer: {raw:?}"))
            })
        };

        Ok(Self {
            bucket_size: number("bucket_size", *bucket_size)?,
            cut_idx: number("cut_idx", *cut_idx)?,
            drop_count: number("drop_count", *drop_count)?,
            verdict: verdict
                .parse()
                .map_err(|e: String| Error::corruption("log", e))?,
        })
    }
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.bucket_size, self.cut_idx, self.drop_count, self.verdict
        )
    }
}

/// Parse a whole log, skipping blank lines.
pub fn parse_log(text: &str) -> Result<Vec<LogEntry>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(LogEntry::parse)
        .collect()
}

/// Verdict counts over a session's log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSummary {
    pub steps: usize,
    pub passes: usize,
    pub fails: usize,
    pub invalids: usize,
}

impl LogSummary {
    #[must_use]
    pub fn from_entries(entries: &[LogEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut acc, entry| {
            acc.steps += 1;
            match entry.verdict {
                Verdict::Pass => acc.passes += 1,
                Verdict::Fail => acc.fails += 1,
                Verdict::Invalid => acc.invalids += 1,
            }
            acc
        })
    }
}

//! Outcome processor: the verdict state machine.
//!
//! [`transition`] is pure. It never touches storage; the session shell
//! applies the [`Removal`] it asks for, persists the next state and appends
//! the log entry.
//!
//! Per verdict:
//!
//! - `pass` / `invalid`: the bucket stays, `cut_idx += bucket_size`.
//! - `fail`: the bucket is dropped for good, `smallest_len` shrinks and
//!   `drop_count` grows. `cut_idx` stays put because the data that followed
//!   the bucket now sits at the same offset.
//!
//! Then, if `cut_idx >= smallest_len`, the pass wraps: `cut_idx = 0`,
//! `bucket_size /= 2`, `drop_count = 0`. The session is done once
//! `bucket_size == 0` or `smallest_len <= min_test_size`.
//!
//! Termination: every step either advances `cut_idx` by `bucket_size > 0` or
//! shrinks `smallest_len`, so each pass ends in at most `smallest_len` steps,
//! and there are at most `log2(len) + 1` passes before `bucket_size` hits 0.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::planner::bucket_bounds;
use crate::session_log::LogEntry;
use crate::state::SessionState;
use crate::verdict::Verdict;

/// A bucket to drop from the smallest sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Removal {
    pub cut_idx: usize,
    pub bucket_size: usize,
}

impl Removal {
    /// Number of lines this removal takes out of a sequence of `len` lines.
    #[must_use]
    pub fn removed_len(&self, len: usize) -> usize {
        let (lo, hi) = bucket_bounds(len, self.cut_idx, self.bucket_size);
        hi - lo
    }
}

/// Everything one verdict decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State after the verdict and any wrap.
    pub next: SessionState,
    /// Bucket to commit, on `fail`.
    pub commit: Option<Removal>,
    /// Audit record for the decision point (pre-transition state).
    pub log_entry: LogEntry,
    /// Completion predicate on `next`.
    pub done: bool,
}

/// Apply `verdict` to `state`.
#[must_use]
pub fn transition(state: SessionState, verdict: Verdict, config: &Config) -> Transition {
    let log_entry = LogEntry::at(&state, verdict);
    let mut next = state;
    let mut commit = None;

    match verdict {
        Verdict::Pass | Verdict::Invalid => {
            next.cut_idx = next.cut_idx.saturating_add(next.bucket_size);
        }
        Verdict::Fail => {
            let removal = Removal {
                cut_idx: state.cut_idx,
                bucket_size: state.bucket_size,
            };
            next.smallest_len -= removal.removed_len(state.smallest_len);
            next.drop_count += 1;
            commit = Some(removal);
        }
    }

    wrap_if_needed(&mut next);

    Transition {
        next,
        commit,
        log_entry,
        done: next.is_complete(config),
    }
}

/// Start a finer pass once the cut index runs off the end.
fn wrap_if_needed(state: &mut SessionState) {
    if state.cut_idx >= state.smallest_len {
        state.cut_idx = 0;
        state.bucket_size /= 2;
        state.drop_count = 0;
    }
}

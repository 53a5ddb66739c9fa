//! Persisted session state.
//!
//! The on-disk record is exactly four decimal integers, one per line, in the
//! order `bucket_size`, `cut_idx`, `drop_count`, `smallest_len`.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::{Error, Result};

const FIELD_NAMES: [&str; 4] = ["bucket_size", "cut_idx", "drop_count", "smallest_len"];

/// Position of the bisection within the smallest known failing input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Width of the slice currently being tested for removal.
    pub bucket_size: usize,
    /// Offset into the smallest sequence where the next slice starts.
    pub cut_idx: usize,
    /// Removals since the last halving. Diagnostic only.
    pub drop_count: usize,
    /// Current length of the smallest sequence.
    pub smallest_len: usize,
}

impl SessionState {
    /// Fresh state for an initial input of `len` lines.
    #[must_use]
    pub fn initial(len: usize) -> Self {
        Self {
            bucket_size: len / 2,
            cut_idx: 0,
            drop_count: 0,
            smallest_len: len,
        }
    }

    /// Completion predicate: nothing left to cut, or already small enough.
    #[must_use]
    pub fn is_complete(&self, config: &Config) -> bool {
        self.bucket_size == 0 || self.smallest_len <= config.min_test_size
    }

    /// Exclusive end of the current bucket, clipped to the sequence length.
    #[must_use]
    pub fn bucket_end(&self) -> usize {
        self.cut_idx
            .saturating_add(self.bucket_size)
            .min(self.smallest_len)
    }

    /// Encode as the four-line state record.
    #[must_use]
    pub fn encode(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}\n",
            self.bucket_size, self.cut_idx, self.drop_count, self.smallest_len
        )
    }

    /// Decode a four-line state record.
    ///
    /// Anything other than exactly four non-negative integers (blank trailing
    /// lines aside) is reported as corruption.
    pub fn decode(raw: &str) -> Result<Self> {
        let trimmed = raw.trim_end();
        let fields: Vec<&str> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.lines().map(str::trim).collect()
        };

        if fields.len() != FIELD_NAMES.len() {
            return Err(Error::corruption(
                "state",
                format!("expected 4 integers, found {} lines", fields.len()),
            ));
        }

        let mut values = [0usize; 4];
        for (slot, (field, name)) in values.iter_mut().zip(fields.iter().zip(FIELD_NAMES)) {
            *slot = field.parse().map_err(|_| {
                Error::corruption("state", format!("{name} is not an integer: {field:?}"))
            })?;
        }

        let [bucket_size, cut_idx, drop_count, smallest_len] = values;
        Ok(Self {
            bucket_size,
            cut_idx,
            drop_count,
            smallest_len,
        })
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "bucket_size={} cut_idx={} drop_count={} smallest_len={}",
            self.bucket_size, self.cut_idx, self.drop_count, self.smallest_len
        )
    }
}

//! Bucket planner: derive the next candidate from the smallest known
//! failing input.
//!
//! For `hi = min(cut_idx + bucket_size, len)`:
//!
//! ```text
//! removed   = smallest[cut_idx .. hi]
//! candidate = smallest[.. cut_idx] ++ smallest[hi ..]
//! ```
//!
//! Always computed from the durable smallest sequence, never from an earlier
//! candidate, so a candidate file edited behind the engine's back cannot
//! desynchronize it.

/// A candidate and the slice it omits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan<T = String> {
    /// Smallest sequence minus the bucket.
    pub candidate: Vec<T>,
    /// The bucket itself, kept for inspection only.
    pub removed: Vec<T>,
}

/// Clipped `[lo, hi)` bounds of the bucket within a sequence of `len` items.
#[must_use]
pub fn bucket_bounds(len: usize, cut_idx: usize, bucket_size: usize) -> (usize, usize) {
    let lo = cut_idx.min(len);
    let hi = cut_idx.saturating_add(bucket_size).min(len);
    (lo, hi)
}

/// Split `smallest` into the next candidate and the removed bucket.
#[must_use]
pub fn plan<T: Clone>(smallest: &[T], cut_idx: usize, bucket_size: usize) -> Plan<T> {
    let (lo, hi) = bucket_bounds(smallest.len(), cut_idx, bucket_size);

    let mut candidate = Vec::with_capacity(smallest.len() - (hi - lo));
    candidate.extend_from_slice(&smallest[..lo]);
    candidate.extend_from_slice(&smallest[hi..]);

    Plan {
        candidate,
        removed: smallest[lo..hi].to_vec(),
    }
}

/// Permanently drop the bucket from `smallest`.
///
/// Equal to `plan(..).candidate`, recomputed rather than read back from the
/// candidate artifact.
#[must_use]
pub fn commit<T: Clone>(smallest: &[T], cut_idx: usize, bucket_size: usize) -> Vec<T> {
    plan(smallest, cut_idx, bucket_size).candidate
}

//! Property-based tests for the bucket planner.
//!
//! Validates:
//! 1. plan is deterministic
//! 2. len(candidate) = len(smallest) - len(removed) <= len(smallest)
//! 3. removed is exactly the clipped bucket
//! 4. candidate and removed partition smallest without reordering
//! 5. commit agrees with the candidate

use proptest::prelude::*;

use trimcase_core::planner::{bucket_bounds, commit, plan};

// =============================================================================
// Strategies
// =============================================================================

fn arb_lines() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-z]{0,4}", 0..64)
}

fn arb_cut() -> impl Strategy<Value = (usize, usize)> {
    prop_oneof![
        (0_usize..80, 0_usize..80),
        (0_usize..80, Just(usize::MAX)),
        (Just(usize::MAX), 0_usize..4),
    ]
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn plan_is_deterministic(lines in arb_lines(), (cut, bucket) in arb_cut()) {
        prop_assert_eq!(plan(&lines, cut, bucket), plan(&lines, cut, bucket));
    }

    #[test]
    fn candidate_length_is_bounded(lines in arb_lines(), (cut, bucket) in arb_cut()) {
        let p = plan(&lines, cut, bucket);
        prop_assert_eq!(p.candidate.len() + p.removed.len(), lines.len());
        prop_assert!(p.candidate.len() <= lines.len());
        prop_assert!(p.removed.len() <= bucket);
    }

    #[test]
    fn removed_is_clipped_bucket(lines in arb_lines(), (cut, bucket) in arb_cut()) {
        let p = plan(&lines, cut, bucket);
        let (lo, hi) = bucket_bounds(lines.len(), cut, bucket);
        prop_assert_eq!(&p.removed[..], &lines[lo..hi]);
    }

    #[test]
    fn plan_partitions_in_order(lines in arb_lines(), (cut, bucket) in arb_cut()) {
        let p = plan(&lines, cut, bucket);
        let (lo, _) = bucket_bounds(lines.len(), cut, bucket);

        let mut rebuilt = p.candidate[..lo].to_vec();
        rebuilt.extend(p.removed.iter().cloned());
        rebuilt.extend(p.candidate[lo..].iter().cloned());
        prop_assert_eq!(rebuilt, lines);
    }

    #[test]
    fn commit_equals_candidate(lines in arb_lines(), (cut, bucket) in arb_cut()) {
        prop_assert_eq!(commit(&lines, cut, bucket), plan(&lines, cut, bucket).candidate);
    }
}

//! Driver loop: candidate, judge, verdict, repeat.
//!
//! Strictly sequential. Each iteration rewrites the candidate from durable
//! state before invoking the judge, so a stale or edited candidate file is
//! never what gets judged. Store and judge-launch errors stop the loop at
//! once; verdicts, including unexpected non-zero exits, never do.

use tracing::info;

use crate::judge::Judge;
use crate::session::{Session, StepReport};
use crate::store::SessionStore;
use crate::Result;

/// Totals for a scripted run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Judge invocations made by this run.
    pub steps: usize,
    /// Length of the published smallest sequence.
    pub smallest_len: usize,
}

/// Start a session on `initial` and drive it to completion.
pub fn run_scripted<S, J>(
    session: &mut Session<S>,
    judge: &mut J,
    initial: Vec<String>,
) -> Result<RunReport>
where
    S: SessionStore,
    J: Judge + ?Sized,
{
    match session.start(initial)? {
        StepReport::Complete { smallest_len } => Ok(RunReport {
            steps: 0,
            smallest_len,
        }),
        StepReport::Continue(_) => drive(session, judge),
    }
}

/// Drive an existing session to completion.
pub fn drive<S, J>(session: &mut Session<S>, judge: &mut J) -> Result<RunReport>
where
    S: SessionStore,
    J: Judge + ?Sized,
{
    if let Some(StepReport::Complete { smallest_len }) = session.recover()? {
        return Ok(RunReport {
            steps: 0,
            smallest_len,
        });
    }

    let mut steps = 0;
    loop {
        let candidate = session.refresh_candidate()?;
        let verdict = judge.evaluate(&candidate)?;
        steps += 1;

        match session.mark(verdict)? {
            StepReport::Continue(state) => {
                info!(
                    step = steps,
                    verdict = %verdict,
                    smallest_len = state.smallest_len,
                    bucket_size = state.bucket_size,
                    "Step complete"
                );
            }
            StepReport::Complete { smallest_len } => {
                return Ok(RunReport {
                    steps,
                    smallest_len,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::MemorySessionStore;
    use crate::verdict::Verdict;
    use crate::Error;

    fn lines(text: &str) -> Vec<String> {
        text.chars().map(String::from).collect()
    }

    #[test]
    fn always_fail_can_empty_the_input() {
        // The floor is checked after each commit, and the second bucket
        // spans everything that is left.
        let mut session = Session::new(MemorySessionStore::new(), Config { min_test_size: 1 });
        let mut judge = |_: &[String]| -> Result<Verdict> { Ok(Verdict::Fail) };
        let report = run_scripted(&mut session, &mut judge, lines("ABCDEFGH")).unwrap();
        assert_eq!(report, RunReport { steps: 2, smallest_len: 0 });
        assert!(session.store().output().unwrap().is_empty());
    }

    #[test]
    fn fail_only_on_marker_line() {
        let mut session = Session::new(MemorySessionStore::new(), Config { min_test_size: 1 });
        let mut judge = |candidate: &[String]| -> Result<Verdict> {
            Ok(if candidate.iter().any(|l| l == "C") {
                Verdict::Fail
            } else {
                Verdict::Pass
            })
        };
        let report = run_scripted(&mut session, &mut judge, lines("ABCDEFGH")).unwrap();
        assert_eq!(report.smallest_len, 1);
        assert_eq!(session.store().output().unwrap(), lines("C").as_slice());
    }

    #[test]
    fn always_pass_keeps_everything() {
        let mut session = Session::new(MemorySessionStore::new(), Config::default());
        let mut judge = |_: &[String]| -> Result<Verdict> { Ok(Verdict::Pass) };
        let report = run_scripted(&mut session, &mut judge, lines("ABCDEFGH")).unwrap();
        assert_eq!(report.smallest_len, 8);
        // 2 buckets of 4, 4 of 2, 8 of 1
        assert_eq!(report.steps, 14);
    }

    #[test]
    fn judge_error_stops_the_loop() {
        let mut session = Session::new(MemorySessionStore::new(), Config::default());
        let mut calls = 0;
        let mut judge = |_: &[String]| -> Result<Verdict> {
            calls += 1;
            Err(Error::Io(std::io::Error::other("judge unavailable")))
        };
        assert!(run_scripted(&mut session, &mut judge, lines("ABCD")).is_err());
        assert_eq!(calls, 1);
        assert_eq!(session.store().load().unwrap(), crate::SessionState::initial(4));
    }

    #[test]
    fn drive_requires_session() {
        let mut session = Session::new(MemorySessionStore::new(), Config::default());
        let mut judge = |_: &[String]| -> Result<Verdict> { Ok(Verdict::Pass) };
        assert!(matches!(
            drive(&mut session, &mut judge).unwrap_err(),
            Error::SessionNotFound
        ));
    }

    #[test]
    fn resume_finishes_interrupted_final_commit() {
        let mut session = Session::new(MemorySessionStore::new(), Config::default());
        session.start(lines("AB")).unwrap();
        // A final `fail` reached the smallest sequence, then the process died.
        let mut store = session.into_store();
        store.tamper_smallest(lines("B"));
        let mut session = Session::new(store, Config::default());

        let mut judge = |_: &[String]| -> Result<Verdict> { panic!("judge must not run") };
        let report = drive(&mut session, &mut judge).unwrap();
        assert_eq!(report, RunReport { steps: 0, smallest_len: 1 });
        assert_eq!(session.store().output().unwrap(), lines("B").as_slice());
    }

    #[test]
    fn resume_continues_after_interrupted_commit() {
        let mut session = Session::new(MemorySessionStore::new(), Config::default());
        session.start(lines("ABCDEFGH")).unwrap();
        let mut store = session.into_store();
        store.tamper_smallest(lines("EFGH"));
        let mut session = Session::new(store, Config::default());

        let mut judge = |candidate: &[String]| -> Result<Verdict> {
            Ok(if candidate.iter().any(|l| l == "G") {
                Verdict::Fail
            } else {
                Verdict::Pass
            })
        };
        let report = drive(&mut session, &mut judge).unwrap();
        assert_eq!(report.smallest_len, 1);
        assert_eq!(session.store().output().unwrap(), lines("G").as_slice());
        assert_eq!(session.store().read_log().unwrap()[0].to_string(), "4,0,0,fail");
    }

    #[test]
    fn tiny_input_needs_no_judge() {
        let mut session = Session::new(MemorySessionStore::new(), Config::default());
        let mut judge = |_: &[String]| -> Result<Verdict> { panic!("judge must not run") };
        let report = run_scripted(&mut session, &mut judge, lines("A")).unwrap();
        assert_eq!(report, RunReport { steps: 0, smallest_len: 1 });
    }
}

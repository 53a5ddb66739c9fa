//! Session shell around the pure bisection logic.
//!
//! [`Session`] owns a [`SessionStore`] and the engine [`Config`]. Each
//! operation loads what it needs from durable storage, runs the planner or
//! the outcome transition, and persists the result before returning, so a
//! process killed between operations never loses a committed removal.
//!
//! Step order for a verdict:
//!
//! 1. finish an interrupted commit, if the smallest sequence is one `fail`
//!    ahead of the state record
//! 2. load state and smallest, check they agree
//! 3. compute the transition
//! 4. on `fail`, commit the bucket to the smallest sequence
//! 5. done: publish the output, mark finished, append log (no state write)
//! 6. otherwise: save state, write removed slice and candidate, append log
//!
//! Any write after step 4 may fail and be retried by the next `mark`; the
//! smallest sequence and the state record are the only inputs to recovery.
//!
//! `start` refuses to run over an existing session. Callers that want a
//! fresh start abandon explicitly first.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::outcome::{Transition, transition};
use crate::planner::{commit, plan};
use crate::session_log::LogSummary;
use crate::state::SessionState;
use crate::store::SessionStore;
use crate::verdict::Verdict;
use crate::{Error, Result};

/// Result of an operation that may end the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepReport {
    /// A new candidate is waiting for a verdict.
    Continue(SessionState),
    /// The smallest sequence was published to the output location.
    Complete { smallest_len: usize },
}

impl StepReport {
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }
}

/// Snapshot of a session for `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub state: SessionState,
    /// Length of the committed smallest sequence. After a final `fail` this
    /// is ahead of `state`, which is not rewritten on completion.
    pub lines_left: usize,
    pub finished: bool,
    pub min_test_size: usize,
    pub log: LogSummary,
}

/// A shrinking session over a store.
#[derive(Debug)]
pub struct Session<S> {
    store: S,
    config: Config,
}

impl<S: SessionStore> Session<S> {
    #[must_use]
    pub fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Begin a session on `initial`.
    ///
    /// Fails with `SessionAlreadyActive`, leaving the existing session
    /// untouched, when one is present. If the input is already small enough
    /// the session completes immediately.
    pub fn start(&mut self, initial: Vec<String>) -> Result<StepReport> {
        if self.store.is_active()? {
            return Err(Error::SessionAlreadyActive);
        }

        let state = self.store.create(&initial)?;
        info!(
            lines = initial.len(),
            bucket_size = state.bucket_size,
            min_test_size = self.config.min_test_size,
            "Started shrinking session"
        );

        if state.is_complete(&self.config) {
            return self.finish(&initial);
        }

        self.write_candidate(&initial, &state)?;
        Ok(StepReport::Continue(state))
    }

    /// Apply the judge's verdict on the current candidate.
    ///
    /// If an earlier `fail` was committed to the smallest sequence but its
    /// step never finished persisting, that step is completed first and its
    /// report returned instead; `verdict` is not applied, since it refers to
    /// a candidate whose removal is already durable.
    pub fn mark(&mut self, verdict: Verdict) -> Result<StepReport> {
        if let Some(report) = self.recover()? {
            warn!(verdict = %verdict, "Verdict not applied, finished an interrupted commit");
            return Ok(report);
        }

        let (state, smallest) = self.load_active()?;
        let step = transition(state, verdict, &self.config);

        debug!(
            bucket_size = state.bucket_size,
            cut_idx = state.cut_idx,
            drop_count = state.drop_count,
            smallest_len = state.smallest_len,
            verdict = %verdict,
            "Applying verdict"
        );

        let smallest = match step.commit {
            Some(removal) => {
                let shrunk = commit(&smallest, removal.cut_idx, removal.bucket_size);
                if shrunk.len() != step.next.smallest_len {
                    return Err(Error::corruption(
                        "smallest",
                        format!(
                            "commit left {} lines, state expects {}",
                            shrunk.len(),
                            step.next.smallest_len
                        ),
                    ));
                }
                self.store.save_smallest(&shrunk)?;
                shrunk
            }
            None => smallest,
        };

        self.apply(&step, &smallest)
    }

    /// Finish a `fail` step that committed its removal to the smallest
    /// sequence but was interrupted before the state record caught up.
    ///
    /// Returns `None` when there is nothing to finish. A smallest sequence
    /// whose length no `fail` from the recorded state explains is corruption.
    pub fn recover(&mut self) -> Result<Option<StepReport>> {
        let state = self.store.load()?;
        if self.store.is_finished()? {
            return Ok(None);
        }
        let smallest = self.store.load_smallest()?;
        if smallest.len() == state.smallest_len {
            return Ok(None);
        }

        let step = transition(state, Verdict::Fail, &self.config);
        if step.next.smallest_len != smallest.len() {
            return Err(length_mismatch(smallest.len(), state.smallest_len));
        }

        warn!(
            bucket_size = state.bucket_size,
            cut_idx = state.cut_idx,
            smallest_len = smallest.len(),
            "Completing interrupted commit"
        );
        self.apply(&step, &smallest).map(Some)
    }

    /// Recompute the current candidate from durable state and rewrite it.
    ///
    /// Returns the candidate lines. Any edits made to the candidate artifact
    /// since the last step are discarded.
    pub fn refresh_candidate(&mut self) -> Result<Vec<String>> {
        self.recover()?;
        let (state, smallest) = self.load_active()?;
        self.write_candidate(&smallest, &state)
    }

    /// Delete every session artifact.
    pub fn abandon(&mut self) -> Result<()> {
        self.store.delete()?;
        info!("Abandoned shrinking session");
        Ok(())
    }

    /// Persisted state, lines left, completion flag and log summary.
    pub fn status(&self) -> Result<SessionStatus> {
        let state = self.store.load()?;
        let log = self.store.read_log()?;
        Ok(SessionStatus {
            state,
            lines_left: self.store.load_smallest()?.len(),
            finished: self.store.is_finished()?,
            min_test_size: self.config.min_test_size,
            log: LogSummary::from_entries(&log),
        })
    }

    /// Persist everything a transition decided, after its removal (if any)
    /// reached the smallest sequence.
    ///
    /// The state record is written before the candidate and the log entry,
    /// so a failure part way leaves the state as the source of truth. On
    /// completion the state record is left as it was.
    fn apply(&mut self, step: &Transition, smallest: &[String]) -> Result<StepReport> {
        if step.done {
            let report = self.finish(smallest)?;
            self.store.append_log(&step.log_entry)?;
            return Ok(report);
        }

        self.store.save(&step.next)?;
        self.write_candidate(smallest, &step.next)?;
        self.store.append_log(&step.log_entry)?;
        Ok(StepReport::Continue(step.next))
    }

    /// Load state and smallest for a session that still takes verdicts.
    fn load_active(&self) -> Result<(SessionState, Vec<String>)> {
        let state = self.store.load()?;
        if self.store.is_finished()? {
            return Err(Error::SessionFinished);
        }

        let smallest = self.store.load_smallest()?;
        if smallest.len() != state.smallest_len {
            return Err(length_mismatch(smallest.len(), state.smallest_len));
        }
        Ok((state, smallest))
    }

    fn write_candidate(
        &mut self,
        smallest: &[String],
        state: &SessionState,
    ) -> Result<Vec<String>> {
        let next = plan(smallest, state.cut_idx, state.bucket_size);
        self.store.write_removed(&next.removed)?;
        self.store.write_candidate(&next.candidate)?;
        debug!(
            candidate_len = next.candidate.len(),
            removed_len = next.removed.len(),
            "Wrote candidate"
        );
        Ok(next.candidate)
    }

    fn finish(&mut self, smallest: &[String]) -> Result<StepReport> {
        self.store.publish_output(smallest)?;
        self.store.mark_finished()?;
        info!(smallest_len = smallest.len(), "Shrinking session complete");
        Ok(StepReport::Complete {
            smallest_len: smallest.len(),
        })
    }
}

fn length_mismatch(found: usize, recorded: usize) -> Error {
    Error::corruption(
        "smallest",
        format!("holds {found} lines but state records {recorded}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session_log::LogEntry;
    use crate::store::MemorySessionStore;

    fn lines(text: &str) -> Vec<String> {
        text.chars().map(String::from).collect()
    }

    fn session(min_test_size: usize) -> Session<MemorySessionStore> {
        Session::new(MemorySessionStore::new(), Config { min_test_size })
    }

    #[test]
    fn start_writes_first_candidate() {
        let mut s = session(1);
        let report = s.start(lines("ABCDEFGH")).unwrap();
        assert_eq!(report, StepReport::Continue(SessionState::initial(8)));
        assert_eq!(s.store().candidate().unwrap(), lines("EFGH").as_slice());
        assert_eq!(s.store().removed().unwrap(), lines("ABCD").as_slice());
    }

    #[test]
    fn start_rejects_active_session() {
        let mut s = session(1);
        s.start(lines("ABCD")).unwrap();
        let err = s.start(lines("WXYZ12")).unwrap_err();
        assert!(matches!(err, Error::SessionAlreadyActive));
        assert_eq!(s.store().load_smallest().unwrap(), lines("ABCD"));
        assert_eq!(s.store().load().unwrap(), SessionState::initial(4));
    }

    #[test]
    fn start_on_tiny_input_completes_immediately() {
        let mut s = session(1);
        let report = s.start(lines("A")).unwrap();
        assert_eq!(report, StepReport::Complete { smallest_len: 1 });
        assert_eq!(s.store().output().unwrap(), lines("A").as_slice());
        assert!(s.store().is_finished().unwrap());
    }

    #[test]
    fn start_at_floor_completes_immediately() {
        let mut s = session(6);
        assert!(s.start(lines("ABCDEF")).unwrap().is_done());
    }

    #[test]
    fn fail_commits_removal() {
        let mut s = session(1);
        s.start(lines("ABCDEFGH")).unwrap();
        let report = s.mark(Verdict::Fail).unwrap();

        let expected = SessionState {
            bucket_size: 4,
            cut_idx: 0,
            drop_count: 1,
            smallest_len: 4,
        };
        assert_eq!(report, StepReport::Continue(expected));
        assert_eq!(s.store().load_smallest().unwrap(), lines("EFGH"));
        assert_eq!(s.store().load().unwrap(), expected);
        assert_eq!(s.store().candidate().unwrap(), Vec::<String>::new().as_slice());
    }

    #[test]
    fn pass_keeps_smallest_and_moves_cut() {
        let mut s = session(1);
        s.start(lines("ABCDEFGH")).unwrap();
        s.mark(Verdict::Pass).unwrap();
        assert_eq!(s.store().load_smallest().unwrap(), lines("ABCDEFGH"));
        assert_eq!(s.store().load().unwrap().cut_idx, 4);
        assert_eq!(s.store().candidate().unwrap(), lines("ABCD").as_slice());
    }

    #[test]
    fn log_records_pre_transition_state() {
        let mut s = session(1);
        s.start(lines("ABCDEFGH")).unwrap();
        s.mark(Verdict::Invalid).unwrap();
        s.mark(Verdict::Fail).unwrap();

        let log = s.store().read_log().unwrap();
        let rendered: Vec<String> = log.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["4,0,0,invalid", "4,4,0,fail"]);
    }

    #[test]
    fn mark_without_session_is_not_found() {
        let mut s = session(1);
        assert!(matches!(
            s.mark(Verdict::Pass).unwrap_err(),
            Error::SessionNotFound
        ));
    }

    #[test]
    fn mark_after_completion_is_rejected() {
        let mut s = session(1);
        s.start(lines("AB")).unwrap();
        assert!(s.mark(Verdict::Fail).unwrap().is_done());
        assert!(matches!(
            s.mark(Verdict::Fail).unwrap_err(),
            Error::SessionFinished
        ));
    }

    #[test]
    fn completion_writes_no_further_state() {
        let mut s = session(1);
        s.start(lines("AB")).unwrap();
        s.mark(Verdict::Pass).unwrap();
        let before = s.store().load().unwrap();
        let report = s.mark(Verdict::Pass).unwrap();

        assert!(report.is_done());
        assert_eq!(s.store().load().unwrap(), before);
        assert_eq!(s.store().read_log().unwrap().len(), 2);
        assert_eq!(s.store().output().unwrap(), lines("AB").as_slice());
    }

    #[test]
    fn tampered_smallest_is_corruption() {
        let mut s = session(1);
        s.start(lines("ABCDEFGH")).unwrap();
        s.store.tamper_smallest(lines("ABC"));
        assert!(matches!(
            s.mark(Verdict::Fail).unwrap_err(),
            Error::PersistenceCorruption {
                artifact: "smallest",
                ..
            }
        ));
    }

    #[test]
    fn refresh_candidate_recomputes_from_durable_state() {
        let mut s = session(1);
        s.start(lines("ABCDEFGH")).unwrap();
        s.store.write_candidate(&lines("garbage")).unwrap();
        let candidate = s.refresh_candidate().unwrap();
        assert_eq!(candidate, lines("EFGH"));
        assert_eq!(s.store().candidate().unwrap(), lines("EFGH").as_slice());
    }

    #[test]
    fn abandon_then_start_again() {
        let mut s = session(1);
        s.start(lines("ABCD")).unwrap();
        s.abandon().unwrap();
        assert!(matches!(s.abandon().unwrap_err(), Error::SessionNotFound));
        s.start(lines("WXYZ")).unwrap();
        assert_eq!(s.store().load_smallest().unwrap(), lines("WXYZ"));
    }

    #[test]
    fn status_summarises_log() {
        let mut s = session(1);
        s.start(lines("ABCDEFGH")).unwrap();
        s.mark(Verdict::Pass).unwrap();
        s.mark(Verdict::Fail).unwrap();

        let status = s.status().unwrap();
        assert!(!status.finished);
        assert_eq!(status.min_test_size, 1);
        assert_eq!(status.log.steps, 2);
        assert_eq!(status.log.fails, 1);
        assert_eq!(status.state.smallest_len, 4);
        assert_eq!(status.lines_left, 4);
    }

    /// Memory store whose next `save`, `append_log` or `publish_output`
    /// fails once with an I/O error.
    #[derive(Debug, Default)]
    struct FlakyStore {
        inner: MemorySessionStore,
        fail_save: bool,
        fail_append_log: bool,
        fail_publish: bool,
    }

    fn injected() -> Error {
        Error::Io(std::io::Error::other("injected write failure"))
    }

    impl SessionStore for FlakyStore {
        fn is_active(&self) -> Result<bool> {
            self.inner.is_active()
        }
        fn create(&mut self, initial: &[String]) -> Result<SessionState> {
            self.inner.create(initial)
        }
        fn load(&self) -> Result<SessionState> {
            self.inner.load()
        }
        fn save(&mut self, state: &SessionState) -> Result<()> {
            if std::mem::take(&mut self.fail_save) {
                return Err(injected());
            }
            self.inner.save(state)
        }
        fn delete(&mut self) -> Result<()> {
            self.inner.delete()
        }
        fn load_smallest(&self) -> Result<Vec<String>> {
            self.inner.load_smallest()
        }
        fn save_smallest(&mut self, smallest: &[String]) -> Result<()> {
            self.inner.save_smallest(smallest)
        }
        fn append_log(&mut self, entry: &LogEntry) -> Result<()> {
            if std::mem::take(&mut self.fail_append_log) {
                return Err(injected());
            }
            self.inner.append_log(entry)
        }
        fn read_log(&self) -> Result<Vec<LogEntry>> {
            self.inner.read_log()
        }
        fn write_removed(&mut self, removed: &[String]) -> Result<()> {
            self.inner.write_removed(removed)
        }
        fn write_candidate(&mut self, candidate: &[String]) -> Result<()> {
            self.inner.write_candidate(candidate)
        }
        fn publish_output(&mut self, smallest: &[String]) -> Result<()> {
            if std::mem::take(&mut self.fail_publish) {
                return Err(injected());
            }
            self.inner.publish_output(smallest)
        }
        fn mark_finished(&mut self) -> Result<()> {
            self.inner.mark_finished()
        }
        fn is_finished(&self) -> Result<bool> {
            self.inner.is_finished()
        }
    }

    fn flaky_session(min_test_size: usize) -> Session<FlakyStore> {
        Session::new(FlakyStore::default(), Config { min_test_size })
    }

    #[test]
    fn failed_state_save_is_finished_by_next_mark() {
        let mut s = flaky_session(1);
        s.start(lines("ABCDEFGH")).unwrap();
        s.store.fail_save = true;
        assert!(matches!(s.mark(Verdict::Fail).unwrap_err(), Error::Io(_)));
        assert_eq!(s.store().load_smallest().unwrap(), lines("EFGH"));
        assert_eq!(s.store().load().unwrap(), SessionState::initial(8));

        // The user retries the same verdict.
        let report = s.mark(Verdict::Fail).unwrap();
        let expected = SessionState {
            bucket_size: 4,
            cut_idx: 0,
            drop_count: 1,
            smallest_len: 4,
        };
        assert_eq!(report, StepReport::Continue(expected));
        assert_eq!(s.store().load().unwrap(), expected);
        assert_eq!(s.store().load_smallest().unwrap(), lines("EFGH"));
        let rendered: Vec<String> = s
            .store()
            .read_log()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(rendered, vec!["4,0,0,fail"]);

        // Back to normal stepping.
        s.mark(Verdict::Pass).unwrap();
        assert_eq!(s.store().load().unwrap().bucket_size, 2);
    }

    #[test]
    fn failed_state_save_is_finished_by_refresh() {
        let mut s = flaky_session(1);
        s.start(lines("ABCDEFGH")).unwrap();
        s.store.fail_save = true;
        s.mark(Verdict::Fail).unwrap_err();

        let candidate = s.refresh_candidate().unwrap();
        assert_eq!(candidate, Vec::<String>::new());
        assert_eq!(s.store().load().unwrap().smallest_len, 4);
        assert_eq!(s.store().read_log().unwrap().len(), 1);
    }

    #[test]
    fn failed_log_append_leaves_state_and_candidate_current() {
        let mut s = flaky_session(1);
        s.start(lines("ABCDEFGH")).unwrap();
        s.store.fail_append_log = true;
        assert!(matches!(s.mark(Verdict::Pass).unwrap_err(), Error::Io(_)));

        assert_eq!(s.store().load().unwrap().cut_idx, 4);
        assert_eq!(s.store().inner.candidate().unwrap(), lines("ABCD").as_slice());
        assert!(s.store().read_log().unwrap().is_empty());

        let report = s.mark(Verdict::Fail).unwrap();
        assert_eq!(s.store().load_smallest().unwrap(), lines("ABCD"));
        assert_eq!(
            report,
            StepReport::Continue(SessionState {
                bucket_size: 2,
                cut_idx: 0,
                drop_count: 0,
                smallest_len: 4,
            })
        );
    }

    #[test]
    fn failed_publish_on_final_fail_is_finished_by_next_mark() {
        let mut s = flaky_session(1);
        s.start(lines("AB")).unwrap();
        s.store.fail_publish = true;
        assert!(matches!(s.mark(Verdict::Fail).unwrap_err(), Error::Io(_)));
        assert!(!s.store().is_finished().unwrap());
        assert_eq!(s.store().load_smallest().unwrap(), lines("B"));

        let report = s.mark(Verdict::Fail).unwrap();
        assert_eq!(report, StepReport::Complete { smallest_len: 1 });
        assert!(s.store().is_finished().unwrap());
        assert_eq!(s.store().inner.output().unwrap(), lines("B").as_slice());
        assert_eq!(s.store().read_log().unwrap().len(), 1);
    }

    #[test]
    fn failed_publish_without_commit_is_retried() {
        let mut s = flaky_session(1);
        s.start(lines("AB")).unwrap();
        s.mark(Verdict::Pass).unwrap();
        s.store.fail_publish = true;
        s.mark(Verdict::Pass).unwrap_err();
        assert_eq!(s.store().read_log().unwrap().len(), 1);

        assert!(s.mark(Verdict::Pass).unwrap().is_done());
        assert_eq!(s.store().inner.output().unwrap(), lines("AB").as_slice());
        assert_eq!(s.store().read_log().unwrap().len(), 2);
    }

    #[test]
    fn status_reports_lines_left_after_final_fail() {
        let mut s = session(1);
        s.start(lines("AB")).unwrap();
        s.mark(Verdict::Fail).unwrap();

        let status = s.status().unwrap();
        assert!(status.finished);
        assert_eq!(status.lines_left, 1);
        assert_eq!(status.state.smallest_len, 2);
    }
}

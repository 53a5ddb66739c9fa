//! In-memory session store for tests and embedding.

use super::SessionStore;
use crate::session_log::LogEntry;
use crate::state::SessionState;
use crate::{Error, Result};

#[derive(Debug, Clone)]
struct Artifacts {
    smallest: Vec<String>,
    state: SessionState,
    log: Vec<LogEntry>,
    removed: Vec<String>,
    finished: bool,
}

/// Session store held entirely in memory.
///
/// The candidate and the output outlive [`SessionStore::delete`], as their
/// files do for [`super::FsSessionStore`].
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    session: Option<Artifacts>,
    candidate: Option<Vec<String>>,
    output: Option<Vec<String>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last candidate written, if any.
    #[must_use]
    pub fn candidate(&self) -> Option<&[String]> {
        self.candidate.as_deref()
    }

    /// Final output, once published.
    #[must_use]
    pub fn output(&self) -> Option<&[String]> {
        self.output.as_deref()
    }

    /// Last removed slice, while a session is active.
    #[must_use]
    pub fn removed(&self) -> Option<&[String]> {
        self.session.as_ref().map(|s| s.removed.as_slice())
    }

    /// Overwrite the stored smallest sequence without touching the state,
    /// the way an external edit of the artifact would.
    pub fn tamper_smallest(&mut self, smallest: Vec<String>) {
        if let Some(session) = self.session.as_mut() {
            session.smallest = smallest;
        }
    }

    fn session(&self) -> Result<&Artifacts> {
        self.session.as_ref().ok_or(Error::SessionNotFound)
    }

    fn session_mut(&mut self) -> Result<&mut Artifacts> {
        self.session.as_mut().ok_or(Error::SessionNotFound)
    }
}

impl SessionStore for MemorySessionStore {
    fn is_active(&self) -> Result<bool> {
        Ok(self.session.is_some())
    }

    fn create(&mut self, initial: &[String]) -> Result<SessionState> {
        if self.session.is_some() {
            return Err(Error::SessionAlreadyActive);
        }
        let state = SessionState::initial(initial.len());
        self.session = Some(Artifacts {
            smallest: initial.to_vec(),
            state,
            log: Vec::new(),
            removed: Vec::new(),
            finished: false,
        });
        Ok(state)
    }

    fn load(&self) -> Result<SessionState> {
        Ok(self.session()?.state)
    }

    fn save(&mut self, state: &SessionState) -> Result<()> {
        self.session_mut()?.state = *state;
        Ok(())
    }

    fn delete(&mut self) -> Result<()> {
        self.session.take().map(|_| ()).ok_or(Error::SessionNotFound)
    }

    fn load_smallest(&self) -> Result<Vec<String>> {
        Ok(self.session()?.smallest.clone())
    }

    fn save_smallest(&mut self, smallest: &[String]) -> Result<()> {
        self.session_mut()?.smallest = smallest.to_vec();
        Ok(())
    }

    fn append_log(&mut self, entry: &LogEntry) -> Result<()> {
        self.session_mut()?.log.push(*entry);
        Ok(())
    }

    fn read_log(&self) -> Result<Vec<LogEntry>> {
        Ok(self.session()?.log.clone())
    }

    fn write_removed(&mut self, removed: &[String]) -> Result<()> {
        self.session_mut()?.removed = removed.to_vec();
        Ok(())
    }

    fn write_candidate(&mut self, candidate: &[String]) -> Result<()> {
        self.candidate = Some(candidate.to_vec());
        Ok(())
    }

    fn publish_output(&mut self, smallest: &[String]) -> Result<()> {
        self.output = Some(smallest.to_vec());
        Ok(())
    }

    fn mark_finished(&mut self) -> Result<()> {
        self.session_mut()?.finished = true;
        Ok(())
    }

    fn is_finished(&self) -> Result<bool> {
        Ok(self.session.as_ref().is_some_and(|s| s.finished))
    }
}

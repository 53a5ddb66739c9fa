//! Session persistence.
//!
//! [`SessionStore`] is the durable side of a session: the smallest known
//! failing input, the state record, the audit log and the write-only
//! diagnostic artifacts. The engine is generic over it so the bisection can
//! run against [`MemorySessionStore`] in tests and [`FsSessionStore`] for
//! real.
//!
//! Having session artifacts at all is what makes a session "active". There is
//! no locking: callers must serialize invocations against one store.

mod fs;
mod memory;

pub use fs::FsSessionStore;
pub use memory::MemorySessionStore;

use crate::Result;
use crate::session_log::LogEntry;
use crate::state::SessionState;

/// Durable session storage.
pub trait SessionStore {
    /// Whether session artifacts exist.
    fn is_active(&self) -> Result<bool>;

    /// Persist `initial` as the smallest sequence and return the fresh state
    /// derived from it, also persisted.
    ///
    /// Fails with `SessionAlreadyActive` without touching anything if
    /// artifacts already exist.
    fn create(&mut self, initial: &[String]) -> Result<SessionState>;

    /// Load the state record. `SessionNotFound` when inactive,
    /// `PersistenceCorruption` when the record does not decode.
    fn load(&self) -> Result<SessionState>;

    /// Replace the state record. Readers see either the old or the new
    /// record, never a mix.
    fn save(&mut self, state: &SessionState) -> Result<()>;

    /// Remove every session artifact. `SessionNotFound` when inactive.
    fn delete(&mut self) -> Result<()>;

    /// Load the smallest known failing input.
    fn load_smallest(&self) -> Result<Vec<String>>;

    /// Replace the smallest known failing input, with the same all-or-nothing
    /// guarantee as [`SessionStore::save`].
    fn save_smallest(&mut self, smallest: &[String]) -> Result<()>;

    /// Append one decision point to the audit log.
    fn append_log(&mut self, entry: &LogEntry) -> Result<()>;

    /// Read back the audit log, oldest first.
    fn read_log(&self) -> Result<Vec<LogEntry>>;

    /// Overwrite the removed-slice diagnostic. Never read back.
    fn write_removed(&mut self, removed: &[String]) -> Result<()>;

    /// Overwrite the candidate the judge inspects.
    fn write_candidate(&mut self, candidate: &[String]) -> Result<()>;

    /// Copy the final smallest sequence to the output location.
    fn publish_output(&mut self, smallest: &[String]) -> Result<()>;

    /// Record that the completion predicate was met.
    fn mark_finished(&mut self) -> Result<()>;

    /// Whether [`SessionStore::mark_finished`] ran for this session.
    fn is_finished(&self) -> Result<bool>;
}

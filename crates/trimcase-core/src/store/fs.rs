//! Directory-backed session store.
//!
//! Layout under the session directory:
//!
//! ```text
//! smallest        smallest known failing input, one line per record
//! state           four integers: bucket_size, cut_idx, drop_count, smallest_len
//! log             bucket_size,cut_idx,drop_count,verdict per decision point
//! removed-slice   last bucket cut out (diagnostic only)
//! finished        present once the session completed
//! ```
//!
//! The candidate and the final output live outside the directory, at paths
//! the judge knows.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::SessionStore;
use crate::config::SessionSettings;
use crate::lines::{parse_lines, render_lines};
use crate::session_log::{LogEntry, parse_log};
use crate::state::SessionState;
use crate::{Error, Result};

const SMALLEST: &str = "smallest";
const STATE: &str = "state";
const LOG: &str = "log";
const REMOVED: &str = "removed-slice";
const FINISHED: &str = "finished";

/// Session store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FsSessionStore {
    dir: PathBuf,
    candidate: PathBuf,
    output: PathBuf,
}

impl FsSessionStore {
    #[must_use]
    pub fn new(
        dir: impl Into<PathBuf>,
        candidate: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            dir: dir.into(),
            candidate: candidate.into(),
            output: output.into(),
        }
    }

    /// Store at the locations named in `[session]`.
    #[must_use]
    pub fn from_settings(settings: &SessionSettings) -> Self {
        Self::new(&settings.dir, &settings.candidate, settings.output_path())
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn candidate_path(&self) -> &Path {
        &self.candidate
    }

    #[must_use]
    pub fn output_path(&self) -> &Path {
        &self.output
    }

    fn artifact(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_active()? {
            Ok(())
        } else {
            Err(Error::SessionNotFound)
        }
    }

    /// Create the session directory and write its first artifacts with
    /// `write`. On failure the directory is removed again.
    fn create_with(
        &mut self,
        initial: &[String],
        write: impl Fn(&Path, &str) -> io::Result<()>,
    ) -> Result<SessionState> {
        if let Some(parent) = self.dir.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        match fs::create_dir(&self.dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(Error::SessionAlreadyActive);
            }
            Err(e) => return Err(e.into()),
        }

        let state = SessionState::initial(initial.len());
        if let Err(err) = self.populate(initial, &state, write) {
            // A directory without both artifacts would read as a corrupt session.
            if let Err(cleanup) = fs::remove_dir_all(&self.dir) {
                warn!(
                    dir = %self.dir.display(),
                    error = %cleanup,
                    "Failed to remove partially created session directory"
                );
            }
            return Err(err);
        }
        debug!(dir = %self.dir.display(), lines = initial.len(), "Created session directory");
        Ok(state)
    }

    /// Write the artifacts of a fresh session into its new directory.
    fn populate(
        &self,
        initial: &[String],
        state: &SessionState,
        write: impl Fn(&Path, &str) -> io::Result<()>,
    ) -> Result<()> {
        write(&self.artifact(SMALLEST), &render_lines(initial))?;
        write(&self.artifact(STATE), &state.encode())?;
        Ok(())
    }

    /// Read an artifact that must exist inside an active session.
    fn read_required(&self, name: &'static str) -> Result<String> {
        self.ensure_active()?;
        match fs::read_to_string(self.artifact(name)) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(Error::corruption(name, "missing from session directory"))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Write through a sibling temp file and rename over the target.
fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let mut file = File::create(&tmp_path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, path)
}

impl SessionStore for FsSessionStore {
    fn is_active(&self) -> Result<bool> {
        Ok(self.dir.try_exists()?)
    }

    fn create(&mut self, initial: &[String]) -> Result<SessionState> {
        self.create_with(initial, write_atomic)
    }

    fn load(&self) -> Result<SessionState> {
        SessionState::decode(&self.read_required(STATE)?)
    }

    fn save(&mut self, state: &SessionState) -> Result<()> {
        self.ensure_active()?;
        write_atomic(&self.artifact(STATE), &state.encode())?;
        Ok(())
    }

    fn delete(&mut self) -> Result<()> {
        self.ensure_active()?;
        fs::remove_dir_all(&self.dir)?;
        Ok(())
    }

    fn load_smallest(&self) -> Result<Vec<String>> {
        Ok(parse_lines(&self.read_required(SMALLEST)?))
    }

    fn save_smallest(&mut self, smallest: &[String]) -> Result<()> {
        self.ensure_active()?;
        write_atomic(&self.artifact(SMALLEST), &render_lines(smallest))?;
        Ok(())
    }

    fn append_log(&mut self, entry: &LogEntry) -> Result<()> {
        self.ensure_active()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.artifact(LOG))?;
        writeln!(file, "{entry}")?;
        Ok(())
    }

    fn read_log(&self) -> Result<Vec<LogEntry>> {
        self.ensure_active()?;
        match fs::read_to_string(self.artifact(LOG)) {
            Ok(content) => parse_log(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_removed(&mut self, removed: &[String]) -> Result<()> {
        self.ensure_active()?;
        fs::write(self.artifact(REMOVED), render_lines(removed))?;
        Ok(())
    }

    fn write_candidate(&mut self, candidate: &[String]) -> Result<()> {
        write_atomic(&self.candidate, &render_lines(candidate))?;
        Ok(())
    }

    fn publish_output(&mut self, smallest: &[String]) -> Result<()> {
        write_atomic(&self.output, &render_lines(smallest))?;
        Ok(())
    }

    fn mark_finished(&mut self) -> Result<()> {
        self.ensure_active()?;
        fs::write(self.artifact(FINISHED), "")?;
        Ok(())
    }

    fn is_finished(&self) -> Result<bool> {
        Ok(self.artifact(FINISHED).try_exists()?)
    }
}

//! trimcase-core: Core library for trimcase
//!
//! trimcase reduces a failing input, treated as an opaque sequence of lines,
//! to a small subsequence that still fails. A judge (a person running
//! `trimcase mark`, or a script) classifies each candidate as `pass`, `fail`
//! or `invalid`; the engine turns that verdict stream into a resumable,
//! crash-safe bisection.
//!
//! # Architecture
//!
//! ```text
//! SessionStore ──(smallest, state)──▶ planner ──candidate──▶ Judge
//!      ▲                                                       │
//!      └──── commit / save / log ◀── outcome::transition ◀─verdict
//! ```
//!
//! # Modules
//!
//! - `state`: persisted `SessionState` record and completion predicate
//! - `planner`: pure candidate/removed-slice derivation
//! - `outcome`: pure verdict state machine
//! - `session_log`: audit records of decision points
//! - `store`: `SessionStore` trait with filesystem and in-memory backends
//! - `session`: the shell that applies transitions against a store
//! - `judge`: judge trait and external-command judge
//! - `driver`: scripted driver loop
//! - `config`: engine config and `trimcase.toml` settings
//! - `logging`: tracing subscriber setup
//!
//! # Safety
//!
//! This crate forbids unsafe code.

#![forbid(unsafe_code)]

pub mod config;
pub mod driver;
pub mod error;
pub mod judge;
pub mod lines;
pub mod logging;
pub mod outcome;
pub mod planner;
pub mod session;
pub mod session_log;
pub mod state;
pub mod store;
pub mod verdict;

pub use config::Config;
pub use error::{Error, Result};
pub use session::{Session, StepReport};
pub use state::SessionState;
pub use verdict::Verdict;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

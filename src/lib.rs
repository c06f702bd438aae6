//! cobbler - an AI code-generation orchestrator.
//!
//! Repeatedly asks an LLM to propose discrete coding tasks for a target
//! repository and executes them one at a time in isolated git worktrees,
//! committing results back into the project's source history. The core
//! logic (subprocess running, VCS/issue-store adapters, context assembly,
//! prompting, scheduling, worktree execution, and the generation lifecycle)
//! lives in the `cobbler-*` workspace crates; this crate is the CLI façade
//! (C13) that wires them together.

/// Returns the cobbler version with embedded git revision.
/// Format: "{`CARGO_PKG_VERSION}+{GIT_SHA`}"
#[must_use]
pub fn cobbler_version() -> String {
    format!("{}+{}", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"))
}

pub mod cli;
pub mod doctor;
pub mod error;
pub mod exit_codes;
pub mod lock;
pub mod logging;

pub use error::{CobblerError, UserFriendlyError};
pub use exit_codes::ExitCode;

//! Top-level error type for the CLI façade (C13).
//!
//! Every `cobbler-*` library crate returns `Result<T, E>` with its own local
//! error type and never calls `std::process::exit` (SPEC_FULL.md A.1);
//! `CobblerError` wraps those local types one level up so the CLI can map a
//! single enum to an exit code and a user-facing message, matching the
//! semantic error kinds of spec.md sec 7 (`config`, `environment`,
//! `validation`, `transient`, `timeout`, `conflict`, `invariant`).

use cobbler_config::ConfigError;
use cobbler_generation::GenerationError;
use cobbler_issues::IssueError;
use cobbler_runner::RunnerError;
use cobbler_vcs::VcsError;

#[derive(Debug, thiserror::Error)]
pub enum CobblerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("required tool not found on PATH: {tool}")]
    Environment { tool: String },

    #[error("active credentials could not be located at {path}")]
    MissingCredentials { path: String },

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Issue(#[from] IssueError),

    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("another generation is already active: {0}")]
    LockHeld(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// A `(exit_code, short_kind)` pair plus the message shown to the operator,
/// in the style of the teacher crate's `UserFriendlyError` /
/// `error_to_exit_code_and_kind`.
pub struct UserFriendlyError {
    pub kind: &'static str,
    pub exit_code: i32,
    pub message: String,
}

impl CobblerError {
    /// Maps this error to the semantic kind of spec.md sec 7 and an exit
    /// code (sec 6.5: "Exit code 0 on success, non-zero on fatal failure").
    #[must_use]
    pub fn display_for_user(&self) -> UserFriendlyError {
        let (kind, exit_code) = match self {
            Self::Config(_) => ("config", crate::exit_codes::codes::CONFIG),
            Self::Environment { .. } | Self::MissingCredentials { .. } => ("environment", crate::exit_codes::codes::ENVIRONMENT),
            Self::LockHeld(_) => ("invariant", crate::exit_codes::codes::LOCK_HELD),
            Self::Vcs(err) if err.is_conflict() => ("conflict", crate::exit_codes::codes::CONFLICT),
            Self::Generation(GenerationError::Validation(_)) => ("validation", crate::exit_codes::codes::VALIDATION),
            Self::Generation(GenerationError::DirtyWorkingTree) => ("config", crate::exit_codes::codes::CONFIG),
            Self::Generation(GenerationError::NoActiveGeneration { .. } | GenerationError::AmbiguousActiveGeneration(_)) => {
                ("invariant", crate::exit_codes::codes::INVARIANT)
            }
            Self::Generation(GenerationError::Llm(cobbler_llm::LlmError::Timeout)) => ("timeout", crate::exit_codes::codes::TIMEOUT),
            Self::Generation(_) | Self::Vcs(_) | Self::Issue(_) | Self::Runner(_) => ("transient", crate::exit_codes::codes::TRANSIENT),
            Self::Other(_) => ("unknown", crate::exit_codes::codes::UNKNOWN),
        };
        UserFriendlyError {
            kind,
            exit_code,
            message: self.to_string(),
        }
    }
}

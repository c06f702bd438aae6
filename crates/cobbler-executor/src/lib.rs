//! Worktree executor (spec.md sec 4.8): runs one task end to end in an
//! isolated git worktree, from context assembly through merge or reset.
//! Holds no generation-lifetime state of its own — every call is supplied
//! the issue and [`GenerationContext`] it needs by the caller (C9).

mod error;
mod executor;
mod types;

pub use error::ExecutorError;
pub use executor::WorktreeExecutor;
pub use types::{ExecuteOutcome, GenerationContext};

use std::collections::HashSet;

use camino::Utf8PathBuf;

/// Terminal outcome of one task execution attempt (spec.md sec 4.8).
/// `Reset` covers every failure path the executor recovers from on its own
/// (validation rejection, timeout, parse failure, no-op diff, merge
/// conflict) — the caller (C9) is responsible for tracking a failed-this-
/// cycle set so the same task isn't re-picked forever within one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteOutcome {
    Success,
    Reset,
}

/// Everything the executor needs about the generation it is running a task
/// for, supplied by the caller (C9) so the executor itself holds no
/// generation-lifetime state (spec.md sec 4.8, 4.9).
pub struct GenerationContext {
    /// Directory of the checked-out generation branch (the repo root, or a
    /// dedicated generation worktree — the executor merges into whatever is
    /// checked out here).
    pub generation_dir: Utf8PathBuf,
    pub generation_branch: String,
    /// `<base>` used to name per-task branches: `task/<base>-<number>`
    /// (spec.md sec 3, 4.8) — the generation's name.
    pub base: String,
    pub worktree_root: Utf8PathBuf,
    pub release_scope: Option<HashSet<String>>,
    pub source_dirs: Vec<String>,
    pub source_extensions: HashSet<String>,
    pub max_context_bytes: usize,
}

//! Scratch-directory layout (spec §4.11, §6.6 `cobbler.dir`).

use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;

// Thread-local override used only in tests to avoid process-global env races.
thread_local! {
    static THREAD_ROOT: RefCell<Option<Utf8PathBuf>> = const { RefCell::new(None) };
}

/// Resolve the scratch root:
/// 1) thread-local override (tests use this)
/// 2) env `COBBLER_DIR` (opt-in for users/CI)
/// 3) the configured `cobbler.dir`, defaulting to `.cobbler`
#[must_use]
pub fn scratch_root(configured: Option<&str>) -> Utf8PathBuf {
    if let Some(tl) = THREAD_ROOT.with(|tl| tl.borrow().clone()) {
        return tl;
    }
    if let Ok(p) = std::env::var("COBBLER_DIR") {
        return Utf8PathBuf::from(p);
    }
    Utf8PathBuf::from(configured.unwrap_or(".cobbler"))
}

/// `<scratch>/base-branch`
#[must_use]
pub fn base_branch_file(scratch: &Utf8Path) -> Utf8PathBuf {
    scratch.join("base-branch")
}

/// `<scratch>/analysis.yaml`
#[must_use]
pub fn analysis_file(scratch: &Utf8Path) -> Utf8PathBuf {
    scratch.join("analysis.yaml")
}

/// `<scratch>/measure.yaml`
#[must_use]
pub fn measure_log_file(scratch: &Utf8Path) -> Utf8PathBuf {
    scratch.join("measure.yaml")
}

/// `<scratch>/measure-<timestamp>.yaml`
#[must_use]
pub fn measure_raw_file(scratch: &Utf8Path, timestamp: &str) -> Utf8PathBuf {
    scratch.join(format!("measure-{timestamp}.yaml"))
}

/// `<scratch>/history`
#[must_use]
pub fn history_dir(scratch: &Utf8Path) -> Utf8PathBuf {
    scratch.join("history")
}

/// `<scratch>/history/<timestamp>-<phase>-<suffix>`
#[must_use]
pub fn history_file(scratch: &Utf8Path, timestamp: &str, phase: &str, suffix: &str) -> Utf8PathBuf {
    history_dir(scratch).join(format!("{timestamp}-{phase}-{suffix}"))
}

/// mkdir -p; treat `AlreadyExists` as success (removes TOCTTOU races).
pub fn ensure_dir_all<P: AsRef<std::path::Path>>(p: P) -> std::io::Result<()> {
    match std::fs::create_dir_all(&p) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

/// Deterministic worktree path for a task: `<worktree_root>/<issue_number>`.
#[must_use]
pub fn worktree_path(worktree_root: &Utf8Path, issue_number: u64) -> Utf8PathBuf {
    worktree_root.join(issue_number.to_string())
}

/// Test helper: give this test an isolated scratch root under the system
/// temp dir, held alive for the test's duration.
#[cfg(any(test, feature = "test-utils"))]
#[must_use]
pub fn with_isolated_root() -> tempfile::TempDir {
    let td = tempfile::TempDir::new().expect("create temp scratch root");
    let p = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
    THREAD_ROOT.with(|tl| *tl.borrow_mut() = Some(p));
    td
}

//! `issues:{init,reset}` — manage the labels the scheduler depends on,
//! independent of any active generation (spec.md §4.3, §6.5).

use cobbler_config::Config;
use cobbler_issues::{IssueStore, LABEL_IN_PROGRESS, LABEL_READY};

use crate::error::CobblerError;

/// Ensure the two canonical labels exist on the issue store.
pub async fn init(issues: &dyn IssueStore, _config: &Config) -> Result<(), CobblerError> {
    issues
        .ensure_labels(&[
            (LABEL_READY, "0e8a16", "unblocked, eligible to be picked"),
            (LABEL_IN_PROGRESS, "fbca04", "claimed by the current worktree executor"),
        ])
        .await?;
    println!("labels ensured: {LABEL_READY}, {LABEL_IN_PROGRESS}");
    Ok(())
}

/// Clear `in-progress` labels left behind by an interrupted run, moving
/// those issues back to `ready` (spec.md §4.9.3 "orphaned in-progress
/// labels").
pub async fn reset(issues: &dyn IssueStore, _config: &Config) -> Result<(), CobblerError> {
    let stuck = issues.list_open_issues_with_label(LABEL_IN_PROGRESS).await?;
    let mut cleared = 0u32;
    for issue in stuck {
        issues.remove_label(issue.number, LABEL_IN_PROGRESS).await?;
        issues.add_label(issue.number, LABEL_READY).await?;
        cleared += 1;
    }
    println!("cleared {cleared} orphaned in-progress label(s)");
    Ok(())
}

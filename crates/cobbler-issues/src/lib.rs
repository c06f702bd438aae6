//! REST adapter over the remote issue store (spec.md sec 4.3): issue
//! create/list/label/close, front-matter parsing, and repo-identity
//! detection. No scheduling logic lives here — see `cobbler-scheduler`.

mod client;
mod error;
mod front_matter;
mod repo_identity;
mod types;

pub use client::{GithubIssueStore, IssueStore};
pub use error::IssueError;
pub use front_matter::{IssueFrontMatter, format_issue_body, parse_issue_front_matter};
pub use repo_identity::detect_repo_identity;
pub use types::{
    FileEntry, Issue, IssueState, LABEL_IN_PROGRESS, LABEL_READY, RequirementItem, TaskDescription, generation_label,
};

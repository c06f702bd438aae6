use serde::{Deserialize, Serialize};

/// An issue as returned by the remote store, restricted to the fields this
/// workspace actually consumes (spec.md sec 6.2).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    pub state: IssueState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

/// The three canonical labels the scheduler reads/writes (spec.md sec 3, 4.3).
pub const LABEL_READY: &str = "ready";
pub const LABEL_IN_PROGRESS: &str = "in-progress";

/// The generation label for a given generation name: `<prefix>-gen-<generation>`.
#[must_use]
pub fn generation_label(prefix: &str, generation: &str) -> String {
    format!("{prefix}-gen-{generation}")
}

/// One file an issue's description declares it will touch (spec.md sec 3
/// "Description schema").
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileEntry {
    pub path: String,
    pub action: String,
}

/// A single requirement, acceptance criterion, or design decision entry
/// (spec.md sec 3 "Description schema").
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RequirementItem {
    pub id: String,
    pub text: String,
}

/// The typed body of an issue, the YAML description that follows the
/// front-matter block (spec.md sec 3 "Description schema", sec 4.8, 4.9.2).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskDescription {
    pub deliverable_type: String,
    #[serde(default)]
    pub required_reading: Vec<String>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
    #[serde(default)]
    pub requirements: Vec<RequirementItem>,
    #[serde(default)]
    pub acceptance_criteria: Vec<RequirementItem>,
    #[serde(default)]
    pub design_decisions: Vec<RequirementItem>,
}

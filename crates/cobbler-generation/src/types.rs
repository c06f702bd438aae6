use std::collections::HashSet;

use camino::Utf8PathBuf;
use cobbler_issues::{FileEntry, RequirementItem};
use serde::{Deserialize, Serialize};

/// Lifecycle state of one generation (spec.md sec 3 "Lifecycle states").
/// `Active` covers both the propose and execute sub-phases of a cycle — C9
/// does not distinguish them at this granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Unstarted,
    Active,
    Finished,
    Merged,
    Abandoned,
}

/// Identity of one running or resumed generation. The branch name IS the
/// generation name (spec.md sec 3 "Identity"/"Branch").
#[derive(Debug, Clone)]
pub struct GenerationHandle {
    pub name: String,
    pub branch: String,
    pub base_branch: String,
}

/// Inputs fixed for the lifetime of one lifecycle call, resolved by the
/// caller (C13) from [`cobbler_config::Config`] so this crate stays
/// decoupled from the configuration schema (spec.md sec 6.6).
pub struct GenerationParams {
    pub prefix: String,
    pub repo_root: Utf8PathBuf,
    pub worktree_root: Utf8PathBuf,
    pub cycles: u32,
    pub max_measure_issues: u32,
    pub max_measure_retries: u32,
    pub max_requirements_per_task: u32,
    pub enforce_measure_validation: bool,
    pub estimated_lines_min: u32,
    pub estimated_lines_max: u32,
    pub max_context_bytes: usize,
    pub max_stitch_issues: u32,
    pub max_stitch_issues_per_cycle: u32,
    pub source_dirs: Vec<String>,
    pub source_extensions: HashSet<String>,
    pub release_scope: Option<HashSet<String>>,
    pub configured_releases: Vec<String>,
    /// Operator override for `resume` when more than one candidate branch
    /// matches the prefix glob.
    pub explicit_branch: Option<String>,
    /// Rendered at `start` only (spec.md sec 4.9.1 step 6).
    pub seed_templates: Vec<SeedTemplate>,
    pub version: String,
    pub module_path: String,
}

/// One seed file rendered when a generation starts: `content` is rendered by
/// substituting `{{.Version}}`/`{{.ModulePath}}`, then written to `dest_path`
/// (spec.md sec 4.9.1 step 6).
#[derive(Debug, Clone)]
pub struct SeedTemplate {
    pub content: String,
    pub dest_path: Utf8PathBuf,
}

/// One task proposed by the propose (measure) LLM invocation, before it
/// becomes an issue (spec.md sec 4.9.2, sec 3 "Description schema").
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProposedTask {
    pub index: i64,
    #[serde(default = "default_depends_on")]
    pub depends_on: i64,
    pub title: String,
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

fn default_depends_on() -> i64 {
    -1
}

/// Tally of one `run` call, returned to the caller for reporting (spec.md
/// sec 6.5 `generator:run`, SPEC_FULL.md sec B `generator status`).
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub cycles_completed: u32,
    pub tasks_proposed: u32,
    pub tasks_executed: u32,
    pub tasks_reset: u32,
}

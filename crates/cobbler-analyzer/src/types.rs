use serde::{Deserialize, Serialize};

/// Advisory cross-artifact consistency snapshot (spec.md sec 4.10). Every
/// field is a list of offender ids; an empty list means that check found
/// nothing to report. Never blocks execution — C9 writes this once per
/// cycle and C4 may surface it to the operator via free-text notes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    pub orphaned_requirement_docs: Vec<String>,
    pub releases_without_test_suite: Vec<String>,
    pub orphaned_test_suites: Vec<String>,
    pub broken_touchpoints: Vec<String>,
    pub use_cases_not_in_roadmap: Vec<String>,
    pub schema_errors: Vec<String>,
    pub constitution_drift: Vec<String>,
    pub broken_citations: Vec<String>,
    pub invalid_releases: Vec<String>,
    pub requirement_docs_spanning_multiple_releases: Vec<String>,
}

impl AnalysisSnapshot {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.orphaned_requirement_docs.is_empty()
            && self.releases_without_test_suite.is_empty()
            && self.orphaned_test_suites.is_empty()
            && self.broken_touchpoints.is_empty()
            && self.use_cases_not_in_roadmap.is_empty()
            && self.schema_errors.is_empty()
            && self.constitution_drift.is_empty()
            && self.broken_citations.is_empty()
            && self.invalid_releases.is_empty()
            && self.requirement_docs_spanning_multiple_releases.is_empty()
    }
}

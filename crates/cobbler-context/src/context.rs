use serde::Serialize;

use crate::docs::{ConstitutionDoc, RawDoc, RequirementDoc, RoadmapDoc, TestSuiteDoc, UseCaseDoc};
use crate::error::SchemaError;
use crate::gather::SourceFile;

/// The structured bundle passed to the LLM (spec.md sec 3 "ProjectContext").
/// Immutable per prompt render.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectContext {
    pub vision: Vec<RawDoc>,
    pub architecture: Vec<RawDoc>,
    pub specifications: Vec<RequirementDoc>,
    pub roadmap: Vec<RoadmapDoc>,
    pub prd: Vec<RawDoc>,
    pub use_cases: Vec<UseCaseDoc>,
    pub test_suites: Vec<TestSuiteDoc>,
    pub engineering: Vec<RawDoc>,
    pub constitution: Vec<ConstitutionDoc>,
    pub spec_aux: Vec<RawDoc>,
    pub extra: Vec<RawDoc>,
    pub source_files: Vec<SourceFile>,
    pub open_issue_summary: String,
    pub operator_notes: Option<String>,
    #[serde(skip)]
    pub schema_errors: Vec<SchemaError>,
}

impl ProjectContext {
    /// Deterministic serialization used both to embed the context into a
    /// prompt and to measure it against the byte budget (spec.md sec 4.4,
    /// invariant I7).
    #[must_use]
    pub fn serialize(&self) -> String {
        serde_yaml::to_string(self).unwrap_or_default()
    }

    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.serialize().len()
    }
}

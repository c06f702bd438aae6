//! Typed decodings for the categories whose schema feeds the scheduler or
//! the analyzer (spec.md sec 4.4, 4.10). Vision/architecture/prd/engineering
//! are carried as raw text — their content shapes prompts, not scheduling.

use serde::{Deserialize, Serialize};

/// A document whose structure isn't consumed by scheduling logic: just the
/// corpus-relative path and raw text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDoc {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequirementGroup {
    pub id: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequirementDoc {
    pub path: String,
    pub id: String,
    #[serde(default)]
    pub groups: Vec<RequirementGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Touchpoint {
    pub requirement_doc: String,
    #[serde(default)]
    pub group_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UseCaseDoc {
    pub path: String,
    pub id: String,
    #[serde(default)]
    pub touchpoints: Vec<Touchpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestSuiteDoc {
    pub path: String,
    pub id: String,
    #[serde(default)]
    pub traces: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoadmapRelease {
    pub id: String,
    #[serde(default)]
    pub use_cases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoadmapDoc {
    pub path: String,
    #[serde(default)]
    pub releases: Vec<RoadmapRelease>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstitutionDoc {
    pub path: String,
    pub content: String,
}

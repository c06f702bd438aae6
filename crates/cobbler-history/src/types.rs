use serde::{Deserialize, Serialize};

/// The two phases that write history artifacts (spec.md sec 4.11: "The
/// phase is `measure` or `stitch`.").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Measure,
    Stitch,
}

impl Phase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Measure => "measure",
            Self::Stitch => "stitch",
        }
    }
}

/// Terminal outcome of one LLM invocation attempt, recorded in
/// `<timestamp>-<phase>-stats.yaml` (spec.md sec 3 "Task execution record",
/// sec 7 "User-visible failure behaviour").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Reset,
    Timeout,
    ParseFailure,
    ValidationFailure,
    ConflictFailure,
}

/// Token usage and cost reported by the LLM gateway (spec.md sec 4.6).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_tokens: u64,
    pub cache_read_tokens: u64,
    pub cost_usd: f64,
}

/// Per-attempt execution record (spec.md sec 3 "Task execution record").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub duration_secs: f64,
    pub usage: TokenUsage,
    pub lines_before: u64,
    pub lines_after: u64,
    pub outcome: Outcome,
}

/// Diff summary written alongside a successful execute phase
/// (`<timestamp>-stitch-report.yaml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffReport {
    pub files_changed: u32,
    pub insertions: u32,
    pub deletions: u32,
    pub paths: Vec<String>,
}

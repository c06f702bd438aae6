use serde::{Deserialize, Serialize};

use crate::sections::{ClaudeConfig, CobblerConfig, GenerationConfig, LlmConfig, ProjectConfig};

/// Shape of the single YAML configuration document (spec.md §6.6). Every
/// section is optional in the file; a missing section falls back to that
/// section's defaults wholesale, while a present section only overrides the
/// keys it actually sets.
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct YamlDoc {
    pub project: Option<ProjectConfig>,
    pub generation: Option<GenerationConfig>,
    pub cobbler: Option<CobblerConfig>,
    pub llm: Option<LlmConfig>,
    pub claude: Option<ClaudeConfig>,
}

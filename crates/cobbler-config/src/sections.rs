use serde::{Deserialize, Serialize};

/// `project` section: spec.md §6.6.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProjectConfig {
    pub module_path: Option<String>,
    pub binary_name: Option<String>,
    pub binary_dir: Option<String>,
    pub main_package: Option<String>,
    pub source_dirs: Option<Vec<String>>,
    pub magefiles_dir: Option<String>,
    pub releases: Option<Vec<String>>,
    pub release: Option<String>,
    pub context_include: Option<Vec<String>>,
    pub context_exclude: Option<Vec<String>>,
    pub context_sources: Option<Vec<String>>,
    pub seed_files: Option<Vec<String>>,
}

/// `generation` section: spec.md §6.6.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    pub prefix: String,
    pub branch: String,
    pub cycles: u32,
    pub cleanup_dirs: Vec<String>,
    pub preserve_sources: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            prefix: "gen".to_string(),
            branch: "main".to_string(),
            cycles: 1,
            cleanup_dirs: Vec::new(),
            preserve_sources: true,
        }
    }
}

/// `cobbler` section: spec.md §6.6, cycle parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CobblerConfig {
    pub dir: String,
    pub issues_repo: Option<String>,
    pub max_stitch_issues: u32,
    pub max_stitch_issues_per_cycle: u32,
    pub max_measure_issues: u32,
    pub max_measure_retries: u32,
    pub max_requirements_per_task: u32,
    pub enforce_measure_validation: bool,
    pub estimated_lines_min: u32,
    pub estimated_lines_max: u32,
    pub max_context_bytes: usize,
    pub golden_example: Option<String>,
    pub user_prompt: Option<String>,
    pub measure_prompt: Option<String>,
    pub stitch_prompt: Option<String>,
    pub planning_constitution: Option<String>,
}

impl Default for CobblerConfig {
    fn default() -> Self {
        Self {
            dir: ".cobbler".to_string(),
            issues_repo: None,
            max_stitch_issues: 50,
            max_stitch_issues_per_cycle: 10,
            max_measure_issues: 20,
            max_measure_retries: 3,
            max_requirements_per_task: 5,
            enforce_measure_validation: false,
            estimated_lines_min: 20,
            estimated_lines_max: 400,
            max_context_bytes: 65536,
            golden_example: None,
            user_prompt: None,
            measure_prompt: None,
            stitch_prompt: None,
            planning_constitution: None,
        }
    }
}

/// `llm` section: spec.md §6.6, subprocess invocation parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    pub image: Option<String>,
    pub args: Vec<String>,
    pub max_time_sec: u64,
    pub secrets_dir: Option<String>,
    pub default_token_file: Option<String>,
    pub token_file: Option<String>,
    pub silence: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            image: None,
            args: Vec::new(),
            max_time_sec: 600,
            secrets_dir: None,
            default_token_file: None,
            token_file: None,
            silence: false,
        }
    }
}

/// `claude` section: spec.md §6.6, credential location.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ClaudeConfig {
    pub binary: Option<String>,
    pub credentials_path: Option<String>,
}

use std::collections::HashMap;

use cobbler_context::ProjectContext;

use crate::render::render;
use crate::section::{Section, SectionFormat, Template};

/// Fixed limits embedded in the propose prompt (spec.md sec 4.5).
#[derive(Debug, Clone, Copy)]
pub struct ProposeLimits {
    pub limit: u32,
    pub lines_min: u32,
    pub lines_max: u32,
    pub max_requirements: u32,
}

fn propose_template() -> Template {
    vec![
        (
            "instructions".to_string(),
            Section::scalar(
                "Propose up to {limit} new tasks. Each task's body must be between \
                 {lines_min} and {lines_max} lines and cite no more than {max_requirements} \
                 requirements.",
            ),
        ),
        (
            "open_issues".to_string(),
            Section::structured("Currently open issues:", "open_issues", SectionFormat::Yaml),
        ),
        (
            "context".to_string(),
            Section::structured("Project context:", "context", SectionFormat::Yaml),
        ),
    ]
}

fn execute_template() -> Template {
    vec![
        (
            "instructions".to_string(),
            Section::scalar("Implement the task described below."),
        ),
        (
            "task".to_string(),
            Section::structured("Task:", "task", SectionFormat::Yaml),
        ),
        (
            "context".to_string(),
            Section::structured("Project context:", "context", SectionFormat::Yaml),
        ),
    ]
}

/// Build the propose prompt: the unfiltered context, the open-issue
/// summary, and the fixed limits (spec.md sec 4.5).
#[must_use]
pub fn build_propose_prompt(ctx: &ProjectContext, limits: ProposeLimits) -> String {
    let mut placeholders = HashMap::new();
    placeholders.insert("limit".to_string(), limits.limit.to_string());
    placeholders.insert("lines_min".to_string(), limits.lines_min.to_string());
    placeholders.insert("lines_max".to_string(), limits.lines_max.to_string());
    placeholders.insert("max_requirements".to_string(), limits.max_requirements.to_string());

    let mut data = HashMap::new();
    data.insert("open_issues".to_string(), ctx.open_issue_summary.clone());
    data.insert("context".to_string(), ctx.serialize());

    render(&propose_template(), &placeholders, &data)
}

/// Build the execute prompt: the required-reading-filtered context plus
/// the task description YAML (spec.md sec 4.5).
#[must_use]
pub fn build_execute_prompt(ctx: &ProjectContext, task_description_yaml: &str) -> String {
    let placeholders = HashMap::new();

    let mut data = HashMap::new();
    data.insert("task".to_string(), task_description_yaml.to_string());
    data.insert("context".to_string(), ctx.serialize());

    render(&execute_template(), &placeholders, &data)
}

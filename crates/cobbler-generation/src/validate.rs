use std::collections::HashSet;

use crate::types::ProposedTask;

/// Check every proposed task in a batch against spec.md sec 4.9.2 "Propose
/// validation". Returns every violation found (not just the first) so the
/// caller can log or report them all; an empty result means the batch is
/// clean.
#[must_use]
pub fn validate_batch(tasks: &[ProposedTask], existing_open_titles: &[String], max_requirements: u32) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen_indices = HashSet::new();
    let existing_titles: HashSet<&str> = existing_open_titles.iter().map(String::as_str).collect();

    for task in tasks {
        if task.index < 1 {
            errors.push(format!("task {:?}: index must be >= 1, got {}", task.title, task.index));
        }
        if !seen_indices.insert(task.index) {
            errors.push(format!("task {:?}: index {} is not unique within the batch", task.title, task.index));
        }
        if existing_titles.contains(task.title.as_str()) {
            errors.push(format!("task {:?}: title duplicates an existing open issue", task.title));
        }

        match task.deliverable_type.as_str() {
            "code" => validate_counts(task, 5..=8, 5..=8, Some(3..=5), &mut errors),
            "documentation" => validate_counts(task, 2..=4, 3..=5, None, &mut errors),
            other => errors.push(format!("task {:?}: deliverable_type {other:?} is not code or documentation", task.title)),
        }

        let req_count = task.requirements.len() as u32;
        if req_count > max_requirements {
            errors.push(format!(
                "task {:?}: {req_count} requirements exceeds the configured max of {max_requirements}",
                task.title
            ));
        }

        for file in &task.files {
            if names_itself_after_its_package(&file.path) {
                errors.push(format!("task {:?}: file {:?} is named after its own package directory", task.title, file.path));
            }
        }
    }

    errors
}

fn validate_counts(
    task: &ProposedTask,
    requirements: std::ops::RangeInclusive<usize>,
    acceptance_criteria: std::ops::RangeInclusive<usize>,
    design_decisions: Option<std::ops::RangeInclusive<usize>>,
    errors: &mut Vec<String>,
) {
    if !requirements.contains(&task.requirements.len()) {
        errors.push(format!(
            "task {:?}: {} requirements is outside the expected range {:?} for {}",
            task.title,
            task.requirements.len(),
            requirements,
            task.deliverable_type
        ));
    }
    if !acceptance_criteria.contains(&task.acceptance_criteria.len()) {
        errors.push(format!(
            "task {:?}: {} acceptance criteria is outside the expected range {:?} for {}",
            task.title,
            task.acceptance_criteria.len(),
            acceptance_criteria,
            task.deliverable_type
        ));
    }
    if let Some(range) = design_decisions
        && !range.contains(&task.design_decisions.len())
    {
        errors.push(format!(
            "task {:?}: {} design decisions is outside the expected range {:?} for {}",
            task.title,
            task.design_decisions.len(),
            range,
            task.deliverable_type
        ));
    }
}

/// A file whose basename (stem) equals its immediate parent directory name,
/// e.g. `pkg/foo/foo.go` (spec.md sec 4.9.2).
fn names_itself_after_its_package(path: &str) -> bool {
    let mut segments = path.split('/').rev();
    let Some(filename) = segments.next() else {
        return false;
    };
    let Some(dir) = segments.next() else {
        return false;
    };
    let stem = filename.rsplit_once('.').map_or(filename, |(stem, _ext)| stem);
    stem == dir
}

use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSetBuilder};
use walkdir::WalkDir;

use crate::budget::{apply_byte_budget, filter_required_reading};
use crate::classify::{DocCategory, classify_path};
use crate::context::ProjectContext;
use crate::docs::{ConstitutionDoc, RawDoc, RequirementDoc, RoadmapDoc, TestSuiteDoc, UseCaseDoc};
use crate::error::{ContextError, SchemaError};
use crate::gather::gather_source_files;
use crate::release_filter::passes_release_filter;

/// The fixed set of spec-corpus directories assembled when the operator has
/// not supplied an explicit include-glob override (spec.md sec 4.4).
const CANONICAL_SPEC_GLOBS: &[&str] = &[
    "docs/vision/**",
    "docs/architecture/**",
    "docs/specifications/**",
    "docs/specs/**",
    "docs/roadmap/**",
    "docs/prd/**",
    "docs/use-cases/**",
    "docs/use_cases/**",
    "docs/test-suites/**",
    "docs/test_suites/**",
    "docs/engineering/**",
    "docs/constitution/**",
    "constitution/**",
];

/// Inputs to one assembly pass. `required_reading` is `None` for the
/// propose prompt (unfiltered) and `Some(list)` when executing a task
/// (spec.md sec 4.4: "The propose prompt is not filtered by required-
/// reading.").
pub struct AssembleParams<'a> {
    pub root: Utf8PathBuf,
    pub include_globs: Option<&'a [String]>,
    pub exclude_globs: &'a [String],
    pub release_scope: Option<&'a HashSet<String>>,
    pub source_dirs: &'a [String],
    pub source_extensions: &'a HashSet<String>,
    pub open_issue_summary: String,
    pub operator_notes: Option<String>,
    pub max_context_bytes: usize,
    pub required_reading: Option<&'a [String]>,
}

/// Resolve the corpus file list, classify and parse it, apply the release
/// filter, gather source files, and enforce the byte budget (spec.md sec
/// 4.4 end to end).
pub fn assemble(params: AssembleParams<'_>) -> Result<ProjectContext, ContextError> {
    let candidate_paths = resolve_candidate_paths(&params.root, params.include_globs, params.exclude_globs)?;

    let mut ctx = ProjectContext {
        open_issue_summary: params.open_issue_summary,
        operator_notes: params.operator_notes,
        ..Default::default()
    };

    for rel_path in candidate_paths {
        if !passes_release_filter(&rel_path, params.release_scope) {
            continue;
        }
        let abs = params.root.join(&rel_path);
        let content = match std::fs::read_to_string(abs.as_std_path()) {
            Ok(c) => c,
            Err(_) => continue, // not a readable text file; skip rather than fail assembly
        };

        classify_and_insert(&mut ctx, &rel_path, &content);
    }

    let mut source_files = gather_source_files(&params.root, params.source_dirs, params.source_extensions)?;
    if let Some(required) = params.required_reading {
        source_files = filter_required_reading(source_files, required);
    }

    let fixed_overhead = {
        let mut probe = ctx.clone();
        probe.source_files.clear();
        probe.byte_len()
    };
    ctx.source_files = apply_byte_budget(source_files, fixed_overhead, params.max_context_bytes);

    Ok(ctx)
}

fn resolve_candidate_paths(
    root: &Utf8Path,
    include_globs: Option<&[String]>,
    exclude_globs: &[String],
) -> Result<Vec<String>, ContextError> {
    let patterns: Vec<&str> = match include_globs {
        Some(globs) => globs.iter().map(String::as_str).collect(),
        None => CANONICAL_SPEC_GLOBS.to_vec(),
    };

    let mut include_set = GlobSetBuilder::new();
    for pattern in &patterns {
        include_set.add(Glob::new(pattern).map_err(|source| ContextError::BadGlob {
            pattern: (*pattern).to_string(),
            source,
        })?);
    }
    let include_set = include_set.build().map_err(|source| ContextError::BadGlob {
        pattern: patterns.join(","),
        source,
    })?;

    let mut exclude_set = GlobSetBuilder::new();
    for pattern in exclude_globs {
        exclude_set.add(Glob::new(pattern).map_err(|source| ContextError::BadGlob {
            pattern: pattern.clone(),
            source,
        })?);
    }
    let exclude_set = exclude_set.build().map_err(|source| ContextError::BadGlob {
        pattern: exclude_globs.join(","),
        source,
    })?;

    let mut paths = Vec::new();
    if !root.as_std_path().exists() {
        return Ok(paths);
    }
    for entry in WalkDir::new(root.as_std_path()).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(abs) = Utf8PathBuf::from_path_buf(entry.path().to_path_buf()) else {
            continue;
        };
        let rel = abs.strip_prefix(root).unwrap_or(&abs).to_string();
        if include_set.is_match(&rel) && !exclude_set.is_match(&rel) {
            paths.push(rel);
        }
    }
    paths.sort();
    Ok(paths)
}

fn classify_and_insert(ctx: &mut ProjectContext, rel_path: &str, content: &str) {
    let category = classify_path(rel_path);
    match category {
        DocCategory::Vision => ctx.vision.push(raw(rel_path, content)),
        DocCategory::Architecture => ctx.architecture.push(raw(rel_path, content)),
        DocCategory::Prd => ctx.prd.push(raw(rel_path, content)),
        DocCategory::Engineering => ctx.engineering.push(raw(rel_path, content)),
        DocCategory::SpecAux => ctx.spec_aux.push(raw(rel_path, content)),
        DocCategory::Extra => ctx.extra.push(raw(rel_path, content)),
        DocCategory::Constitution => ctx.constitution.push(ConstitutionDoc {
            path: rel_path.to_string(),
            content: content.to_string(),
        }),
        DocCategory::Specifications => match serde_yaml::from_str::<RequirementDoc>(content) {
            Ok(doc) => ctx.specifications.push(doc),
            Err(e) => ctx.schema_errors.push(schema_error(rel_path, &e)),
        },
        DocCategory::Roadmap => match serde_yaml::from_str::<RoadmapDoc>(content) {
            Ok(doc) => ctx.roadmap.push(doc),
            Err(e) => ctx.schema_errors.push(schema_error(rel_path, &e)),
        },
        DocCategory::UseCase => match serde_yaml::from_str::<UseCaseDoc>(content) {
            Ok(doc) => ctx.use_cases.push(doc),
            Err(e) => ctx.schema_errors.push(schema_error(rel_path, &e)),
        },
        DocCategory::TestSuite => match serde_yaml::from_str::<TestSuiteDoc>(content) {
            Ok(doc) => ctx.test_suites.push(doc),
            Err(e) => ctx.schema_errors.push(schema_error(rel_path, &e)),
        },
    }
}

fn raw(path: &str, content: &str) -> RawDoc {
    RawDoc {
        path: path.to_string(),
        content: content.to_string(),
    }
}

fn schema_error(path: &str, err: &serde_yaml::Error) -> SchemaError {
    SchemaError {
        path: Utf8PathBuf::from(path),
        message: err.to_string(),
    }
}

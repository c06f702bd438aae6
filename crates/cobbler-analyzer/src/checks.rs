use std::collections::{HashMap, HashSet};

use camino::Utf8Path;
use cobbler_context::ProjectContext;

use crate::types::AnalysisSnapshot;

/// Run every check of spec.md sec 4.10 over an already-assembled context.
/// `root` is the repository root, used to locate constitution mirrors on
/// disk; `configured_releases` is the operator's configured release scope
/// (`project.releases`), used by the "invalid releases" check.
#[must_use]
pub fn analyze(ctx: &ProjectContext, root: &Utf8Path, configured_releases: &[String]) -> AnalysisSnapshot {
    let req_doc_ids: HashSet<&str> = ctx.specifications.iter().map(|d| d.id.as_str()).collect();
    let use_case_ids: HashSet<&str> = ctx.use_cases.iter().map(|u| u.id.as_str()).collect();

    let mut release_of_use_case: HashMap<&str, HashSet<&str>> = HashMap::new();
    let mut roadmap_release_ids: HashSet<&str> = HashSet::new();
    for doc in &ctx.roadmap {
        for release in &doc.releases {
            roadmap_release_ids.insert(release.id.as_str());
            for uc in &release.use_cases {
                release_of_use_case.entry(uc.as_str()).or_default().insert(release.id.as_str());
            }
        }
    }

    AnalysisSnapshot {
        orphaned_requirement_docs: orphaned_requirement_docs(ctx, &req_doc_ids),
        releases_without_test_suite: releases_without_test_suite(ctx),
        orphaned_test_suites: orphaned_test_suites(ctx, &use_case_ids),
        broken_touchpoints: broken_touchpoints(ctx, &req_doc_ids),
        use_cases_not_in_roadmap: use_cases_not_in_roadmap(ctx, &release_of_use_case),
        schema_errors: ctx.schema_errors.iter().map(|e| e.path.to_string()).collect(),
        constitution_drift: constitution_drift(ctx, root),
        broken_citations: broken_citations(ctx),
        invalid_releases: invalid_releases(configured_releases, &roadmap_release_ids),
        requirement_docs_spanning_multiple_releases: requirement_docs_spanning_multiple_releases(ctx, &release_of_use_case),
    }
}

fn orphaned_requirement_docs(ctx: &ProjectContext, req_doc_ids: &HashSet<&str>) -> Vec<String> {
    let referenced: HashSet<&str> = ctx
        .use_cases
        .iter()
        .flat_map(|u| u.touchpoints.iter())
        .map(|t| t.requirement_doc.as_str())
        .collect();
    let mut offenders: Vec<String> = req_doc_ids.difference(&referenced).map(|id| (*id).to_string()).collect();
    offenders.sort();
    offenders
}

fn releases_without_test_suite(ctx: &ProjectContext) -> Vec<String> {
    let traced: HashSet<&str> = ctx.test_suites.iter().flat_map(|s| s.traces.iter()).map(String::as_str).collect();
    let mut offenders = Vec::new();
    for doc in &ctx.roadmap {
        for release in &doc.releases {
            if release.use_cases.is_empty() {
                continue;
            }
            let has_trace = release.use_cases.iter().any(|uc| traced.contains(uc.as_str()));
            if !has_trace {
                offenders.push(release.id.clone());
            }
        }
    }
    offenders.sort();
    offenders.dedup();
    offenders
}

fn orphaned_test_suites(ctx: &ProjectContext, use_case_ids: &HashSet<&str>) -> Vec<String> {
    let mut offenders: Vec<String> = ctx
        .test_suites
        .iter()
        .filter(|s| !s.traces.iter().any(|t| use_case_ids.contains(t.as_str())))
        .map(|s| s.id.clone())
        .collect();
    offenders.sort();
    offenders
}

fn broken_touchpoints(ctx: &ProjectContext, req_doc_ids: &HashSet<&str>) -> Vec<String> {
    let mut offenders = Vec::new();
    for use_case in &ctx.use_cases {
        for tp in &use_case.touchpoints {
            if !req_doc_ids.contains(tp.requirement_doc.as_str()) {
                offenders.push(format!("{}:{}", use_case.id, tp.requirement_doc));
            }
        }
    }
    offenders.sort();
    offenders
}

fn use_cases_not_in_roadmap(ctx: &ProjectContext, release_of_use_case: &HashMap<&str, HashSet<&str>>) -> Vec<String> {
    let mut offenders: Vec<String> = ctx
        .use_cases
        .iter()
        .filter(|u| !release_of_use_case.contains_key(u.id.as_str()))
        .map(|u| u.id.clone())
        .collect();
    offenders.sort();
    offenders
}

/// A constitution document embedded under `docs/constitution/**` is expected
/// to byte-exactly mirror a same-named file at the repository root (the
/// canonical copy an editor actually works on). Drift between the two is
/// reported, including the case where the mirror is simply missing.
fn constitution_drift(ctx: &ProjectContext, root: &Utf8Path) -> Vec<String> {
    let mut offenders = Vec::new();
    for doc in &ctx.constitution {
        let Some(file_name) = Utf8Path::new(&doc.path).file_name() else {
            continue;
        };
        let mirror = root.join(file_name);
        match std::fs::read_to_string(mirror.as_std_path()) {
            Ok(mirror_content) if mirror_content == doc.content => {}
            _ => offenders.push(doc.path.clone()),
        }
    }
    offenders.sort();
    offenders
}

fn broken_citations(ctx: &ProjectContext) -> Vec<String> {
    let groups_of: HashMap<&str, HashSet<&str>> = ctx
        .specifications
        .iter()
        .map(|d| (d.id.as_str(), d.groups.iter().map(|g| g.id.as_str()).collect()))
        .collect();

    let mut offenders = Vec::new();
    for use_case in &ctx.use_cases {
        for tp in &use_case.touchpoints {
            let Some(group_id) = &tp.group_id else { continue };
            let Some(groups) = groups_of.get(tp.requirement_doc.as_str()) else {
                continue; // already reported as a broken touchpoint
            };
            if !groups.contains(group_id.as_str()) {
                offenders.push(format!("{}:{}:{}", use_case.id, tp.requirement_doc, group_id));
            }
        }
    }
    offenders.sort();
    offenders
}

fn invalid_releases(configured_releases: &[String], roadmap_release_ids: &HashSet<&str>) -> Vec<String> {
    let mut offenders: Vec<String> = configured_releases
        .iter()
        .filter(|r| !roadmap_release_ids.contains(r.as_str()))
        .cloned()
        .collect();
    offenders.sort();
    offenders
}

fn requirement_docs_spanning_multiple_releases(
    ctx: &ProjectContext,
    release_of_use_case: &HashMap<&str, HashSet<&str>>,
) -> Vec<String> {
    let mut releases_per_doc: HashMap<&str, HashSet<&str>> = HashMap::new();
    for use_case in &ctx.use_cases {
        let Some(releases) = release_of_use_case.get(use_case.id.as_str()) else {
            continue;
        };
        for tp in &use_case.touchpoints {
            releases_per_doc
                .entry(tp.requirement_doc.as_str())
                .or_default()
                .extend(releases.iter().copied());
        }
    }
    let mut offenders: Vec<String> = releases_per_doc
        .into_iter()
        .filter(|(_, releases)| releases.len() > 1)
        .map(|(doc_id, _)| doc_id.to_string())
        .collect();
    offenders.sort();
    offenders
}

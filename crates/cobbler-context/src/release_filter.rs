//! Release scoping (spec.md sec 4.4 "Release filter"): files embedding a
//! `rel<X>.<Y>-` or `test-rel<X>.<Y>` marker are kept only if `<X>.<Y>` is in
//! the configured scope. Files with no such marker always pass through.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

// Two distinct marker forms (spec.md sec 4.4): `rel<X>.<Y>-` requires a
// trailing dash, `test-rel<X>.<Y>` does not. A single shared `(?:test-)?`
// prefix with one mandatory trailing dash would miss `test-rel1.2.yaml`
// (no dash after the version), so each form gets its own alternative and
// capture group.
static RELEASE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|/)(?:test-rel(\d+\.\d+)|rel(\d+\.\d+)-)").expect("static regex is valid"));

/// Extract the `<X>.<Y>` release marker embedded in a path, if any.
#[must_use]
pub fn release_marker(path: &str) -> Option<String> {
    let caps = RELEASE_MARKER.captures(path)?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str().to_string())
}

/// `true` if `path` should be retained given the configured release scope.
/// `scope = None` means no release filter is configured: everything passes.
#[must_use]
pub fn passes_release_filter(path: &str, scope: Option<&HashSet<String>>) -> bool {
    let Some(scope) = scope else {
        return true;
    };
    match release_marker(path) {
        Some(marker) => scope.contains(&marker),
        None => true,
    }
}

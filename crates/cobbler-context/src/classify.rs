//! Path-prefix classification of spec-corpus files into the categories of
//! spec.md sec 4.4. Directory conventions follow the teacher project's own
//! `docs/` layout, generalized to the categories the spec names.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocCategory {
    Vision,
    Architecture,
    Specifications,
    Roadmap,
    Prd,
    UseCase,
    TestSuite,
    Engineering,
    Constitution,
    SpecAux,
    Extra,
}

impl fmt::Display for DocCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Vision => "vision",
            Self::Architecture => "architecture",
            Self::Specifications => "specifications",
            Self::Roadmap => "roadmap",
            Self::Prd => "prd",
            Self::UseCase => "use_case",
            Self::TestSuite => "test_suite",
            Self::Engineering => "engineering",
            Self::Constitution => "constitution",
            Self::SpecAux => "spec_aux",
            Self::Extra => "extra",
        };
        write!(f, "{s}")
    }
}

/// Classify a corpus-relative path into one category. Order matters: more
/// specific prefixes are checked before the generic `docs/` catch-all.
#[must_use]
pub fn classify_path(path: &str) -> DocCategory {
    let p = path.replace('\\', "/");
    let p = p.trim_start_matches("./");

    if p.starts_with("docs/vision/") {
        DocCategory::Vision
    } else if p.starts_with("docs/architecture/") {
        DocCategory::Architecture
    } else if p.starts_with("docs/specifications/") || p.starts_with("docs/specs/") {
        DocCategory::Specifications
    } else if p.starts_with("docs/roadmap/") {
        DocCategory::Roadmap
    } else if p.starts_with("docs/prd/") {
        DocCategory::Prd
    } else if p.starts_with("docs/use-cases/") || p.starts_with("docs/use_cases/") {
        DocCategory::UseCase
    } else if p.starts_with("docs/test-suites/") || p.starts_with("docs/test_suites/") {
        DocCategory::TestSuite
    } else if p.starts_with("docs/engineering/") {
        DocCategory::Engineering
    } else if p.starts_with("docs/constitution/") || p.starts_with("constitution/") {
        DocCategory::Constitution
    } else if p.starts_with("docs/") {
        DocCategory::SpecAux
    } else {
        DocCategory::Extra
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_each_canonical_prefix() {
        assert_eq!(classify_path("docs/vision/v1.md"), DocCategory::Vision);
        assert_eq!(classify_path("docs/architecture/overview.md"), DocCategory::Architecture);
        assert_eq!(classify_path("docs/roadmap/rel1.0.yaml"), DocCategory::Roadmap);
        assert_eq!(classify_path("docs/use-cases/uc-1.yaml"), DocCategory::UseCase);
        assert_eq!(classify_path("docs/test-suites/test-rel1.0.yaml"), DocCategory::TestSuite);
        assert_eq!(classify_path("docs/engineering/style.md"), DocCategory::Engineering);
        assert_eq!(classify_path("docs/constitution/safety.md"), DocCategory::Constitution);
        assert_eq!(classify_path("docs/misc/notes.md"), DocCategory::SpecAux);
        assert_eq!(classify_path("src/main.rs"), DocCategory::Extra);
    }

    #[test]
    fn normalizes_leading_dot_slash_and_backslashes() {
        assert_eq!(classify_path("./docs/vision/v1.md"), DocCategory::Vision);
        assert_eq!(classify_path("docs\\vision\\v1.md"), DocCategory::Vision);
    }
}

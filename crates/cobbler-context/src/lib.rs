//! Context assembler (spec.md sec 4.4): walks the spec corpus, classifies
//! and parses it into a typed [`ProjectContext`], applies release scoping,
//! gathers numbered source files, and enforces the byte budget.

mod assembler;
mod budget;
mod classify;
mod context;
mod docs;
mod error;
mod gather;
mod release_filter;

pub use assembler::{AssembleParams, assemble};
pub use budget::{apply_byte_budget, filter_required_reading};
pub use classify::{DocCategory, classify_path};
pub use context::ProjectContext;
pub use docs::{
    ConstitutionDoc, RawDoc, RequirementDoc, RequirementGroup, RoadmapDoc, RoadmapRelease, TestSuiteDoc, Touchpoint,
    UseCaseDoc,
};
pub use error::{ContextError, SchemaError};
pub use gather::{SourceFile, gather_source_files};
pub use release_filter::{passes_release_filter, release_marker};

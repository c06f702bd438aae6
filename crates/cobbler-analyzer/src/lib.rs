//! Cross-artifact consistency checks over the spec corpus (spec.md sec
//! 4.10). Every check is advisory: none block execution. The result feeds
//! the generation lifecycle's pre-cycle analysis snapshot (C9), which C11
//! persists and C4 may surface as operator free-text.

mod checks;
mod types;

pub use checks::analyze;
pub use types::AnalysisSnapshot;

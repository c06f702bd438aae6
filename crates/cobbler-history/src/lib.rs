//! Scratch-directory persistence (spec.md sec 4.11, 5): base branch marker,
//! analyzer snapshots, the append-only proposal log, and per-invocation
//! prompt/stream/stats/report history files.

mod error;
mod scratch;
mod types;

pub use error::HistoryError;
pub use scratch::ScratchHistory;
pub use types::{DiffReport, ExecutionRecord, Outcome, Phase, TokenUsage};

//! Task DAG scheduler (spec.md sec 4.7): promote/pick/close over labels on
//! open issues. State lives entirely in the issue store; this crate adds no
//! persistence of its own. Callers serialize access per generation — the
//! scheduler is single-reader-per-generation, not internally locked.

mod error;
mod scheduler;

pub use error::SchedulerError;
pub use scheduler::Scheduler;

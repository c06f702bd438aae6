//! Low-level helpers shared by every cobbler crate: scratch-directory paths,
//! atomic file writes, timestamp formatting, and line-numbering.
//!
//! Nothing in this crate knows about generations, issues, or the LLM — it is
//! the foundation the rest of the workspace builds on.

pub mod atomic_write;
pub mod lines;
pub mod paths;
pub mod timestamp;

pub use atomic_write::write_file_atomic;
pub use timestamp::now_stamp;

//! CLI façade (C13): exposes the operations of C9/C7/C8/C10 as commands
//! (spec.md §6.5). Out of core per spec.md §1 "Non-goals", kept here for
//! completeness — every `cobbler-*` crate stays usable as a library
//! without depending on `clap` or any of this module's wiring.

pub mod args;
pub mod commands;
pub mod run;

pub use args::Cli;
pub use run::run;

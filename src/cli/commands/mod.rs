//! Command handlers (C13), one module per CLI surface area. Kept thin:
//! argument wiring and printing live here, every decision of consequence
//! lives in the `cobbler-*` crate it delegates to.

pub mod analyze;
pub mod doctor;
pub mod generator;
pub mod issues;
pub mod passthrough;
pub mod scaffold;

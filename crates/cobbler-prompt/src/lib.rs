//! Template-driven prompt assembler (spec.md sec 4.5): placeholder
//! substitution and section rendering for the propose/execute prompt
//! variants, built on top of the [`cobbler_context::ProjectContext`]
//! produced by the context assembler.

mod builder;
mod render;
mod section;

pub use builder::{ProposeLimits, build_execute_prompt, build_propose_prompt};
pub use render::render;
pub use section::{Section, SectionFormat, Template, substitute};

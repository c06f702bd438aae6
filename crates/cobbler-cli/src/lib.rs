//! Re-exports of the types the CLI façade (C13) is built from. The command
//! wiring itself lives in the root `cobbler` binary crate, not here — this
//! crate exists so other workspace members can depend on the CLI-facing
//! vocabulary (config, generation handles) without pulling in `clap` or the
//! subcommand tree.

pub use cobbler_config::{CliArgs, Config};
pub use cobbler_generation::{GenerationHandle, GenerationState, RunSummary};

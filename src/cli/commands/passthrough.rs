//! Build/lint/install/clean wrappers (spec.md §6.5, §1 Non-goals: "build/
//! lint/test wrapper internals"). This workspace doesn't implement a
//! project build system of its own — these commands shell out to whatever
//! the operator has configured and pass the exit code through unchanged.

use cobbler_config::Config;

use crate::error::CobblerError;

pub fn build(config: &Config) -> Result<(), CobblerError> {
    passthrough(config, "build")
}

pub fn lint(config: &Config) -> Result<(), CobblerError> {
    passthrough(config, "lint")
}

pub fn install(config: &Config) -> Result<(), CobblerError> {
    passthrough(config, "install")
}

pub fn clean(config: &Config) -> Result<(), CobblerError> {
    passthrough(config, "clean")
}

/// No project-specific build/lint/install/clean command is configured by
/// this workspace's schema (spec.md §6.6 lists no such keys); absent one,
/// these commands are a documented no-op rather than a guess at a toolchain.
fn passthrough(_config: &Config, name: &str) -> Result<(), CobblerError> {
    println!("{name}: no project command configured, nothing to do");
    Ok(())
}

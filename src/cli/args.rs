//! Argument parsing (C13). Per spec.md §6.5, "no long options required by
//! the core; all inputs come from the configuration file" — flags here are
//! overrides, not a parallel source of truth.

use clap::{Parser, Subcommand};
use cobbler_config::CliArgs as ConfigCliArgs;

#[derive(Debug, Parser)]
#[command(name = "cobbler", version, about = "AI code-generation orchestrator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the configuration file. Overrides discovery (spec.md §6.6).
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Project root / scratch directory override.
    #[arg(long, global = true)]
    pub dir: Option<String>,

    /// Raise the default log level to `debug`.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scaffold the `.cobbler` directory and default configuration.
    Init,
    /// Reset project scaffolding back to defaults.
    Reset,
    /// Print generation/scheduler statistics.
    Stats,
    /// Pass-through build wrapper (Non-goal: internals stubbed per §6.5).
    Build,
    /// Pass-through lint wrapper (Non-goal: internals stubbed per §6.5).
    Lint,
    /// Pass-through install wrapper (Non-goal: internals stubbed per §6.5).
    Install,
    /// Remove the scratch directory's transient artifacts.
    Clean,
    /// Report which credential sources are configured.
    Credentials,
    /// Run the cross-artifact consistency checks (C10) and print the snapshot.
    Analyze,
    /// Run one propose (measure) phase against the active generation.
    Propose,
    /// Run one execute (stitch) phase against the active generation.
    Execute,
    /// Verify the runtime environment (SPEC_FULL.md A.5).
    Doctor,
    /// Remove all scratch-directory state (history, analysis, locks).
    #[command(name = "scratch-reset")]
    ScratchReset,
    #[command(subcommand)]
    Generator(GeneratorCommand),
    #[command(subcommand)]
    Issues(IssuesCommand),
}

#[derive(Debug, Subcommand)]
pub enum GeneratorCommand {
    /// Start a new generation off the configured base branch (spec.md §4.9.1).
    Start,
    /// Run the full propose/execute cycle loop (spec.md §4.9.2).
    Run,
    /// Resume the active generation, recovering stale state first (§4.9.3).
    Resume,
    /// Stop the active generation: merge, tag, close issues (§4.9.4).
    Stop,
    /// Switch the checked-out generation branch without altering its state.
    Switch {
        name: String,
    },
    /// List generation branches and their inferred lifecycle state (SPEC_FULL.md B).
    List,
    /// Abandon the active generation without merging (§4.9.5).
    Reset,
    /// Report the active generation's name/branch/cycle/issue summary (SPEC_FULL.md B).
    Status,
}

#[derive(Debug, Subcommand)]
pub enum IssuesCommand {
    /// Ensure the labels this generation needs exist on the issue store.
    Init,
    /// Clear in-progress labels left behind by an interrupted run.
    Reset,
}

impl Cli {
    #[must_use]
    pub fn to_config_cli_args(&self) -> ConfigCliArgs {
        ConfigCliArgs {
            config_path: self.config.as_ref().map(camino::Utf8PathBuf::from),
            release: None,
            cycles: None,
            max_time_sec: None,
            max_context_bytes: None,
            enforce_measure_validation: None,
            dir: self.dir.clone(),
        }
    }
}

//! Project scaffolding commands (`init`, `reset`, `stats`, `credentials`,
//! `scratch-reset`). None of these touch the generation lifecycle; they
//! manage the `.cobbler` directory the rest of the CLI reads from.

use cobbler_config::Config;

use crate::error::CobblerError;

const DEFAULT_CONFIG_YAML: &str = "\
project: {}
generation:
  prefix: gen
  branch: main
  cycles: 1
  cleanup_dirs: []
  preserve_sources: true
cobbler:
  dir: .cobbler
  max_stitch_issues: 50
  max_stitch_issues_per_cycle: 10
  max_measure_issues: 20
  max_measure_retries: 3
  max_requirements_per_task: 5
  enforce_measure_validation: false
  estimated_lines_min: 20
  estimated_lines_max: 400
  max_context_bytes: 65536
llm:
  args: []
  max_time_sec: 600
  silence: false
";

/// Write `.cobbler/config.yaml` with the built-in defaults if it doesn't
/// already exist. Never overwrites an existing file.
pub fn init(config: &Config) -> Result<(), CobblerError> {
    let dir = std::path::Path::new(&config.cobbler.dir);
    std::fs::create_dir_all(dir).map_err(|e| CobblerError::Other(e.into()))?;
    let config_path = dir.join("config.yaml");
    if config_path.exists() {
        println!("{} already exists; leaving it untouched", config_path.display());
        return Ok(());
    }
    std::fs::write(&config_path, DEFAULT_CONFIG_YAML).map_err(|e| CobblerError::Other(e.into()))?;
    println!("wrote {}", config_path.display());
    Ok(())
}

/// Remove `.cobbler/config.yaml`, leaving history/worktrees untouched.
pub fn reset(config: &Config) -> Result<(), CobblerError> {
    let config_path = std::path::Path::new(&config.cobbler.dir).join("config.yaml");
    if config_path.exists() {
        std::fs::remove_file(&config_path).map_err(|e| CobblerError::Other(e.into()))?;
        println!("removed {}", config_path.display());
    } else {
        println!("no configuration file to reset");
    }
    Ok(())
}

/// Print where each tracked configuration field's value came from
/// (spec.md §6.6, SPEC_FULL.md A.3 `ConfigSource`).
pub fn stats(config: &Config) -> Result<(), CobblerError> {
    for field in [
        "generation.prefix",
        "generation.branch",
        "generation.cycles",
        "cobbler.dir",
        "cobbler.max_stitch_issues",
        "cobbler.max_stitch_issues_per_cycle",
        "cobbler.max_measure_issues",
        "cobbler.max_measure_retries",
        "cobbler.enforce_measure_validation",
        "cobbler.max_context_bytes",
        "llm.max_time_sec",
        "project.release",
    ] {
        match config.source_of(field) {
            Some(source) => println!("{field}: {source:?}"),
            None => println!("{field}: (untracked)"),
        }
    }
    Ok(())
}

/// Report which credential sources are configured, without reading their
/// contents (spec.md §6.5 `credentials`).
pub fn credentials(config: &Config) -> Result<(), CobblerError> {
    match &config.claude.credentials_path {
        Some(path) => println!("claude.credentials_path = {path}"),
        None => println!("claude.credentials_path not set"),
    }
    println!(
        "issue store token: {}",
        if std::env::var("COBBLER_ISSUE_TOKEN").is_ok() || std::env::var("GITHUB_TOKEN").is_ok() {
            "present in environment"
        } else {
            "not set (COBBLER_ISSUE_TOKEN / GITHUB_TOKEN)"
        }
    );
    Ok(())
}

/// Remove the scratch directory's transient artifacts: history, analysis
/// snapshot, lock sidecar. Config and worktrees are untouched.
pub fn scratch_reset(config: &Config) -> Result<(), CobblerError> {
    let root = camino::Utf8PathBuf::from(&config.cobbler.dir);
    for path in [
        cobbler_utils::paths::history_dir(&root),
        cobbler_utils::paths::analysis_file(&root),
        cobbler_utils::paths::measure_log_file(&root),
        cobbler_utils::paths::base_branch_file(&root),
    ] {
        let std_path = path.as_std_path();
        if std_path.is_dir() {
            let _ = std::fs::remove_dir_all(std_path);
        } else if std_path.exists() {
            let _ = std::fs::remove_file(std_path);
        }
    }
    println!("scratch directory artifacts removed");
    Ok(())
}

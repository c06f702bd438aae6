//! `cobbler analyze` — run the cross-artifact consistency checks (C10)
//! over the current working tree and print the snapshot (spec.md §4.10).

use camino::Utf8PathBuf;
use cobbler_config::Config;
use cobbler_context::{AssembleParams, assemble};

use crate::error::CobblerError;

pub fn run(config: &Config) -> Result<(), CobblerError> {
    let cwd = std::env::current_dir().map_err(|e| CobblerError::Other(e.into()))?;
    let root = Utf8PathBuf::from_path_buf(cwd).map_err(|_| CobblerError::Environment {
        tool: "non-UTF-8 working directory".to_string(),
    })?;

    let source_dirs = config.project.source_dirs.clone().unwrap_or_else(|| vec!["src".to_string()]);
    let source_extensions = ["go", "rs", "py", "ts", "js"].iter().map(|s| (*s).to_string()).collect();

    let ctx = assemble(AssembleParams {
        root: root.clone(),
        include_globs: config.project.context_include.as_deref(),
        exclude_globs: config.project.context_exclude.as_deref().unwrap_or(&[]),
        release_scope: None,
        source_dirs: &source_dirs,
        source_extensions: &source_extensions,
        open_issue_summary: String::new(),
        operator_notes: None,
        max_context_bytes: config.cobbler.max_context_bytes,
        required_reading: None,
    })
    .map_err(|e| CobblerError::Other(e.into()))?;

    let releases = config.project.releases.clone().unwrap_or_default();
    let snapshot = cobbler_analyzer::analyze(&ctx, &root, &releases);

    if snapshot.is_clean() {
        println!("analyze: no issues found");
        return Ok(());
    }

    let yaml = serde_yaml::to_string(&snapshot).map_err(|e| CobblerError::Other(e.into()))?;
    print!("{yaml}");
    Ok(())
}

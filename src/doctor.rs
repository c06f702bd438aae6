//! Environment diagnostics (`cobbler doctor`, SPEC_FULL.md A.5): checks that
//! the binaries and credentials cobbler needs at runtime are actually
//! reachable, in the style of the teacher crate's `discover_binary` checks
//! in `llm/claude_cli.rs`, gathered up front instead of surfacing one at a
//! time mid-run.

use cobbler_config::Config;

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub ok: bool,
    pub detail: String,
}

/// Runs every environment check and returns the full list, in the order
/// they're printed, regardless of whether an earlier one failed.
#[must_use]
pub fn run_checks(config: &Config) -> Vec<CheckResult> {
    vec![
        check_git(),
        check_llm_binary(config),
        check_credentials(config),
        check_issues_repo(config),
        check_scratch_dir(config),
    ]
}

/// `true` if every check passed.
#[must_use]
pub fn all_ok(results: &[CheckResult]) -> bool {
    results.iter().all(|r| r.ok)
}

fn check_git() -> CheckResult {
    match which::which("git") {
        Ok(path) => CheckResult {
            name: "git".to_string(),
            ok: true,
            detail: format!("found at {}", path.display()),
        },
        Err(err) => CheckResult {
            name: "git".to_string(),
            ok: false,
            detail: format!("not found on PATH: {err}"),
        },
    }
}

fn check_llm_binary(config: &Config) -> CheckResult {
    let configured = config.claude.binary.as_deref();
    let lookup = configured.unwrap_or("claude");
    match which::which(lookup) {
        Ok(path) => CheckResult {
            name: "llm binary".to_string(),
            ok: true,
            detail: format!("found `{lookup}` at {}", path.display()),
        },
        Err(err) => CheckResult {
            name: "llm binary".to_string(),
            ok: false,
            detail: format!("`{lookup}` not found on PATH: {err}"),
        },
    }
}

fn check_credentials(config: &Config) -> CheckResult {
    let Some(path) = config.claude.credentials_path.as_deref() else {
        return CheckResult {
            name: "llm credentials".to_string(),
            ok: true,
            detail: "no credentials_path configured; assuming the llm binary handles its own auth".to_string(),
        };
    };
    if std::path::Path::new(path).exists() {
        CheckResult {
            name: "llm credentials".to_string(),
            ok: true,
            detail: format!("found at {path}"),
        }
    } else {
        CheckResult {
            name: "llm credentials".to_string(),
            ok: false,
            detail: format!("configured path {path} does not exist"),
        }
    }
}

fn check_issues_repo(config: &Config) -> CheckResult {
    match &config.cobbler.issues_repo {
        Some(repo) => CheckResult {
            name: "issue store".to_string(),
            ok: true,
            detail: format!("issues_repo configured as {repo}"),
        },
        None => CheckResult {
            name: "issue store".to_string(),
            ok: true,
            detail: "issues_repo not set; will be inferred from the git remote at runtime".to_string(),
        },
    }
}

fn check_scratch_dir(config: &Config) -> CheckResult {
    let dir = std::path::Path::new(&config.cobbler.dir);
    if dir.exists() && !dir.is_dir() {
        CheckResult {
            name: "scratch directory".to_string(),
            ok: false,
            detail: format!("{} exists but is not a directory", config.cobbler.dir),
        }
    } else {
        CheckResult {
            name: "scratch directory".to_string(),
            ok: true,
            detail: format!("will use {}", config.cobbler.dir),
        }
    }
}

//! CLI entry point (C13): resolves configuration, wires the concrete
//! adapters (`GitVcs`, `GithubIssueStore`, `LlmGateway`) to the generation
//! lifecycle, and dispatches to a command handler. Mirrors the teacher
//! crate's `cli::run` in shape: build context once, match on the parsed
//! subcommand, map the result to an [`crate::exit_codes::ExitCode`].

use std::collections::HashSet;
use std::time::Duration;

use camino::Utf8PathBuf;
use cobbler_config::Config;
use cobbler_generation::{GenerationLifecycle, GenerationParams, SeedTemplate};
use cobbler_history::ScratchHistory;
use cobbler_issues::{GithubIssueStore, IssueStore, detect_repo_identity};
use cobbler_llm::LlmGateway;
use cobbler_runner::{CommandSpec, NativeRunner};
use cobbler_vcs::GitVcs;

use crate::cli::args::{Cli, Command, GeneratorCommand, IssuesCommand};
use crate::cli::commands;
use crate::error::CobblerError;
use crate::exit_codes::ExitCode;
use crate::lock::GenerationLock;

/// Every adapter the generation lifecycle needs, assembled once per
/// invocation from [`Config`]. Held as owned values (not just passed by
/// reference) so command handlers can build a [`GenerationLifecycle`]
/// borrowing from `self` without a second round of construction.
pub struct Runtime {
    pub vcs: GitVcs<NativeRunner>,
    pub issues: Box<dyn IssueStore>,
    pub llm: LlmGateway<NativeRunner>,
    pub history: ScratchHistory,
    pub params: GenerationParams,
    _lock: GenerationLock,
}

impl Runtime {
    #[must_use]
    pub fn lifecycle(&self) -> GenerationLifecycle<'_, NativeRunner> {
        GenerationLifecycle::new(&self.vcs, self.issues.as_ref(), &self.llm, &self.history, &self.params)
    }
}

/// Parse arguments, run the matched command, and return the exit code the
/// process should terminate with. Never panics on a handled error path —
/// every fallible step returns through [`CobblerError`].
pub async fn run(cli: Cli) -> ExitCode {
    crate::logging::init(cli.verbose);
    install_sigint_handler();

    match run_inner(&cli).await {
        Ok(()) => ExitCode::success(),
        Err(err) => {
            let friendly = err.display_for_user();
            tracing::error!(kind = friendly.kind, "{}", friendly.message);
            eprintln!("error: {}", friendly.message);
            ExitCode(friendly.exit_code)
        }
    }
}

/// Installs a background task that marks the process-wide cancellation flag
/// on `SIGINT` (spec.md §5 "Cancellation semantics"). The runner checks this
/// flag around every subprocess it spawns and kills the active child's
/// process group; the flag is deliberately process-wide and one-shot (it is
/// never reset), since a driver that saw one `SIGINT` is shutting down.
fn install_sigint_handler() {
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("SIGINT received, cancelling the active subprocess");
            cobbler_runner::request_cancellation();
        }
    });
}

async fn run_inner(cli: &Cli) -> Result<(), CobblerError> {
    let cli_args = cli.to_config_cli_args();
    let config = Config::discover(&cli_args)?;

    match &cli.command {
        Command::Init => commands::scaffold::init(&config),
        Command::Reset => commands::scaffold::reset(&config),
        Command::Stats => commands::scaffold::stats(&config),
        Command::Build => commands::passthrough::build(&config),
        Command::Lint => commands::passthrough::lint(&config),
        Command::Install => commands::passthrough::install(&config),
        Command::Clean => commands::passthrough::clean(&config),
        Command::Credentials => commands::scaffold::credentials(&config),
        Command::Doctor => commands::doctor::run(&config),
        Command::Analyze => commands::analyze::run(&config),
        Command::ScratchReset => commands::scaffold::scratch_reset(&config),
        Command::Propose => {
            let rt = build_runtime(&config)?;
            commands::generator::propose(&rt).await
        }
        Command::Execute => {
            let rt = build_runtime(&config)?;
            commands::generator::execute(&rt).await
        }
        Command::Generator(sub) => dispatch_generator(&config, sub).await,
        Command::Issues(sub) => dispatch_issues(&config, sub).await,
    }
}

async fn dispatch_generator(config: &Config, sub: &GeneratorCommand) -> Result<(), CobblerError> {
    match sub {
        GeneratorCommand::Start => {
            let rt = build_runtime(config)?;
            commands::generator::start(&rt, &config.generation.branch).await
        }
        GeneratorCommand::Run => {
            let rt = build_runtime(config)?;
            commands::generator::run_cycle(&rt).await
        }
        GeneratorCommand::Resume => {
            let rt = build_runtime(config)?;
            commands::generator::resume(&rt).await
        }
        GeneratorCommand::Stop => {
            let rt = build_runtime(config)?;
            commands::generator::stop(&rt).await
        }
        GeneratorCommand::Reset => {
            let rt = build_runtime(config)?;
            commands::generator::reset(&rt).await
        }
        GeneratorCommand::Status => {
            let rt = build_runtime(config)?;
            commands::generator::status(&rt).await
        }
        GeneratorCommand::Switch { name } => {
            let (vcs, repo_root, ..) = build_vcs(config)?;
            commands::generator::switch(&vcs, &repo_root, name).await
        }
        GeneratorCommand::List => {
            let (vcs, repo_root, ..) = build_vcs(config)?;
            commands::generator::list(&vcs, &repo_root, &config.generation.prefix).await
        }
    }
}

async fn dispatch_issues(config: &Config, sub: &IssuesCommand) -> Result<(), CobblerError> {
    let issues = build_issue_store(config)?;
    match sub {
        IssuesCommand::Init => commands::issues::init(issues.as_ref(), config).await,
        IssuesCommand::Reset => commands::issues::reset(issues.as_ref(), config).await,
    }
}

/// Assemble the concrete adapters and take the single-active-generation
/// lock (spec.md §3). The lock is released when the returned [`Runtime`]
/// is dropped at the end of the command handler's scope.
fn build_runtime(config: &Config) -> Result<Runtime, CobblerError> {
    let (vcs, repo_root, worktree_root) = build_vcs(config)?;
    let issues = build_issue_store(config)?;
    let llm = build_llm(config)?;
    let scratch_root = Utf8PathBuf::from(&config.cobbler.dir);
    let history = ScratchHistory::new(scratch_root.clone());
    let params = build_params(config, repo_root, worktree_root)?;

    let lock = GenerationLock::acquire(scratch_root.as_std_path()).map_err(|e| CobblerError::LockHeld(e.to_string()))?;

    Ok(Runtime {
        vcs,
        issues,
        llm,
        history,
        params,
        _lock: lock,
    })
}

fn build_vcs(config: &Config) -> Result<(GitVcs<NativeRunner>, Utf8PathBuf, Utf8PathBuf), CobblerError> {
    let cwd = std::env::current_dir().map_err(|e| CobblerError::Other(e.into()))?;
    let repo_root = Utf8PathBuf::from_path_buf(cwd).map_err(|_| CobblerError::Environment {
        tool: "non-UTF-8 working directory".to_string(),
    })?;
    let worktree_root = repo_root.join(&config.cobbler.dir).join("worktrees");
    let vcs = GitVcs::new(NativeRunner, Duration::from_secs(config.llm.max_time_sec.max(60)));
    Ok((vcs, repo_root, worktree_root))
}

fn build_issue_store(config: &Config) -> Result<Box<dyn IssueStore>, CobblerError> {
    let token = std::env::var("COBBLER_ISSUE_TOKEN")
        .or_else(|_| std::env::var("GITHUB_TOKEN"))
        .map_err(|_| CobblerError::MissingCredentials {
            path: "COBBLER_ISSUE_TOKEN or GITHUB_TOKEN".to_string(),
        })?;
    let remote_url = git_remote_url();
    let repo = detect_repo_identity(
        config.cobbler.issues_repo.as_deref(),
        remote_url.as_deref(),
        config.project.module_path.as_deref(),
    )
    .ok_or(CobblerError::Environment {
        tool: "issue store repo identity (cobbler.issues_repo, git remote, or project.module_path)".to_string(),
    })?;
    let store = GithubIssueStore::new(repo, token, "https://api.github.com")?;
    Ok(Box::new(store))
}

fn git_remote_url() -> Option<String> {
    let output = std::process::Command::new("git").args(["remote", "get-url", "origin"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok().map(|s| s.trim().to_string())
}

fn build_llm(config: &Config) -> Result<LlmGateway<NativeRunner>, CobblerError> {
    let binary = config.claude.binary.clone().unwrap_or_else(|| "claude".to_string());
    which::which(&binary).map_err(|_| CobblerError::Environment { tool: binary.clone() })?;
    let mut spec = CommandSpec::new(binary);
    spec = spec.args(config.llm.args.clone());
    Ok(LlmGateway::new(NativeRunner, spec, Duration::from_secs(config.llm.max_time_sec)))
}

fn build_params(config: &Config, repo_root: Utf8PathBuf, worktree_root: Utf8PathBuf) -> Result<GenerationParams, CobblerError> {
    let source_extensions: HashSet<String> = ["go", "rs", "py", "ts", "js"].iter().map(|s| (*s).to_string()).collect();
    let release_scope = config.project.release.clone().map(|r| HashSet::from([r]));
    let seed_templates = config
        .project
        .seed_files
        .clone()
        .unwrap_or_default()
        .into_iter()
        .map(|path| SeedTemplate {
            content: std::fs::read_to_string(&path).unwrap_or_default(),
            dest_path: repo_root.join(path),
        })
        .collect();

    Ok(GenerationParams {
        prefix: config.generation.prefix.clone(),
        repo_root,
        worktree_root,
        cycles: config.generation.cycles,
        max_measure_issues: config.cobbler.max_measure_issues,
        max_measure_retries: config.cobbler.max_measure_retries,
        max_requirements_per_task: config.cobbler.max_requirements_per_task,
        enforce_measure_validation: config.cobbler.enforce_measure_validation,
        estimated_lines_min: config.cobbler.estimated_lines_min,
        estimated_lines_max: config.cobbler.estimated_lines_max,
        max_context_bytes: config.cobbler.max_context_bytes,
        max_stitch_issues: config.cobbler.max_stitch_issues,
        max_stitch_issues_per_cycle: config.cobbler.max_stitch_issues_per_cycle,
        source_dirs: config.project.source_dirs.clone().unwrap_or_else(|| vec!["src".to_string()]),
        source_extensions,
        release_scope,
        configured_releases: config.project.releases.clone().unwrap_or_default(),
        explicit_branch: explicit_generation_branch(config),
        seed_templates,
        version: env!("CARGO_PKG_VERSION").to_string(),
        module_path: config.project.module_path.clone().unwrap_or_default(),
    })
}

/// `generation.branch` doubles as the base branch `start` forks off of
/// (spec.md §4.9.1) and, per §4.9.3 step 1, an operator override that pins
/// down which generation branch to resume when more than one matches the
/// configured prefix. Only treat it as the latter when it actually looks
/// like a generation branch (starts with `<prefix>-`) — the common case
/// (an unconfigured or base-branch value like `main`) must keep falling
/// through to the glob-based lookup in `current_handle`.
fn explicit_generation_branch(config: &Config) -> Option<String> {
    let branch = &config.generation.branch;
    let prefix_marker = format!("{}-", config.generation.prefix);
    branch.starts_with(&prefix_marker).then(|| branch.clone())
}

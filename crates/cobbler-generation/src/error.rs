/// Errors the generation lifecycle (C9) can surface. Recoverable failures
/// (transient label mutations, a single failed task) never reach here — they
/// are handled inline by the lower components. What's left is genuinely
/// fatal to the current cycle or command (spec.md sec 7).
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("vcs operation failed: {0}")]
    Vcs(#[from] cobbler_vcs::VcsError),

    #[error("issue store operation failed: {0}")]
    Issue(#[from] cobbler_issues::IssueError),

    #[error("scheduler operation failed: {0}")]
    Scheduler(#[from] cobbler_scheduler::SchedulerError),

    #[error("context assembly failed: {0}")]
    Context(#[from] cobbler_context::ContextError),

    #[error("history write failed: {0}")]
    History(#[from] cobbler_history::HistoryError),

    #[error("worktree executor failed: {0}")]
    Executor(#[from] cobbler_executor::ExecutorError),

    #[error("LLM invocation failed: {0}")]
    Llm(#[from] cobbler_llm::LlmError),

    #[error("proposed tasks failed validation: {0:?}")]
    Validation(Vec<String>),

    #[error("failed to serialize proposed task {title:?}: {source}")]
    SerializeTask { title: String, source: serde_yaml::Error },

    #[error("failed to write seed template to {path}: {source}")]
    SeedTemplate {
        path: camino::Utf8PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("the working tree has uncommitted changes; commit or stash before starting a generation")]
    DirtyWorkingTree,

    #[error("no generation branch matching prefix {prefix:?} was found to resume")]
    NoActiveGeneration { prefix: String },

    #[error("more than one candidate generation branch exists and no explicit branch was configured: {0:?}")]
    AmbiguousActiveGeneration(Vec<String>),
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
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
}

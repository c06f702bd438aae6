#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Issue(#[from] cobbler_issues::IssueError),
}

use camino::Utf8PathBuf;
use cobbler_runner::RunnerError;

#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    #[error("failed to run git {operation} in {dir}: {source}")]
    Spawn {
        operation: String,
        dir: Utf8PathBuf,
        #[source]
        source: RunnerError,
    },

    #[error("git {operation} in {dir} exited with status {code:?}: {stderr}")]
    NonZeroExit {
        operation: String,
        dir: Utf8PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    #[error("git {operation} in {dir} produced non-UTF-8 output")]
    NonUtf8Output { operation: String, dir: Utf8PathBuf },
}

impl VcsError {
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::NonZeroExit { stderr, .. } => {
                let lower = stderr.to_lowercase();
                lower.contains("conflict") || lower.contains("would be overwritten")
            }
            _ => false,
        }
    }
}

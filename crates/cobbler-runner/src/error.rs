#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("failed to spawn {program}: {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("failed to write stdin to {program}: {reason}")]
    StdinWrite { program: String, reason: String },

    #[error("{program} timed out after {timeout_secs}s")]
    Timeout { program: String, timeout_secs: u64 },

    #[error("failed to wait on {program}: {reason}")]
    Wait { program: String, reason: String },
}

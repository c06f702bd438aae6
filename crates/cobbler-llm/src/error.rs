#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("failed to run LLM subprocess: {0}")]
    Runner(#[from] cobbler_runner::RunnerError),

    #[error("LLM subprocess timed out")]
    Timeout,

    #[error("LLM exited with a non-zero status: {code:?}, stderr: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("no result record found in LLM output stream")]
    NoResultRecord,

    #[error("no fenced yaml block found in LLM textual output")]
    NoYamlBlock,
}

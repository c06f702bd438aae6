#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("no repository identity configured and none could be detected")]
    NoRepoIdentity,

    #[error("issue store request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("issue store returned {status} for {operation}: {body}")]
    Api {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("issue store response for {operation} could not be parsed: {source}")]
    Decode {
        operation: String,
        #[source]
        source: serde_json::Error,
    },
}

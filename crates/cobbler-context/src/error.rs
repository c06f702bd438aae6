use camino::Utf8PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid include/exclude glob {pattern}: {source}")]
    BadGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// A typed category failed strict decoding (spec.md sec 4.4: "a schema error
/// but not fatal to assembly"). Collected on [`crate::ProjectContext`] rather
/// than returned, so assembly always completes.
#[derive(Debug, Clone)]
pub struct SchemaError {
    pub path: Utf8PathBuf,
    pub message: String,
}

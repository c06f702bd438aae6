use camino::Utf8PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to serialize {what} for {path}: {source}")]
    Serialize {
        what: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to deserialize {what} from {path}: {source}")]
    Deserialize {
        what: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

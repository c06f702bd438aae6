use camino::Utf8PathBuf;

/// Where a resolved config value came from, tracked per field so `doctor`
/// and `stats` can tell an operator why a value is what it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    ConfigFile(Utf8PathBuf),
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::ConfigFile(path) => write!(f, "config file ({path})"),
            Self::Defaults => write!(f, "defaults"),
        }
    }
}

use camino::Utf8PathBuf;

/// Overrides supplied on the command line. Any field left `None`/empty
/// falls through to the config file, then to defaults.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<Utf8PathBuf>,
    pub release: Option<String>,
    pub cycles: Option<u32>,
    pub max_time_sec: Option<u64>,
    pub max_context_bytes: Option<usize>,
    pub enforce_measure_validation: Option<bool>,
    pub dir: Option<String>,
}

//! Configuration loading for cobbler: a single YAML document (spec.md §6.6)
//! with precedence CLI > config file > built-in defaults, and per-field
//! source attribution so an operator can ask "why is this value what it is".

mod cli_args;
mod discover;
mod doc;
mod error;
mod sections;
mod source;

use std::collections::HashMap;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};

pub use cli_args::CliArgs;
pub use discover::discover_config_file_from;
pub use doc::YamlDoc;
pub use error::ConfigError;
pub use sections::{ClaudeConfig, CobblerConfig, GenerationConfig, LlmConfig, ProjectConfig};
pub use source::ConfigSource;

/// Fully resolved configuration, plus a record of where every tracked field
/// came from.
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub generation: GenerationConfig,
    pub cobbler: CobblerConfig,
    pub llm: LlmConfig,
    pub claude: ClaudeConfig,
    source_attribution: HashMap<String, ConfigSource>,
}

impl Config {
    /// Discover and load configuration, searching from the current directory.
    pub fn discover(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|_| ConfigError::NonUtf8Cwd)?;
        let start_dir = Utf8PathBuf::from_path_buf(cwd).map_err(|_| ConfigError::NonUtf8Cwd)?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Path-driven variant used by tests to avoid process-global state.
    pub fn discover_from(start_dir: &Utf8Path, cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let mut project = ProjectConfig::default();
        let mut generation = GenerationConfig::default();
        let mut cobbler = CobblerConfig::default();
        let mut llm = LlmConfig::default();
        let mut claude = ClaudeConfig::default();

        let mut source_attribution = HashMap::new();
        for field in [
            "generation.prefix",
            "generation.branch",
            "generation.cycles",
            "cobbler.dir",
            "cobbler.max_stitch_issues",
            "cobbler.max_stitch_issues_per_cycle",
            "cobbler.max_measure_issues",
            "cobbler.max_measure_retries",
            "cobbler.enforce_measure_validation",
            "cobbler.max_context_bytes",
            "llm.max_time_sec",
            "project.release",
        ] {
            source_attribution.insert(field.to_string(), ConfigSource::Defaults);
        }

        let config_path = match &cli_args.config_path {
            Some(p) => Some(p.clone()),
            None => discover_config_file_from(start_dir),
        };

        if let Some(path) = &config_path {
            let doc = Self::load_yaml_doc(path)?;
            let from_file = ConfigSource::ConfigFile(path.clone());

            if let Some(p) = doc.project {
                if p.release.is_some() {
                    project.release = p.release;
                    source_attribution.insert("project.release".to_string(), from_file.clone());
                }
                if p.module_path.is_some() {
                    project.module_path = p.module_path;
                }
                if p.binary_name.is_some() {
                    project.binary_name = p.binary_name;
                }
                if p.binary_dir.is_some() {
                    project.binary_dir = p.binary_dir;
                }
                if p.main_package.is_some() {
                    project.main_package = p.main_package;
                }
                if p.source_dirs.is_some() {
                    project.source_dirs = p.source_dirs;
                }
                if p.magefiles_dir.is_some() {
                    project.magefiles_dir = p.magefiles_dir;
                }
                if p.releases.is_some() {
                    project.releases = p.releases;
                }
                if p.context_include.is_some() {
                    project.context_include = p.context_include;
                }
                if p.context_exclude.is_some() {
                    project.context_exclude = p.context_exclude;
                }
                if p.context_sources.is_some() {
                    project.context_sources = p.context_sources;
                }
                if p.seed_files.is_some() {
                    project.seed_files = p.seed_files;
                }
            }

            if let Some(g) = doc.generation {
                generation = g;
                source_attribution.insert("generation.prefix".to_string(), from_file.clone());
                source_attribution.insert("generation.branch".to_string(), from_file.clone());
                source_attribution.insert("generation.cycles".to_string(), from_file.clone());
            }

            if let Some(c) = doc.cobbler {
                cobbler = c;
                source_attribution.insert("cobbler.dir".to_string(), from_file.clone());
                source_attribution.insert("cobbler.max_stitch_issues".to_string(), from_file.clone());
                source_attribution.insert(
                    "cobbler.max_stitch_issues_per_cycle".to_string(),
                    from_file.clone(),
                );
                source_attribution.insert("cobbler.max_measure_issues".to_string(), from_file.clone());
                source_attribution.insert("cobbler.max_measure_retries".to_string(), from_file.clone());
                source_attribution.insert(
                    "cobbler.enforce_measure_validation".to_string(),
                    from_file.clone(),
                );
                source_attribution.insert("cobbler.max_context_bytes".to_string(), from_file.clone());
            }

            if let Some(l) = doc.llm {
                llm = l;
                source_attribution.insert("llm.max_time_sec".to_string(), from_file.clone());
            }

            if let Some(c) = doc.claude {
                claude = c;
            }
        }

        // CLI overrides take final precedence.
        if let Some(release) = &cli_args.release {
            project.release = Some(release.clone());
            source_attribution.insert("project.release".to_string(), ConfigSource::Cli);
        }
        if let Some(cycles) = cli_args.cycles {
            generation.cycles = cycles;
            source_attribution.insert("generation.cycles".to_string(), ConfigSource::Cli);
        }
        if let Some(max_time_sec) = cli_args.max_time_sec {
            llm.max_time_sec = max_time_sec;
            source_attribution.insert("llm.max_time_sec".to_string(), ConfigSource::Cli);
        }
        if let Some(max_context_bytes) = cli_args.max_context_bytes {
            cobbler.max_context_bytes = max_context_bytes;
            source_attribution.insert("cobbler.max_context_bytes".to_string(), ConfigSource::Cli);
        }
        if let Some(enforce) = cli_args.enforce_measure_validation {
            cobbler.enforce_measure_validation = enforce;
            source_attribution.insert(
                "cobbler.enforce_measure_validation".to_string(),
                ConfigSource::Cli,
            );
        }
        if let Some(dir) = &cli_args.dir {
            cobbler.dir = dir.clone();
            source_attribution.insert("cobbler.dir".to_string(), ConfigSource::Cli);
        }

        Ok(Self {
            project,
            generation,
            cobbler,
            llm,
            claude,
            source_attribution,
        })
    }

    fn load_yaml_doc(path: &Utf8Path) -> Result<YamlDoc, ConfigError> {
        let content = fs::read_to_string(path.as_std_path()).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Where the named field's value came from. Unknown field names return
    /// `None`, not `Defaults` — only the fields tracked above are attributed.
    #[must_use]
    pub fn source_of(&self, field: &str) -> Option<&ConfigSource> {
        self.source_attribution.get(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &Utf8Path, yaml: &str) {
        fs::create_dir_all(dir.join(".cobbler")).unwrap();
        fs::write(dir.join(".cobbler").join("config.yaml"), yaml).unwrap();
    }

    #[test]
    fn defaults_apply_when_no_config_file_present() {
        let td = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();

        let cfg = Config::discover_from(&root, &CliArgs::default()).unwrap();
        assert_eq!(cfg.cobbler.dir, ".cobbler");
        assert_eq!(cfg.source_of("cobbler.dir"), Some(&ConfigSource::Defaults));
    }

    #[test]
    fn config_file_overrides_defaults() {
        let td = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        write_config(
            &root,
            "cobbler:\n  dir: .scratch\n  max_stitch_issues: 5\n  max_stitch_issues_per_cycle: 2\n  max_measure_issues: 2\n  max_measure_retries: 1\n  enforce_measure_validation: true\n  estimated_lines_min: 1\n  estimated_lines_max: 2\n  max_context_bytes: 1024\n",
        );

        let cfg = Config::discover_from(&root, &CliArgs::default()).unwrap();
        assert_eq!(cfg.cobbler.dir, ".scratch");
        assert!(cfg.cobbler.enforce_measure_validation);
        assert_eq!(
            cfg.source_of("cobbler.dir"),
            Some(&ConfigSource::ConfigFile(root.join(".cobbler").join("config.yaml")))
        );
    }

    #[test]
    fn cli_args_override_config_file() {
        let td = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        write_config(
            &root,
            "cobbler:\n  dir: .scratch\n  max_stitch_issues: 5\n  max_stitch_issues_per_cycle: 2\n  max_measure_issues: 2\n  max_measure_retries: 1\n  enforce_measure_validation: false\n  estimated_lines_min: 1\n  estimated_lines_max: 2\n  max_context_bytes: 1024\n",
        );

        let cli = CliArgs {
            dir: Some(".override".to_string()),
            ..Default::default()
        };
        let cfg = Config::discover_from(&root, &cli).unwrap();
        assert_eq!(cfg.cobbler.dir, ".override");
        assert_eq!(cfg.source_of("cobbler.dir"), Some(&ConfigSource::Cli));
    }
}

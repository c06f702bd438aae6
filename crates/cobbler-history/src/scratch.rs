use camino::{Utf8Path, Utf8PathBuf};
use cobbler_utils::paths;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::HistoryError;
use crate::types::{DiffReport, ExecutionRecord, Phase};

/// One repository's scratch directory (spec.md sec 4.11). Every write goes
/// through [`cobbler_utils::write_file_atomic`] except history artifacts,
/// which spec.md sec 5 explicitly allows as raw overwrites.
pub struct ScratchHistory {
    root: Utf8PathBuf,
}

impl ScratchHistory {
    #[must_use]
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn write_base_branch(&self, branch: &str) -> Result<(), HistoryError> {
        let path = paths::base_branch_file(&self.root);
        cobbler_utils::write_file_atomic(&path, branch).map_err(|source| HistoryError::Write { path, source })
    }

    #[must_use]
    pub fn read_base_branch(&self) -> Option<String> {
        let path = paths::base_branch_file(&self.root);
        std::fs::read_to_string(path.as_std_path()).ok().map(|s| s.trim().to_string())
    }

    pub fn write_analysis_snapshot<T: Serialize>(&self, snapshot: &T) -> Result<(), HistoryError> {
        let path = paths::analysis_file(&self.root);
        write_yaml(&path, "analysis snapshot", snapshot)
    }

    /// Append proposals to the persistent append-only log (spec.md sec 4.11,
    /// 9 "Append-only proposal log"). Implemented as read-modify-rewrite
    /// under an atomic write, so the file is never observed half-written.
    pub fn append_proposal_log<T>(&self, new_entries: &[T]) -> Result<(), HistoryError>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        let path = paths::measure_log_file(&self.root);
        let mut existing: Vec<T> = if path.as_std_path().exists() {
            let content = std::fs::read_to_string(path.as_std_path()).map_err(|source| HistoryError::Read {
                path: path.clone(),
                source,
            })?;
            serde_yaml::from_str(&content).map_err(|source| HistoryError::Deserialize {
                what: "proposal log",
                path: path.clone(),
                source,
            })?
        } else {
            Vec::new()
        };
        existing.extend_from_slice(new_entries);
        write_yaml(&path, "proposal log", &existing)
    }

    pub fn write_measure_raw(&self, timestamp: &str, content: &str) -> Result<(), HistoryError> {
        let path = paths::measure_raw_file(&self.root, timestamp);
        cobbler_utils::write_file_atomic(&path, content).map_err(|source| HistoryError::Write { path, source })
    }

    /// Deleted after a successful import; errors are ignored if the file is
    /// already gone (spec.md sec 4.11: "deleted after successful import").
    pub fn delete_measure_raw(&self, timestamp: &str) {
        let path = paths::measure_raw_file(&self.root, timestamp);
        let _ = std::fs::remove_file(path.as_std_path());
    }

    pub fn save_prompt(&self, timestamp: &str, phase: Phase, rendered_yaml: &str) -> Result<(), HistoryError> {
        let path = paths::history_file(&self.root, timestamp, phase.as_str(), "prompt.yaml");
        cobbler_utils::write_file_atomic(&path, rendered_yaml).map_err(|source| HistoryError::Write { path, source })
    }

    pub fn save_stream_log(&self, timestamp: &str, phase: Phase, raw: &[u8]) -> Result<(), HistoryError> {
        let path = paths::history_file(&self.root, timestamp, phase.as_str(), "log.bin");
        paths::ensure_dir_all(path.parent().unwrap_or(Utf8Path::new("."))).map_err(|e| HistoryError::Write {
            path: path.clone(),
            source: anyhow::anyhow!(e),
        })?;
        std::fs::write(path.as_std_path(), raw).map_err(|source| HistoryError::Write {
            path,
            source: anyhow::anyhow!(source),
        })
    }

    pub fn write_stats(&self, timestamp: &str, phase: Phase, record: &ExecutionRecord) -> Result<(), HistoryError> {
        let path = paths::history_file(&self.root, timestamp, phase.as_str(), "stats.yaml");
        write_yaml(&path, "execution record", record)
    }

    pub fn write_report(&self, timestamp: &str, phase: Phase, report: &DiffReport) -> Result<(), HistoryError> {
        let path = paths::history_file(&self.root, timestamp, phase.as_str(), "report.yaml");
        write_yaml(&path, "diff report", report)
    }
}

fn write_yaml<T: Serialize>(path: &Utf8Path, what: &'static str, value: &T) -> Result<(), HistoryError> {
    let yaml = serde_yaml::to_string(value).map_err(|source| HistoryError::Serialize {
        what,
        path: path.to_path_buf(),
        source,
    })?;
    cobbler_utils::write_file_atomic(path, &yaml).map_err(|source| HistoryError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Entry {
        title: String,
    }

    fn history() -> (tempfile::TempDir, ScratchHistory) {
        let td = tempfile::TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(td.path().join(".cobbler")).unwrap();
        (td, ScratchHistory::new(root))
    }

    #[test]
    fn base_branch_round_trips() {
        let (_td, h) = history();
        assert_eq!(h.read_base_branch(), None);
        h.write_base_branch("main").unwrap();
        assert_eq!(h.read_base_branch(), Some("main".to_string()));
    }

    #[test]
    fn proposal_log_accumulates_across_calls() {
        let (_td, h) = history();
        h.append_proposal_log(&[Entry { title: "a".into() }]).unwrap();
        h.append_proposal_log(&[Entry { title: "b".into() }]).unwrap();

        let path = paths::measure_log_file(h.root());
        let content = std::fs::read_to_string(path.as_std_path()).unwrap();
        let all: Vec<Entry> = serde_yaml::from_str(&content).unwrap();
        assert_eq!(all, vec![Entry { title: "a".into() }, Entry { title: "b".into() }]);
    }

    #[test]
    fn measure_raw_deletion_is_idempotent() {
        let (_td, h) = history();
        h.delete_measure_raw("2026-07-27-10-00-00"); // no file yet: must not panic
        h.write_measure_raw("2026-07-27-10-00-00", "- a\n").unwrap();
        h.delete_measure_raw("2026-07-27-10-00-00");
        let path = paths::measure_raw_file(h.root(), "2026-07-27-10-00-00");
        assert!(!path.as_std_path().exists());
    }
}

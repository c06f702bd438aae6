use camino::{Utf8Path, Utf8PathBuf};

/// Search upward from `start_dir` for `.cobbler/config.yaml`, stopping at the
/// first repository root marker (`.git`, `.hg`, `.svn`) or the filesystem
/// root. Returns `None` if no config file is found — callers fall back to
/// defaults, a missing config file is not an error.
#[must_use]
pub fn discover_config_file_from(start_dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let candidate = current.join(".cobbler").join("config.yaml");
        if candidate.as_std_path().exists() {
            return Some(candidate);
        }

        if current.join(".git").as_std_path().exists()
            || current.join(".hg").as_std_path().exists()
            || current.join(".svn").as_std_path().exists()
        {
            return None;
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return None,
        }
    }
}

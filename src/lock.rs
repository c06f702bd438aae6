//! Single-active-generation lock (spec.md sec 3: "Invariant: a repository
//! has at most one active generation at a time").
//!
//! An `fd-lock`-backed exclusive lock over a file in the scratch directory,
//! with a JSON sidecar recording which process holds it so a crashed
//! holder's lock can be told apart from a live one and recovered instead of
//! wedging every future `generator start`/`resume`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use fd_lock::RwLock;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    pub pid: u32,
    pub created_at: u64,
    pub cobbler_version: String,
}

impl LockInfo {
    fn current() -> Self {
        Self {
            pid: std::process::id(),
            created_at: SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0),
            cobbler_version: crate::cobbler_version(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("another generation is already active (held by pid {pid}, created {created_at})")]
    ConcurrentExecution { pid: u32, created_at: u64 },

    #[error("lock file is corrupted: {reason}")]
    Corrupted { reason: String },

    #[error("failed to acquire the generation lock: {0}")]
    Io(#[from] io::Error),
}

/// Holds the exclusive lock for as long as it lives; dropping it releases
/// the `fd-lock` (closing the file descriptor) and removes the sidecar info
/// file. Advisory only, like the teacher crate's own file locking: it
/// coordinates cooperating `cobbler` processes, not a security boundary.
pub struct GenerationLock {
    info_path: PathBuf,
    _lock: RwLock<fs::File>,
}

impl GenerationLock {
    /// Try to acquire the lock at `scratch_dir/generator.lock`. If the lock
    /// file is held by a process that is no longer alive (checked via
    /// `kill(pid, 0)` on unix; assumed dead elsewhere), the stale lock is
    /// recovered and reacquired rather than treated as held.
    pub fn acquire(scratch_dir: &Path) -> Result<Self, LockError> {
        cobbler_utils::paths::ensure_dir_all(scratch_dir)?;
        let lock_path = scratch_dir.join("generator.lock");
        let info_path = scratch_dir.join("generator.lock.json");

        if let Some(existing) = Self::read_info(&info_path)?
            && Self::is_alive(existing.pid)
        {
            return Err(LockError::ConcurrentExecution {
                pid: existing.pid,
                created_at: existing.created_at,
            });
        }

        let file = fs::OpenOptions::new().create(true).truncate(false).write(true).read(true).open(&lock_path)?;
        let mut lock = RwLock::new(file);
        lock.try_write().map_err(|_| {
            LockError::Io(io::Error::new(
                io::ErrorKind::WouldBlock,
                "generation lock is held by another process",
            ))
        })?;

        let info = LockInfo::current();
        let json = serde_json::to_string_pretty(&info).map_err(|e| LockError::Corrupted { reason: e.to_string() })?;
        fs::write(&info_path, json)?;

        Ok(Self { info_path, _lock: lock })
    }

    fn read_info(path: &Path) -> Result<Option<LockInfo>, LockError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| LockError::Corrupted { reason: e.to_string() })
    }

    #[cfg(unix)]
    fn is_alive(pid: u32) -> bool {
        // kill(pid, 0) checks for existence/permission without sending a signal.
        unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
    }

    #[cfg(not(unix))]
    fn is_alive(_pid: u32) -> bool {
        true
    }
}

impl Drop for GenerationLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.info_path);
    }
}

use std::time::Duration;

use async_trait::async_trait;
use camino::Utf8Path;
use cobbler_runner::{CommandSpec, ProcessRunner};

use crate::error::VcsError;
use crate::parse::{parse_name_status, parse_numstat, parse_shortstat};
use crate::types::{DeleteMode, DiffShortStat, NameStatusEntry, NumstatEntry};

/// Typed facade over the VCS operations of spec.md sec 4.2 / 6.1. Every
/// method takes an explicit working directory; no operation relies on the
/// process-wide current directory (spec.md sec 4.2).
#[async_trait]
pub trait Vcs: Send + Sync {
    async fn checkout(&self, dir: &Utf8Path, branch: &str) -> Result<(), VcsError>;
    async fn checkout_new_branch(&self, dir: &Utf8Path, branch: &str, from_ref: &str) -> Result<(), VcsError>;
    async fn branch_exists(&self, dir: &Utf8Path, branch: &str) -> Result<bool, VcsError>;
    async fn delete_branch(&self, dir: &Utf8Path, branch: &str, mode: DeleteMode) -> Result<(), VcsError>;
    async fn list_branches(&self, dir: &Utf8Path, glob: &str) -> Result<Vec<String>, VcsError>;
    async fn create_tag(&self, dir: &Utf8Path, name: &str, at_ref: Option<&str>) -> Result<(), VcsError>;
    async fn delete_tag(&self, dir: &Utf8Path, name: &str) -> Result<(), VcsError>;
    async fn list_tags(&self, dir: &Utf8Path, glob: &str) -> Result<Vec<String>, VcsError>;
    async fn worktree_add(&self, dir: &Utf8Path, worktree_dir: &Utf8Path, branch: &str) -> Result<(), VcsError>;
    async fn worktree_add_new_branch(
        &self,
        dir: &Utf8Path,
        worktree_dir: &Utf8Path,
        new_branch: &str,
        from_ref: &str,
    ) -> Result<(), VcsError>;
    async fn worktree_remove(&self, dir: &Utf8Path, worktree_dir: &Utf8Path) -> Result<(), VcsError>;
    async fn worktree_prune(&self, dir: &Utf8Path) -> Result<(), VcsError>;
    async fn stage_all(&self, dir: &Utf8Path) -> Result<(), VcsError>;
    async fn stage_path(&self, dir: &Utf8Path, path: &str) -> Result<(), VcsError>;
    async fn reset_unstage(&self, dir: &Utf8Path) -> Result<(), VcsError>;
    async fn reset_soft(&self, dir: &Utf8Path, to_ref: &str) -> Result<(), VcsError>;
    async fn commit(&self, dir: &Utf8Path, message: &str, allow_empty: bool) -> Result<(), VcsError>;
    async fn rev_parse_head(&self, dir: &Utf8Path) -> Result<String, VcsError>;
    async fn current_branch(&self, dir: &Utf8Path) -> Result<String, VcsError>;
    async fn merge_no_edit(&self, dir: &Utf8Path, branch: &str) -> Result<(), VcsError>;
    async fn is_clean(&self, dir: &Utf8Path) -> Result<bool, VcsError>;
    async fn diff_shortstat(&self, dir: &Utf8Path, against_ref: &str) -> Result<DiffShortStat, VcsError>;
    async fn diff_name_status(&self, dir: &Utf8Path, against_ref: &str) -> Result<Vec<NameStatusEntry>, VcsError>;
    async fn diff_numstat(&self, dir: &Utf8Path, against_ref: &str) -> Result<Vec<NumstatEntry>, VcsError>;
    async fn show_file(&self, dir: &Utf8Path, at_ref: &str, path: &str) -> Result<String, VcsError>;
    async fn ls_files(&self, dir: &Utf8Path) -> Result<Vec<String>, VcsError>;
    async fn ls_tree(&self, dir: &Utf8Path, at_ref: &str) -> Result<Vec<String>, VcsError>;
    async fn stash_push(&self, dir: &Utf8Path, message: &str) -> Result<(), VcsError>;
}

/// Git-backed implementation, invoking the `git` binary through a
/// [`ProcessRunner`] (spec.md sec 6.1: every operation runs with an explicit
/// working directory).
pub struct GitVcs<R: ProcessRunner> {
    runner: R,
    timeout: Duration,
}

impl<R: ProcessRunner> GitVcs<R> {
    #[must_use]
    pub fn new(runner: R, timeout: Duration) -> Self {
        Self { runner, timeout }
    }

    async fn git(&self, dir: &Utf8Path, operation: &str, args: &[&str]) -> Result<String, VcsError> {
        let spec = CommandSpec::new("git").cwd(dir).args(args.iter().copied());
        let output = self
            .runner
            .run(&spec, None, self.timeout)
            .await
            .map_err(|source| VcsError::Spawn {
                operation: operation.to_string(),
                dir: dir.to_path_buf(),
                source,
            })?;

        if !output.success() {
            return Err(VcsError::NonZeroExit {
                operation: operation.to_string(),
                dir: dir.to_path_buf(),
                code: output.exit_code,
                stderr: output.stderr_lossy(),
            });
        }

        Ok(output.stdout_lossy())
    }

    async fn git_lines(&self, dir: &Utf8Path, operation: &str, args: &[&str]) -> Result<Vec<String>, VcsError> {
        let stdout = self.git(dir, operation, args).await?;
        Ok(stdout.lines().map(str::to_string).filter(|l| !l.is_empty()).collect())
    }
}

#[async_trait]
impl<R: ProcessRunner> Vcs for GitVcs<R> {
    async fn checkout(&self, dir: &Utf8Path, branch: &str) -> Result<(), VcsError> {
        self.git(dir, "checkout", &["checkout", branch]).await.map(|_| ())
    }

    async fn checkout_new_branch(&self, dir: &Utf8Path, branch: &str, from_ref: &str) -> Result<(), VcsError> {
        self.git(dir, "checkout -b", &["checkout", "-b", branch, from_ref])
            .await
            .map(|_| ())
    }

    async fn branch_exists(&self, dir: &Utf8Path, branch: &str) -> Result<bool, VcsError> {
        let spec = CommandSpec::new("git").cwd(dir).args([
            "show-ref",
            "--verify",
            "--quiet",
            &format!("refs/heads/{branch}"),
        ]);
        let output = self
            .runner
            .run(&spec, None, self.timeout)
            .await
            .map_err(|source| VcsError::Spawn {
                operation: "show-ref".to_string(),
                dir: dir.to_path_buf(),
                source,
            })?;
        Ok(output.success())
    }

    async fn delete_branch(&self, dir: &Utf8Path, branch: &str, mode: DeleteMode) -> Result<(), VcsError> {
        let flag = match mode {
            DeleteMode::Soft => "-d",
            DeleteMode::Force => "-D",
        };
        self.git(dir, "branch -d/-D", &["branch", flag, branch]).await.map(|_| ())
    }

    async fn list_branches(&self, dir: &Utf8Path, glob: &str) -> Result<Vec<String>, VcsError> {
        let lines = self
            .git_lines(dir, "branch --list", &["branch", "--list", glob, "--format=%(refname:short)"])
            .await?;
        Ok(lines)
    }

    async fn create_tag(&self, dir: &Utf8Path, name: &str, at_ref: Option<&str>) -> Result<(), VcsError> {
        match at_ref {
            Some(r) => self.git(dir, "tag", &["tag", name, r]).await.map(|_| ()),
            None => self.git(dir, "tag", &["tag", name]).await.map(|_| ()),
        }
    }

    async fn delete_tag(&self, dir: &Utf8Path, name: &str) -> Result<(), VcsError> {
        self.git(dir, "tag -d", &["tag", "-d", name]).await.map(|_| ())
    }

    async fn list_tags(&self, dir: &Utf8Path, glob: &str) -> Result<Vec<String>, VcsError> {
        self.git_lines(dir, "tag --list", &["tag", "--list", glob]).await
    }

    async fn worktree_add(&self, dir: &Utf8Path, worktree_dir: &Utf8Path, branch: &str) -> Result<(), VcsError> {
        self.git(dir, "worktree add", &["worktree", "add", worktree_dir.as_str(), branch])
            .await
            .map(|_| ())
    }

    async fn worktree_add_new_branch(
        &self,
        dir: &Utf8Path,
        worktree_dir: &Utf8Path,
        new_branch: &str,
        from_ref: &str,
    ) -> Result<(), VcsError> {
        self.git(
            dir,
            "worktree add -b",
            &["worktree", "add", "-b", new_branch, worktree_dir.as_str(), from_ref],
        )
        .await
        .map(|_| ())
    }

    async fn worktree_remove(&self, dir: &Utf8Path, worktree_dir: &Utf8Path) -> Result<(), VcsError> {
        self.git(
            dir,
            "worktree remove",
            &["worktree", "remove", worktree_dir.as_str(), "--force"],
        )
        .await
        .map(|_| ())
    }

    async fn worktree_prune(&self, dir: &Utf8Path) -> Result<(), VcsError> {
        self.git(dir, "worktree prune", &["worktree", "prune"]).await.map(|_| ())
    }

    async fn stage_all(&self, dir: &Utf8Path) -> Result<(), VcsError> {
        self.git(dir, "add -A", &["add", "-A"]).await.map(|_| ())
    }

    async fn stage_path(&self, dir: &Utf8Path, path: &str) -> Result<(), VcsError> {
        self.git(dir, "add <path>", &["add", path]).await.map(|_| ())
    }

    async fn reset_unstage(&self, dir: &Utf8Path) -> Result<(), VcsError> {
        self.git(dir, "reset HEAD", &["reset", "HEAD"]).await.map(|_| ())
    }

    async fn reset_soft(&self, dir: &Utf8Path, to_ref: &str) -> Result<(), VcsError> {
        self.git(dir, "reset --soft", &["reset", "--soft", to_ref]).await.map(|_| ())
    }

    async fn commit(&self, dir: &Utf8Path, message: &str, allow_empty: bool) -> Result<(), VcsError> {
        let mut args = vec!["commit", "--no-verify", "-m", message];
        if allow_empty {
            args.push("--allow-empty");
        }
        self.git(dir, "commit", &args).await.map(|_| ())
    }

    async fn rev_parse_head(&self, dir: &Utf8Path) -> Result<String, VcsError> {
        let out = self.git(dir, "rev-parse HEAD", &["rev-parse", "HEAD"]).await?;
        Ok(out.trim().to_string())
    }

    async fn current_branch(&self, dir: &Utf8Path) -> Result<String, VcsError> {
        let out = self
            .git(dir, "rev-parse --abbrev-ref HEAD", &["rev-parse", "--abbrev-ref", "HEAD"])
            .await?;
        Ok(out.trim().to_string())
    }

    async fn merge_no_edit(&self, dir: &Utf8Path, branch: &str) -> Result<(), VcsError> {
        self.git(dir, "merge --no-edit", &["merge", branch, "--no-edit"])
            .await
            .map(|_| ())
    }

    async fn is_clean(&self, dir: &Utf8Path) -> Result<bool, VcsError> {
        let spec = CommandSpec::new("git").cwd(dir).args(["diff", "--quiet", "HEAD"]);
        let output = self
            .runner
            .run(&spec, None, self.timeout)
            .await
            .map_err(|source| VcsError::Spawn {
                operation: "diff --quiet HEAD".to_string(),
                dir: dir.to_path_buf(),
                source,
            })?;
        // `git diff --quiet` exits 1 when there are differences, not an error.
        match output.exit_code {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(VcsError::NonZeroExit {
                operation: "diff --quiet HEAD".to_string(),
                dir: dir.to_path_buf(),
                code: output.exit_code,
                stderr: output.stderr_lossy(),
            }),
        }
    }

    async fn diff_shortstat(&self, dir: &Utf8Path, against_ref: &str) -> Result<DiffShortStat, VcsError> {
        let out = self
            .git(dir, "diff --shortstat", &["diff", "--shortstat", against_ref])
            .await?;
        Ok(parse_shortstat(&out))
    }

    async fn diff_name_status(&self, dir: &Utf8Path, against_ref: &str) -> Result<Vec<NameStatusEntry>, VcsError> {
        let out = self
            .git(dir, "diff --name-status", &["diff", "--name-status", against_ref])
            .await?;
        Ok(parse_name_status(&out))
    }

    async fn diff_numstat(&self, dir: &Utf8Path, against_ref: &str) -> Result<Vec<NumstatEntry>, VcsError> {
        let out = self.git(dir, "diff --numstat", &["diff", "--numstat", against_ref]).await?;
        Ok(parse_numstat(&out))
    }

    async fn show_file(&self, dir: &Utf8Path, at_ref: &str, path: &str) -> Result<String, VcsError> {
        self.git(dir, "show <ref>:<path>", &["show", &format!("{at_ref}:{path}")]).await
    }

    async fn ls_files(&self, dir: &Utf8Path) -> Result<Vec<String>, VcsError> {
        self.git_lines(dir, "ls-files", &["ls-files"]).await
    }

    async fn ls_tree(&self, dir: &Utf8Path, at_ref: &str) -> Result<Vec<String>, VcsError> {
        self.git_lines(dir, "ls-tree -r", &["ls-tree", "-r", "--name-only", at_ref]).await
    }

    async fn stash_push(&self, dir: &Utf8Path, message: &str) -> Result<(), VcsError> {
        self.git(dir, "stash push", &["stash", "push", "-m", message]).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cobbler_runner::NativeRunner;
    use tempfile::TempDir;

    async fn init_repo() -> (TempDir, camino::Utf8PathBuf) {
        let td = TempDir::new().unwrap();
        let dir = camino::Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        let vcs = GitVcs::new(NativeRunner, Duration::from_secs(10));
        vcs.git(&dir, "init", &["init", "-q", "-b", "main"]).await.unwrap();
        vcs.git(&dir, "config", &["config", "user.email", "test@example.com"])
            .await
            .unwrap();
        vcs.git(&dir, "config", &["config", "user.name", "Test"]).await.unwrap();
        std::fs::write(dir.join("README.md"), "hello\n").unwrap();
        vcs.stage_all(&dir).await.unwrap();
        vcs.commit(&dir, "initial", false).await.unwrap();
        (td, dir)
    }

    #[tokio::test]
    async fn checkout_new_branch_and_detect_existence() {
        let (_td, dir) = init_repo().await;
        let vcs = GitVcs::new(NativeRunner, Duration::from_secs(10));
        assert!(!vcs.branch_exists(&dir, "feature").await.unwrap());
        vcs.checkout_new_branch(&dir, "feature", "main").await.unwrap();
        assert!(vcs.branch_exists(&dir, "feature").await.unwrap());
        assert_eq!(vcs.current_branch(&dir).await.unwrap(), "feature");
    }

    #[tokio::test]
    async fn worktree_add_new_branch_creates_branch_and_checkout() {
        let (_td, dir) = init_repo().await;
        let vcs = GitVcs::new(NativeRunner, Duration::from_secs(10));
        let wt_parent = TempDir::new().unwrap();
        let wt_dir = camino::Utf8PathBuf::from_path_buf(wt_parent.path().join("task-1")).unwrap();

        vcs.worktree_add_new_branch(&dir, &wt_dir, "task/gen-1", "main").await.unwrap();

        assert!(vcs.branch_exists(&dir, "task/gen-1").await.unwrap());
        assert_eq!(vcs.current_branch(&wt_dir).await.unwrap(), "task/gen-1");

        vcs.worktree_remove(&dir, &wt_dir).await.unwrap();
    }

    #[tokio::test]
    async fn is_clean_reflects_working_tree_state() {
        let (_td, dir) = init_repo().await;
        let vcs = GitVcs::new(NativeRunner, Duration::from_secs(10));
        assert!(vcs.is_clean(&dir).await.unwrap());
        std::fs::write(dir.join("README.md"), "changed\n").unwrap();
        assert!(!vcs.is_clean(&dir).await.unwrap());
    }

    #[tokio::test]
    async fn tag_list_round_trips() {
        let (_td, dir) = init_repo().await;
        let vcs = GitVcs::new(NativeRunner, Duration::from_secs(10));
        vcs.create_tag(&dir, "gen-1-start", None).await.unwrap();
        let tags = vcs.list_tags(&dir, "gen-1-*").await.unwrap();
        assert_eq!(tags, vec!["gen-1-start".to_string()]);
    }

    #[tokio::test]
    async fn commit_and_diff_against_parent() {
        let (_td, dir) = init_repo().await;
        let vcs = GitVcs::new(NativeRunner, Duration::from_secs(10));
        let base = vcs.rev_parse_head(&dir).await.unwrap();
        std::fs::write(dir.join("new.txt"), "content\n").unwrap();
        vcs.stage_all(&dir).await.unwrap();
        vcs.commit(&dir, "add file", false).await.unwrap();

        let stat = vcs.diff_shortstat(&dir, &base).await.unwrap();
        assert_eq!(stat.files_changed, 1);
        assert_eq!(stat.insertions, 1);

        let entries = vcs.diff_name_status(&dir, &base).await.unwrap();
        assert_eq!(entries[0].status, "A");
        assert_eq!(entries[0].path, "new.txt");
    }
}

use camino::Utf8Path;
use cobbler_context::AssembleParams;
use cobbler_history::{DiffReport, ExecutionRecord, Outcome, Phase, ScratchHistory, TokenUsage};
use cobbler_issues::{Issue, LABEL_IN_PROGRESS, TaskDescription, parse_issue_front_matter};
use cobbler_llm::{LlmError, LlmGateway};
use cobbler_runner::ProcessRunner;
use cobbler_scheduler::Scheduler;
use cobbler_vcs::{DeleteMode, Vcs};

use crate::error::ExecutorError;
use crate::types::{ExecuteOutcome, GenerationContext};

/// Runs one task end to end in an isolated git worktree (spec.md sec 4.8):
/// creates the task branch and worktree, assembles and renders the execute
/// prompt, invokes the LLM, validates and commits the result, merges into
/// the generation branch, and tears everything down. Every failure path
/// recovers via `reset_task`, which is never fatal to the caller.
pub struct WorktreeExecutor<'a, R: ProcessRunner> {
    vcs: &'a dyn Vcs,
    issues: &'a dyn cobbler_issues::IssueStore,
    scheduler: &'a Scheduler<'a>,
    llm: &'a LlmGateway<R>,
    history: &'a ScratchHistory,
}

impl<'a, R: ProcessRunner> WorktreeExecutor<'a, R> {
    #[must_use]
    pub fn new(
        vcs: &'a dyn Vcs,
        issues: &'a dyn cobbler_issues::IssueStore,
        scheduler: &'a Scheduler<'a>,
        llm: &'a LlmGateway<R>,
        history: &'a ScratchHistory,
    ) -> Self {
        Self {
            vcs,
            issues,
            scheduler,
            llm,
            history,
        }
    }

    /// Execute one task. Always returns `Ok` unless a VCS/issue-store/
    /// context/history operation itself errors (and even then, most such
    /// failures are swallowed inside `reset_task` so they never abort the
    /// caller's cycle) — see spec.md sec 4.8 step 8.
    ///
    /// # Errors
    /// Propagates [`ExecutorError`] only for failures that happen before a
    /// worktree/branch exists to clean up, or for the final `close` call
    /// (a scheduler failure there is left to the caller's retry policy,
    /// per spec.md sec 4.7 "Failure semantics").
    pub async fn execute(&self, issue: &Issue, gen: &GenerationContext) -> Result<ExecuteOutcome, ExecutorError> {
        let branch = format!("task/{}-{}", gen.base, issue.number);
        let worktree_dir = cobbler_utils::paths::worktree_path(&gen.worktree_root, issue.number);

        let branch_exists = self.vcs.branch_exists(&gen.generation_dir, &branch).await?;
        let worktree_exists = worktree_dir.as_std_path().exists();
        if branch_exists || worktree_exists {
            tracing::warn!(issue = issue.number, "stale branch/worktree detected, resetting before retry");
            self.reset_task(&gen.generation_dir, &worktree_dir, &branch, issue.number).await;
        }

        self.vcs
            .worktree_add_new_branch(&gen.generation_dir, &worktree_dir, &branch, &gen.generation_branch)
            .await?;

        let (_front_matter, description_yaml) = parse_issue_front_matter(&issue.body);
        let task: TaskDescription = match serde_yaml::from_str(&description_yaml) {
            Ok(t) => t,
            Err(err) => {
                tracing::warn!(issue = issue.number, error = %err, "task description failed to parse, resetting");
                self.reset_task(&gen.generation_dir, &worktree_dir, &branch, issue.number).await;
                return Ok(ExecuteOutcome::Reset);
            }
        };
        if task.required_reading.is_empty() || task.files.is_empty() || task.acceptance_criteria.is_empty() {
            tracing::warn!(
                issue = issue.number,
                "task description missing required_reading/files/acceptance_criteria, resetting"
            );
            self.reset_task(&gen.generation_dir, &worktree_dir, &branch, issue.number).await;
            return Ok(ExecuteOutcome::Reset);
        }

        let ctx = cobbler_context::assemble(AssembleParams {
            root: gen.generation_dir.clone(),
            include_globs: None,
            exclude_globs: &[],
            release_scope: gen.release_scope.as_ref(),
            source_dirs: &gen.source_dirs,
            source_extensions: &gen.source_extensions,
            open_issue_summary: String::new(),
            operator_notes: None,
            max_context_bytes: gen.max_context_bytes,
            required_reading: Some(&task.required_reading),
        })?;
        let lines_before: u64 = ctx.source_files.iter().map(|f| f.numbered_content.lines().count() as u64).sum();

        let prompt = cobbler_prompt::build_execute_prompt(&ctx, &description_yaml);

        let timestamp = cobbler_utils::now_stamp();
        // Saved before invocation so a later timeout still leaves the
        // prompt on disk for inspection (spec.md sec 4.8 step 5, sec 9).
        self.history.save_prompt(&timestamp, Phase::Stitch, &prompt)?;

        let start = chrono::Utc::now();
        let invocation = self.llm.invoke(&worktree_dir, &prompt).await;
        let duration_secs = (chrono::Utc::now() - start).num_milliseconds() as f64 / 1000.0;

        let output = match invocation {
            Ok(output) => output,
            Err(LlmError::Timeout) => {
                tracing::warn!(issue = issue.number, "LLM invocation timed out, resetting");
                self.write_failure_stats(&timestamp, start, duration_secs, Outcome::Timeout)?;
                self.reset_task(&gen.generation_dir, &worktree_dir, &branch, issue.number).await;
                return Ok(ExecuteOutcome::Reset);
            }
            Err(err) => {
                tracing::warn!(issue = issue.number, error = %err, "LLM invocation failed, resetting");
                self.write_failure_stats(&timestamp, start, duration_secs, Outcome::ParseFailure)?;
                self.reset_task(&gen.generation_dir, &worktree_dir, &branch, issue.number).await;
                return Ok(ExecuteOutcome::Reset);
            }
        };

        self.history.save_stream_log(&timestamp, Phase::Stitch, &output.raw_stdout)?;

        self.vcs.stage_all(&worktree_dir).await?;
        if self.vcs.is_clean(&worktree_dir).await? {
            tracing::warn!(issue = issue.number, "LLM produced no artifact, resetting");
            self.write_failure_stats(&timestamp, start, duration_secs, Outcome::Reset)?;
            self.reset_task(&gen.generation_dir, &worktree_dir, &branch, issue.number).await;
            return Ok(ExecuteOutcome::Reset);
        }

        let numstat = self.vcs.diff_numstat(&worktree_dir, "HEAD").await?;
        self.vcs
            .commit(&worktree_dir, &format!("Task {}: {}", issue.number, issue.title), false)
            .await?;

        if let Err(err) = self.vcs.merge_no_edit(&gen.generation_dir, &branch).await {
            tracing::warn!(issue = issue.number, error = %err, "merge into generation branch failed, resetting");
            self.write_failure_stats(&timestamp, start, duration_secs, Outcome::ConflictFailure)?;
            self.reset_task(&gen.generation_dir, &worktree_dir, &branch, issue.number).await;
            return Ok(ExecuteOutcome::Reset);
        }

        if let Err(err) = self.vcs.worktree_remove(&gen.generation_dir, &worktree_dir).await {
            tracing::warn!(issue = issue.number, error = %err, "failed to remove worktree after merge, ignoring");
        }
        if let Err(err) = self.vcs.delete_branch(&gen.generation_dir, &branch, DeleteMode::Force).await {
            tracing::warn!(issue = issue.number, error = %err, "failed to delete task branch after merge, ignoring");
        }
        self.scheduler.close(issue.number).await?;

        let insertions: u32 = numstat.iter().filter_map(|e| e.insertions).sum();
        let deletions: u32 = numstat.iter().filter_map(|e| e.deletions).sum();
        let lines_after = (i64::try_from(lines_before).unwrap_or(i64::MAX) + i64::from(insertions) - i64::from(deletions)).max(0);

        let record = ExecutionRecord {
            start_time: start,
            duration_secs,
            usage: TokenUsage {
                input_tokens: output.usage.input_tokens,
                output_tokens: output.usage.output_tokens,
                cache_creation_tokens: output.usage.cache_creation_tokens,
                cache_read_tokens: output.usage.cache_read_tokens,
                cost_usd: output.usage.cost_usd,
            },
            lines_before,
            lines_after: lines_after as u64,
            outcome: Outcome::Success,
        };
        self.history.write_stats(&timestamp, Phase::Stitch, &record)?;

        let report = DiffReport {
            files_changed: u32::try_from(numstat.len()).unwrap_or(u32::MAX),
            insertions,
            deletions,
            paths: numstat.into_iter().map(|e| e.path).collect(),
        };
        self.history.write_report(&timestamp, Phase::Stitch, &report)?;

        Ok(ExecuteOutcome::Success)
    }

    /// Remove the worktree (force; errors ignored if already gone), delete
    /// the task branch (force), and remove `in-progress` from the issue so
    /// the next promote returns it to `ready` or blocked (spec.md sec 4.8
    /// "resetTask"). Never fatal to the caller.
    async fn reset_task(&self, generation_dir: &Utf8Path, worktree_dir: &Utf8Path, branch: &str, issue_number: u64) {
        if let Err(err) = self.vcs.worktree_remove(generation_dir, worktree_dir).await {
            tracing::warn!(issue = issue_number, error = %err, "reset_task: worktree removal failed, ignoring");
        }
        if let Err(err) = self.vcs.delete_branch(generation_dir, branch, DeleteMode::Force).await {
            tracing::warn!(issue = issue_number, error = %err, "reset_task: branch deletion failed, ignoring");
        }
        if let Err(err) = self.issues.remove_label(issue_number, LABEL_IN_PROGRESS).await {
            tracing::warn!(issue = issue_number, error = %err, "reset_task: label removal failed, ignoring");
        }
    }

    fn write_failure_stats(
        &self,
        timestamp: &str,
        start: chrono::DateTime<chrono::Utc>,
        duration_secs: f64,
        outcome: Outcome,
    ) -> Result<(), ExecutorError> {
        let record = ExecutionRecord {
            start_time: start,
            duration_secs,
            usage: TokenUsage::default(),
            lines_before: 0,
            lines_after: 0,
            outcome,
        };
        self.history.write_stats(timestamp, Phase::Stitch, &record)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use camino::Utf8PathBuf;
    use cobbler_issues::{IssueError, IssueFrontMatter, IssueState, IssueStore, format_issue_body};
    use cobbler_runner::{CommandSpec, NativeRunner, ProcessOutput, RunnerError};
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;

    struct FakeStore {
        issues: Mutex<Vec<Issue>>,
    }

    #[async_trait]
    impl IssueStore for FakeStore {
        async fn ensure_labels(&self, _labels: &[(&str, &str, &str)]) -> Result<(), IssueError> {
            Ok(())
        }
        async fn create_issue(&self, _title: &str, _body: &str, _labels: &[String]) -> Result<Issue, IssueError> {
            unimplemented!()
        }
        async fn list_open_issues_with_label(&self, label: &str) -> Result<Vec<Issue>, IssueError> {
            Ok(self
                .issues
                .lock()
                .unwrap()
                .iter()
                .filter(|i| i.state == IssueState::Open && i.labels.iter().any(|l| l == label))
                .cloned()
                .collect())
        }
        async fn view_issue(&self, number: u64) -> Result<Issue, IssueError> {
            self.issues
                .lock()
                .unwrap()
                .iter()
                .find(|i| i.number == number)
                .cloned()
                .ok_or(IssueError::NoRepoIdentity)
        }
        async fn labels_on(&self, number: u64) -> Result<Vec<String>, IssueError> {
            Ok(self.view_issue(number).await?.labels)
        }
        async fn add_label(&self, number: u64, label: &str) -> Result<(), IssueError> {
            let mut issues = self.issues.lock().unwrap();
            if let Some(issue) = issues.iter_mut().find(|i| i.number == number) {
                issue.labels.push(label.to_string());
            }
            Ok(())
        }
        async fn remove_label(&self, number: u64, label: &str) -> Result<(), IssueError> {
            let mut issues = self.issues.lock().unwrap();
            if let Some(issue) = issues.iter_mut().find(|i| i.number == number) {
                issue.labels.retain(|l| l != label);
            }
            Ok(())
        }
        async fn close_issue(&self, number: u64) -> Result<(), IssueError> {
            let mut issues = self.issues.lock().unwrap();
            if let Some(issue) = issues.iter_mut().find(|i| i.number == number) {
                issue.state = IssueState::Closed;
            }
            Ok(())
        }
    }

    struct StubLlmRunner {
        stdout: String,
    }

    #[async_trait]
    impl ProcessRunner for StubLlmRunner {
        async fn run(&self, _spec: &CommandSpec, _stdin: Option<&str>, _timeout: Duration) -> Result<ProcessOutput, RunnerError> {
            Ok(ProcessOutput::new(self.stdout.as_bytes().to_vec(), Vec::new(), Some(0), false))
        }
    }

    async fn init_repo() -> (tempfile::TempDir, Utf8PathBuf) {
        let td = tempfile::TempDir::new().unwrap();
        let dir = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        let vcs = cobbler_vcs::GitVcs::new(NativeRunner, Duration::from_secs(10));
        let run = |args: &[&str]| {
            let spec = CommandSpec::new("git").cwd(&dir).args(args.iter().copied());
            spec
        };
        let runner = NativeRunner;
        for args in [
            &["init", "-q", "-b", "main"][..],
            &["config", "user.email", "t@example.com"],
            &["config", "user.name", "T"],
        ] {
            runner.run(&run(args), None, Duration::from_secs(10)).await.unwrap();
        }
        std::fs::create_dir_all(dir.join("src")).unwrap();
        std::fs::write(dir.join("src/main.rs"), "fn main() {}\n").unwrap();
        vcs.stage_all(&dir).await.unwrap();
        vcs.commit(&dir, "initial", false).await.unwrap();
        (td, dir)
    }

    fn task_issue(number: u64) -> Issue {
        let fm = IssueFrontMatter::new("gen-1", 1, -1);
        let body = format_issue_body(
            &fm,
            "deliverable_type: code\nrequired_reading:\n  - src/main.rs\nfiles:\n  - path: src/main.rs\n    action: modify\nrequirements: []\nacceptance_criteria:\n  - id: AC-1\n    text: compiles\n",
        );
        Issue {
            number,
            title: "add a greeting".to_string(),
            body,
            labels: vec!["cobbler-gen-gen-1".to_string(), cobbler_issues::LABEL_IN_PROGRESS.to_string()],
            state: IssueState::Open,
        }
    }

    #[tokio::test]
    async fn llm_invocation_with_no_resulting_diff_resets_the_task() {
        // The stub LLM only returns a yaml block on stdout; it never
        // actually touches the worktree's files. That is indistinguishable
        // from a real no-op response, so the executor must reset rather
        // than commit an empty change (spec.md sec 4.8 step 6).
        let (_td, repo_dir) = init_repo().await;
        let vcs = cobbler_vcs::GitVcs::new(NativeRunner, Duration::from_secs(10));
        let store = FakeStore {
            issues: Mutex::new(vec![task_issue(1)]),
        };
        let scheduler = Scheduler::new(&store, "cobbler-gen-gen-1");
        let stdout = "{\"message\":{\"content\":[{\"type\":\"text\",\"text\":\"```yaml\\nok: true\\n```\"}]}}\n\
             {\"type\":\"result\",\"usage\":{\"input_tokens\":1,\"output_tokens\":1}}\n";
        let llm = LlmGateway::new(
            StubLlmRunner { stdout: stdout.to_string() },
            CommandSpec::new("claude"),
            Duration::from_secs(5),
        );
        let td_scratch = tempfile::TempDir::new().unwrap();
        let history = ScratchHistory::new(Utf8PathBuf::from_path_buf(td_scratch.path().to_path_buf()).unwrap());

        let executor = WorktreeExecutor::new(&vcs, &store, &scheduler, &llm, &history);

        let issue = store.issues.lock().unwrap()[0].clone();
        let gen = GenerationContext {
            generation_dir: repo_dir.clone(),
            generation_branch: "main".to_string(),
            base: "gen-1".to_string(),
            worktree_root: repo_dir.join("worktrees"),
            release_scope: None,
            source_dirs: vec!["src".to_string()],
            source_extensions: HashSet::from(["rs".to_string()]),
            max_context_bytes: 1_000_000,
        };

        let outcome = executor.execute(&issue, &gen).await.unwrap();
        assert_eq!(outcome, crate::types::ExecuteOutcome::Reset);
        assert!(!vcs.branch_exists(&repo_dir, "task/gen-1-1").await.unwrap());
    }

    #[tokio::test]
    async fn reset_task_is_idempotent_when_nothing_exists() {
        let (_td, repo_dir) = init_repo().await;
        let vcs = cobbler_vcs::GitVcs::new(NativeRunner, Duration::from_secs(10));
        let store = FakeStore {
            issues: Mutex::new(vec![task_issue(1)]),
        };
        let scheduler = Scheduler::new(&store, "cobbler-gen-gen-1");
        let llm = LlmGateway::new(
            StubLlmRunner { stdout: String::new() },
            CommandSpec::new("claude"),
            Duration::from_secs(5),
        );
        let td_scratch = tempfile::TempDir::new().unwrap();
        let history = ScratchHistory::new(Utf8PathBuf::from_path_buf(td_scratch.path().to_path_buf()).unwrap());
        let executor = WorktreeExecutor::new(&vcs, &store, &scheduler, &llm, &history);

        let worktree_dir = repo_dir.join("worktrees").join("999");
        executor.reset_task(&repo_dir, &worktree_dir, "task/gen-1-999", 999).await;
        executor.reset_task(&repo_dir, &worktree_dir, "task/gen-1-999", 999).await;
    }

    #[tokio::test]
    async fn malformed_task_description_resets_without_creating_a_lingering_branch() {
        let (_td, repo_dir) = init_repo().await;
        let vcs = cobbler_vcs::GitVcs::new(NativeRunner, Duration::from_secs(10));
        let mut issue = task_issue(2);
        let fm = IssueFrontMatter::new("gen-1", 2, -1);
        issue.body = format_issue_body(&fm, "not: [valid, yaml, for, a, task: description");
        let store = FakeStore {
            issues: Mutex::new(vec![issue.clone()]),
        };
        let scheduler = Scheduler::new(&store, "cobbler-gen-gen-1");
        let llm = LlmGateway::new(
            StubLlmRunner { stdout: String::new() },
            CommandSpec::new("claude"),
            Duration::from_secs(5),
        );
        let td_scratch = tempfile::TempDir::new().unwrap();
        let history = ScratchHistory::new(Utf8PathBuf::from_path_buf(td_scratch.path().to_path_buf()).unwrap());
        let executor = WorktreeExecutor::new(&vcs, &store, &scheduler, &llm, &history);

        let gen = GenerationContext {
            generation_dir: repo_dir.clone(),
            generation_branch: "main".to_string(),
            base: "gen-1".to_string(),
            worktree_root: repo_dir.join("worktrees"),
            release_scope: None,
            source_dirs: vec!["src".to_string()],
            source_extensions: HashSet::from(["rs".to_string()]),
            max_context_bytes: 1_000_000,
        };

        let outcome = executor.execute(&issue, &gen).await.unwrap();
        assert_eq!(outcome, crate::types::ExecuteOutcome::Reset);
        assert!(!vcs.branch_exists(&repo_dir, "task/gen-1-2").await.unwrap());
    }
}

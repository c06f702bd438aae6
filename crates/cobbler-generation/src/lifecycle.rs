use std::collections::HashSet;

use camino::Utf8PathBuf;
use cobbler_context::{AssembleParams, ProjectContext, assemble};
use cobbler_executor::{ExecuteOutcome, GenerationContext, WorktreeExecutor};
use cobbler_history::{Outcome, Phase, ScratchHistory, TokenUsage};
use cobbler_issues::{IssueStore, LABEL_IN_PROGRESS, TaskDescription, format_issue_body, generation_label, parse_issue_front_matter};
use cobbler_llm::{LlmError, LlmGateway};
use cobbler_prompt::{ProposeLimits, build_propose_prompt};
use cobbler_runner::ProcessRunner;
use cobbler_scheduler::Scheduler;
use cobbler_vcs::{DeleteMode, Vcs};

use crate::error::GenerationError;
use crate::types::{GenerationHandle, GenerationParams, ProposedTask, RunSummary};
use crate::validate::validate_batch;

/// The generation lifecycle state machine (spec.md sec 4.9): start, run,
/// resume, stop, reset. Owns recovery of stale branches and orphaned
/// labels. Holds no state of its own across calls — every method takes or
/// returns the [`GenerationHandle`] it needs.
pub struct GenerationLifecycle<'a, R: ProcessRunner> {
    vcs: &'a dyn Vcs,
    issues: &'a dyn IssueStore,
    llm: &'a LlmGateway<R>,
    history: &'a ScratchHistory,
    params: &'a GenerationParams,
}

impl<'a, R: ProcessRunner> GenerationLifecycle<'a, R> {
    #[must_use]
    pub fn new(
        vcs: &'a dyn Vcs,
        issues: &'a dyn IssueStore,
        llm: &'a LlmGateway<R>,
        history: &'a ScratchHistory,
        params: &'a GenerationParams,
    ) -> Self {
        Self {
            vcs,
            issues,
            llm,
            history,
            params,
        }
    }

    /// Start a new generation off `base_branch` (spec.md sec 4.9.1).
    ///
    /// # Errors
    /// Returns [`GenerationError::DirtyWorkingTree`] if the repository has
    /// uncommitted changes, or propagates a VCS/history failure.
    pub async fn start(&self, base_branch: &str) -> Result<GenerationHandle, GenerationError> {
        if !self.vcs.is_clean(&self.params.repo_root).await? {
            return Err(GenerationError::DirtyWorkingTree);
        }

        let name = cobbler_utils::timestamp::generation_name(&self.params.prefix, &cobbler_utils::now_stamp());
        self.vcs
            .checkout_new_branch(&self.params.repo_root, &name, base_branch)
            .await?;
        self.vcs
            .create_tag(&self.params.repo_root, &format!("{name}-start"), None)
            .await?;
        self.history.write_base_branch(base_branch)?;

        let label = generation_label(&self.params.prefix, &name);
        self.issues
            .ensure_labels(&[
                ("ready", "0e8a16", "unblocked, eligible to be picked"),
                ("in-progress", "fbca04", "claimed by the current worktree executor"),
                (&label, "5319e7", "tasks belonging to this generation"),
            ])
            .await?;

        for seed in &self.params.seed_templates {
            let rendered = seed
                .content
                .replace("{{.Version}}", &self.params.version)
                .replace("{{.ModulePath}}", &self.params.module_path);
            cobbler_utils::write_file_atomic(&seed.dest_path, &rendered).map_err(|source| GenerationError::SeedTemplate {
                path: seed.dest_path.clone(),
                source,
            })?;
        }

        Ok(GenerationHandle {
            name: name.clone(),
            branch: name,
            base_branch: base_branch.to_string(),
        })
    }

    /// Run propose/execute cycles until the configured cycle limit is hit or
    /// the generation converges (spec.md sec 4.9.2).
    ///
    /// # Errors
    /// Aborts and returns [`GenerationError`] on an LLM invocation failure
    /// during propose, an exhausted validation retry budget in *enforce*
    /// mode, or any VCS/issue-store/context/history/executor failure.
    pub async fn run(&self, gen: &GenerationHandle) -> Result<RunSummary, GenerationError> {
        let label = generation_label(&self.params.prefix, &gen.name);
        let scheduler = Scheduler::new(self.issues, label.clone());
        let executor = WorktreeExecutor::new(self.vcs, self.issues, &scheduler, self.llm, self.history);

        let mut summary = RunSummary::default();
        let mut run_budget = self.params.max_stitch_issues;

        loop {
            if self.params.cycles > 0 && summary.cycles_completed >= self.params.cycles {
                break;
            }

            self.write_analysis_snapshot().await;

            let proposed = self.propose_loop(gen, &label).await?;
            summary.tasks_proposed += proposed;

            let (executed, reset, exhausted) = self
                .execute_loop(gen, &scheduler, &executor, &mut run_budget)
                .await?;
            summary.tasks_executed += executed;
            summary.tasks_reset += reset;
            summary.cycles_completed += 1;

            if proposed == 0 && exhausted {
                break;
            }
            if run_budget == 0 {
                break;
            }
        }

        Ok(summary)
    }

    /// Locate the single active generation branch by the configured prefix
    /// (or the operator's explicit override) and build its handle, without
    /// performing any of resume's stale-state recovery (spec.md sec 4.9.3
    /// step 1). Shared by [`Self::resume`] and the standalone
    /// `propose`/`execute` CLI commands, which act on whatever generation
    /// is already checked out.
    ///
    /// # Errors
    /// Returns [`GenerationError::NoActiveGeneration`] if no branch matches
    /// the configured prefix, [`GenerationError::AmbiguousActiveGeneration`]
    /// if more than one does and no explicit branch is configured, or
    /// propagates a VCS failure.
    pub async fn current_handle(&self) -> Result<GenerationHandle, GenerationError> {
        let branch = match &self.params.explicit_branch {
            Some(b) => b.clone(),
            None => {
                let glob = format!("{}-*", self.params.prefix);
                let mut candidates = self.vcs.list_branches(&self.params.repo_root, &glob).await?;
                match candidates.len() {
                    0 => {
                        return Err(GenerationError::NoActiveGeneration {
                            prefix: self.params.prefix.clone(),
                        });
                    }
                    1 => candidates.remove(0),
                    _ => return Err(GenerationError::AmbiguousActiveGeneration(candidates)),
                }
            }
        };

        self.vcs.checkout(&self.params.repo_root, &branch).await?;
        let base_branch = self.history.read_base_branch().unwrap_or_else(|| branch.clone());

        Ok(GenerationHandle {
            name: branch.clone(),
            branch,
            base_branch,
        })
    }

    /// Detect and resume the single active generation, recovering any stale
    /// task branches and orphaned `in-progress` labels, then continue with
    /// [`Self::run`] (spec.md sec 4.9.3).
    ///
    /// # Errors
    /// Returns [`GenerationError::NoActiveGeneration`] if no branch matches
    /// the configured prefix, [`GenerationError::AmbiguousActiveGeneration`]
    /// if more than one does and no explicit branch is configured, or
    /// propagates a VCS/issue-store failure.
    pub async fn resume(&self) -> Result<RunSummary, GenerationError> {
        let gen = self.current_handle().await?;

        self.recover_stale_task_branches(&gen).await?;
        self.reset_orphaned_issues(&gen).await?;

        self.run(&gen).await
    }

    /// Run a single propose (measure) phase against the generation already
    /// checked out, without touching the execute loop (spec.md sec 6.5
    /// `propose`). Returns the count of tasks created.
    ///
    /// # Errors
    /// Propagates any failure from one propose attempt budget, same as the
    /// propose phase inside [`Self::run`].
    pub async fn propose(&self, gen: &GenerationHandle) -> Result<u32, GenerationError> {
        let label = generation_label(&self.params.prefix, &gen.name);
        self.propose_loop(gen, &label).await
    }

    /// Run a single execute (stitch) phase against the generation already
    /// checked out, without re-entering the propose loop (spec.md sec 6.5
    /// `execute`). Returns `(executed, reset)`.
    ///
    /// # Errors
    /// Propagates any failure the execute loop itself does not swallow via
    /// `resetTask`.
    pub async fn execute(&self, gen: &GenerationHandle) -> Result<(u32, u32), GenerationError> {
        let label = generation_label(&self.params.prefix, &gen.name);
        let scheduler = Scheduler::new(self.issues, label);
        let executor = WorktreeExecutor::new(self.vcs, self.issues, &scheduler, self.llm, self.history);
        let mut run_budget = self.params.max_stitch_issues;
        let (executed, reset, _exhausted) = self.execute_loop(gen, &scheduler, &executor, &mut run_budget).await?;
        Ok((executed, reset))
    }

    /// Tag `-finished`, merge the generation branch into the base (`--no-
    /// edit`, conflicts fatal), tag `-merged`, close remaining issues, and
    /// delete the generation branch (spec.md sec 4.9.4).
    ///
    /// # Errors
    /// Propagates a merge conflict or any other VCS/issue-store failure
    /// without attempting recovery — the operator must resolve it.
    pub async fn stop(&self, gen: &GenerationHandle) -> Result<(), GenerationError> {
        self.vcs
            .create_tag(&self.params.repo_root, &format!("{}-finished", gen.name), None)
            .await?;
        self.vcs.checkout(&self.params.repo_root, &gen.base_branch).await?;
        self.vcs.merge_no_edit(&self.params.repo_root, &gen.branch).await?;
        self.vcs
            .create_tag(&self.params.repo_root, &format!("{}-merged", gen.name), None)
            .await?;

        let label = generation_label(&self.params.prefix, &gen.name);
        for issue in self.issues.list_open_issues_with_label(&label).await? {
            self.issues.close_issue(issue.number).await?;
        }

        self.vcs
            .delete_branch(&self.params.repo_root, &gen.branch, DeleteMode::Soft)
            .await?;
        Ok(())
    }

    /// Abandon the current generation: close all its open issues, tag
    /// `-abandoned`, force-delete the branch, checkout the base, and remove
    /// the scratch directory (spec.md sec 4.9.5).
    ///
    /// # Errors
    /// Propagates an issue-store or VCS failure; the scratch directory
    /// removal itself is best-effort.
    pub async fn reset(&self, gen: &GenerationHandle) -> Result<(), GenerationError> {
        let label = generation_label(&self.params.prefix, &gen.name);
        for issue in self.issues.list_open_issues_with_label(&label).await? {
            self.issues.close_issue(issue.number).await?;
        }

        self.vcs
            .create_tag(&self.params.repo_root, &format!("{}-abandoned", gen.name), None)
            .await?;
        self.vcs
            .delete_branch(&self.params.repo_root, &gen.branch, DeleteMode::Force)
            .await?;
        self.vcs.checkout(&self.params.repo_root, &gen.base_branch).await?;

        if let Err(err) = std::fs::remove_dir_all(self.history.root().as_std_path()) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %err, "failed to remove scratch directory during reset, ignoring");
            }
        }

        Ok(())
    }

    async fn write_analysis_snapshot(&self) {
        let ctx = match self.assemble_context(String::new()).await {
            Ok(ctx) => ctx,
            Err(err) => {
                tracing::warn!(error = %err, "pre-cycle context assembly for analysis failed, skipping snapshot");
                return;
            }
        };
        let snapshot = cobbler_analyzer::analyze(&ctx, &self.params.repo_root, &self.params.configured_releases);
        if let Err(err) = self.history.write_analysis_snapshot(&snapshot) {
            tracing::warn!(error = %err, "failed to persist analysis snapshot, ignoring");
        }
    }

    async fn assemble_context(&self, open_issue_summary: String) -> Result<ProjectContext, GenerationError> {
        Ok(assemble(AssembleParams {
            root: self.params.repo_root.clone(),
            include_globs: None,
            exclude_globs: &[],
            release_scope: self.params.release_scope.as_ref(),
            source_dirs: &self.params.source_dirs,
            source_extensions: &self.params.source_extensions,
            open_issue_summary,
            operator_notes: None,
            max_context_bytes: self.params.max_context_bytes,
            required_reading: None,
        })?)
    }

    async fn open_issue_summary(&self, label: &str) -> Result<(String, Vec<String>), GenerationError> {
        let issues = self.issues.list_open_issues_with_label(label).await?;
        let summary = issues
            .iter()
            .map(|i| format!("- #{} {}", i.number, i.title))
            .collect::<Vec<_>>()
            .join("\n");
        let titles = issues.into_iter().map(|i| i.title).collect();
        Ok((summary, titles))
    }

    /// One cycle's propose phase: up to `max_measure_issues` attempts, each
    /// retried up to `max_measure_retries` times on extraction/validation
    /// failure (spec.md sec 4.9.2 "Propose loop").
    async fn propose_loop(&self, gen: &GenerationHandle, label: &str) -> Result<u32, GenerationError> {
        let (mut open_issue_summary, mut known_titles) = self.open_issue_summary(label).await?;
        let mut created = 0u32;

        for attempt in 1..=self.params.max_measure_issues {
            if attempt > 1 {
                let (summary, titles) = self.open_issue_summary(label).await?;
                open_issue_summary = summary;
                known_titles = titles;
            }

            let Some(tasks) = self.propose_one(&open_issue_summary, &known_titles).await? else {
                continue;
            };

            for task in &tasks {
                let description = TaskDescription {
                    deliverable_type: task.deliverable_type.clone(),
                    required_reading: task.required_reading.clone(),
                    files: task.files.clone(),
                    requirements: task.requirements.clone(),
                    acceptance_criteria: task.acceptance_criteria.clone(),
                    design_decisions: task.design_decisions.clone(),
                };
                let description_yaml = serde_yaml::to_string(&description).map_err(|source| GenerationError::SerializeTask {
                    title: task.title.clone(),
                    source,
                })?;
                let front_matter = cobbler_issues::IssueFrontMatter::new(gen.name.clone(), task.index, task.depends_on);
                let body = format_issue_body(&front_matter, &description_yaml);
                self.issues.create_issue(&task.title, &body, &[label.to_string()]).await?;
                self.history.append_proposal_log(std::slice::from_ref(task))?;
                known_titles.push(task.title.clone());
                created += 1;
            }
        }

        let scheduler = Scheduler::new(self.issues, label.to_string());
        scheduler.promote().await?;

        Ok(created)
    }

    /// One propose attempt slot, including its internal retry budget.
    /// Returns `None` when every retry was exhausted without a usable
    /// batch (extraction kept failing, or validation failed in *advisory*
    /// mode with zero tasks left after discarding the last attempt never
    /// applies here — advisory mode always accepts the last attempt).
    async fn propose_one(
        &self,
        open_issue_summary: &str,
        known_titles: &[String],
    ) -> Result<Option<Vec<ProposedTask>>, GenerationError> {
        let limits = ProposeLimits {
            limit: 1,
            lines_min: self.params.estimated_lines_min,
            lines_max: self.params.estimated_lines_max,
            max_requirements: self.params.max_requirements_per_task,
        };

        let mut last_attempt: Option<Vec<ProposedTask>> = None;

        for retry in 0..=self.params.max_measure_retries {
            let retries_remain = retry < self.params.max_measure_retries;

            let ctx = self.assemble_context(open_issue_summary.to_string()).await?;
            let prompt = build_propose_prompt(&ctx, limits);
            let timestamp = cobbler_utils::now_stamp();
            self.history.save_prompt(&timestamp, Phase::Measure, &prompt)?;

            let start = chrono::Utc::now();
            let invocation = self.llm.invoke(&self.params.repo_root, &prompt).await;
            let duration_secs = (chrono::Utc::now() - start).num_milliseconds() as f64 / 1000.0;

            let output = match invocation {
                Ok(output) => output,
                Err(LlmError::Timeout) => {
                    self.write_measure_stats(&timestamp, start, duration_secs, TokenUsage::default(), Outcome::Timeout)?;
                    return Err(GenerationError::Llm(LlmError::Timeout));
                }
                Err(LlmError::NoYamlBlock) => {
                    self.write_measure_stats(&timestamp, start, duration_secs, TokenUsage::default(), Outcome::ParseFailure)?;
                    if retries_remain {
                        continue;
                    }
                    return Ok(None);
                }
                Err(err) => {
                    self.write_measure_stats(&timestamp, start, duration_secs, TokenUsage::default(), Outcome::ParseFailure)?;
                    return Err(GenerationError::Llm(err));
                }
            };

            self.history.save_stream_log(&timestamp, Phase::Measure, &output.raw_stdout)?;
            self.history.write_measure_raw(&timestamp, &output.yaml)?;

            let usage = TokenUsage {
                input_tokens: output.usage.input_tokens,
                output_tokens: output.usage.output_tokens,
                cache_creation_tokens: output.usage.cache_creation_tokens,
                cache_read_tokens: output.usage.cache_read_tokens,
                cost_usd: output.usage.cost_usd,
            };

            let tasks: Vec<ProposedTask> = match serde_yaml::from_str(&output.yaml) {
                Ok(tasks) => tasks,
                Err(_) => {
                    self.write_measure_stats(&timestamp, start, duration_secs, usage, Outcome::ParseFailure)?;
                    if retries_remain {
                        continue;
                    }
                    return Ok(None);
                }
            };

            let violations = validate_batch(&tasks, known_titles, self.params.max_requirements_per_task);
            if violations.is_empty() {
                self.write_measure_stats(&timestamp, start, duration_secs, usage, Outcome::Success)?;
                self.history.delete_measure_raw(&timestamp);
                return Ok(Some(tasks));
            }

            self.write_measure_stats(&timestamp, start, duration_secs, usage, Outcome::ValidationFailure)?;
            last_attempt = Some(tasks);

            if retries_remain {
                continue;
            }
            if self.params.enforce_measure_validation {
                return Err(GenerationError::Validation(violations));
            }
            tracing::warn!(violations = ?violations, "accepting last propose attempt despite validation failures (advisory mode)");
            return Ok(last_attempt);
        }

        Ok(last_attempt)
    }

    fn write_measure_stats(
        &self,
        timestamp: &str,
        start: chrono::DateTime<chrono::Utc>,
        duration_secs: f64,
        usage: TokenUsage,
        outcome: Outcome,
    ) -> Result<(), GenerationError> {
        let record = cobbler_history::ExecutionRecord {
            start_time: start,
            duration_secs,
            usage,
            lines_before: 0,
            lines_after: 0,
            outcome,
        };
        self.history.write_stats(timestamp, Phase::Measure, &record)?;
        Ok(())
    }

    /// One cycle's execute phase (spec.md sec 4.9.2 "Execute loop").
    /// Returns `(executed, reset, exhausted)` where `exhausted` means the
    /// loop stopped because no ready task remained, as opposed to a cap.
    async fn execute_loop(
        &self,
        gen: &GenerationHandle,
        scheduler: &Scheduler<'_>,
        executor: &WorktreeExecutor<'_, R>,
        run_budget: &mut u32,
    ) -> Result<(u32, u32, bool), GenerationError> {
        let gen_ctx = GenerationContext {
            generation_dir: self.params.repo_root.clone(),
            generation_branch: gen.branch.clone(),
            base: gen.name.clone(),
            worktree_root: self.params.worktree_root.clone(),
            release_scope: self.params.release_scope.clone(),
            source_dirs: self.params.source_dirs.clone(),
            source_extensions: self.params.source_extensions.clone(),
            max_context_bytes: self.params.max_context_bytes,
        };

        let mut failed = HashSet::new();
        let mut executed = 0u32;
        let mut reset = 0u32;

        loop {
            if executed + reset >= self.params.max_stitch_issues_per_cycle {
                return Ok((executed, reset, false));
            }
            if *run_budget == 0 {
                return Ok((executed, reset, false));
            }

            let Some(issue) = scheduler.pick().await? else {
                return Ok((executed, reset, true));
            };

            let (front_matter, _) = parse_issue_front_matter(&issue.body);
            if failed.contains(&front_matter.index) {
                // pick() already marked it in-progress; undo that so a future
                // cycle's promote sees it as ready again instead of stuck.
                if let Err(err) = self.issues.remove_label(issue.number, LABEL_IN_PROGRESS).await {
                    tracing::warn!(issue = issue.number, error = %err, "failed to release known-failed task back to ready, ignoring");
                }
                return Ok((executed, reset, false));
            }

            match executor.execute(&issue, &gen_ctx).await? {
                ExecuteOutcome::Success => {
                    executed += 1;
                    *run_budget = run_budget.saturating_sub(1);
                }
                ExecuteOutcome::Reset => {
                    reset += 1;
                    *run_budget = run_budget.saturating_sub(1);
                    failed.insert(front_matter.index);
                }
            }
        }
    }

    async fn recover_stale_task_branches(&self, gen: &GenerationHandle) -> Result<(), GenerationError> {
        let glob = format!("task/{}-*", gen.name);
        let stale = self.vcs.list_branches(&self.params.repo_root, &glob).await?;
        for branch in stale {
            let Some(number) = branch.rsplit('-').next().and_then(|s| s.parse::<u64>().ok()) else {
                continue;
            };
            if let Err(err) = self.vcs.delete_branch(&self.params.repo_root, &branch, DeleteMode::Force).await {
                tracing::warn!(branch = %branch, error = %err, "failed to delete stale task branch during resume, ignoring");
            }
            let worktree_dir: Utf8PathBuf = cobbler_utils::paths::worktree_path(&self.params.worktree_root, number);
            if worktree_dir.as_std_path().exists()
                && let Err(err) = self.vcs.worktree_remove(&self.params.repo_root, &worktree_dir).await
            {
                tracing::warn!(path = %worktree_dir, error = %err, "failed to remove stale worktree during resume, ignoring");
            }
        }
        Ok(())
    }

    async fn reset_orphaned_issues(&self, gen: &GenerationHandle) -> Result<(), GenerationError> {
        let label = generation_label(&self.params.prefix, &gen.name);
        let in_progress = self.issues.list_open_issues_with_label(&label).await?;
        for issue in in_progress {
            if !issue.labels.iter().any(|l| l == LABEL_IN_PROGRESS) {
                continue;
            }
            let expected_branch = format!("task/{}-{}", gen.name, issue.number);
            let exists = self.vcs.branch_exists(&self.params.repo_root, &expected_branch).await?;
            if !exists
                && let Err(err) = self.issues.remove_label(issue.number, LABEL_IN_PROGRESS).await
            {
                tracing::warn!(issue = issue.number, error = %err, "failed to clear orphaned in-progress label, ignoring");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cobbler_issues::{Issue, IssueError, IssueFrontMatter, IssueState};
    use cobbler_runner::{CommandSpec, NativeRunner, ProcessOutput, RunnerError};
    use std::sync::Mutex;
    use std::time::Duration;

    struct FakeStore {
        issues: Mutex<Vec<Issue>>,
    }

    impl FakeStore {
        fn new(issues: Vec<Issue>) -> Self {
            Self { issues: Mutex::new(issues) }
        }
    }

    #[async_trait]
    impl IssueStore for FakeStore {
        async fn ensure_labels(&self, _labels: &[(&str, &str, &str)]) -> Result<(), IssueError> {
            Ok(())
        }
        async fn create_issue(&self, title: &str, body: &str, labels: &[String]) -> Result<Issue, IssueError> {
            let mut issues = self.issues.lock().unwrap();
            let number = issues.iter().map(|i| i.number).max().unwrap_or(0) + 1;
            let issue = Issue {
                number,
                title: title.to_string(),
                body: body.to_string(),
                labels: labels.to_vec(),
                state: IssueState::Open,
            };
            issues.push(issue.clone());
            Ok(issue)
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
            if let Some(issue) = issues.iter_mut().find(|i| i.number == number)
                && !issue.labels.iter().any(|l| l == label)
            {
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

    struct StubLlmRunner;

    #[async_trait]
    impl ProcessRunner for StubLlmRunner {
        async fn run(&self, _spec: &CommandSpec, _stdin: Option<&str>, _timeout: Duration) -> Result<ProcessOutput, RunnerError> {
            Ok(ProcessOutput::new(Vec::new(), Vec::new(), Some(0), false))
        }
    }

    async fn init_repo() -> (tempfile::TempDir, Utf8PathBuf) {
        let td = tempfile::TempDir::new().unwrap();
        let dir = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        let runner = NativeRunner;
        let run = |args: &[&str]| CommandSpec::new("git").cwd(&dir).args(args.iter().copied());
        for args in [
            &["init", "-q", "-b", "main"][..],
            &["config", "user.email", "t@example.com"],
            &["config", "user.name", "T"],
        ] {
            runner.run(&run(args), None, Duration::from_secs(10)).await.unwrap();
        }
        std::fs::write(dir.join("README.md"), "hello\n").unwrap();
        let vcs = cobbler_vcs::GitVcs::new(NativeRunner, Duration::from_secs(10));
        vcs.stage_all(&dir).await.unwrap();
        vcs.commit(&dir, "initial", false).await.unwrap();
        (td, dir)
    }

    fn params(repo_root: Utf8PathBuf, scratch: Utf8PathBuf) -> (GenerationParams, ScratchHistory) {
        let params = GenerationParams {
            prefix: "cobbler-gen".to_string(),
            repo_root,
            worktree_root: scratch.join("worktrees"),
            cycles: 1,
            max_measure_issues: 1,
            max_measure_retries: 0,
            max_requirements_per_task: 8,
            enforce_measure_validation: true,
            estimated_lines_min: 10,
            estimated_lines_max: 400,
            max_context_bytes: 1_000_000,
            max_stitch_issues: 10,
            max_stitch_issues_per_cycle: 10,
            source_dirs: vec![],
            source_extensions: HashSet::new(),
            release_scope: None,
            configured_releases: vec![],
            explicit_branch: None,
            seed_templates: vec![],
            version: "0.1.0".to_string(),
            module_path: "example.com/m".to_string(),
        };
        (params, ScratchHistory::new(scratch))
    }

    #[tokio::test]
    async fn start_fails_when_the_working_tree_is_dirty() {
        let (_td, repo_dir) = init_repo().await;
        std::fs::write(repo_dir.join("README.md"), "dirty\n").unwrap();

        let vcs = cobbler_vcs::GitVcs::new(NativeRunner, Duration::from_secs(10));
        let store = FakeStore::new(vec![]);
        let llm = LlmGateway::new(StubLlmRunner, CommandSpec::new("claude"), Duration::from_secs(5));
        let td_scratch = tempfile::TempDir::new().unwrap();
        let (params, history) = params(repo_dir.clone(), Utf8PathBuf::from_path_buf(td_scratch.path().to_path_buf()).unwrap());

        let lifecycle = GenerationLifecycle::new(&vcs, &store, &llm, &history, &params);
        let err = lifecycle.start("main").await.unwrap_err();
        assert!(matches!(err, GenerationError::DirtyWorkingTree));
    }

    #[tokio::test]
    async fn start_creates_the_generation_branch_tag_and_base_marker() {
        let (_td, repo_dir) = init_repo().await;
        let vcs = cobbler_vcs::GitVcs::new(NativeRunner, Duration::from_secs(10));
        let store = FakeStore::new(vec![]);
        let llm = LlmGateway::new(StubLlmRunner, CommandSpec::new("claude"), Duration::from_secs(5));
        let td_scratch = tempfile::TempDir::new().unwrap();
        let (params, history) = params(repo_dir.clone(), Utf8PathBuf::from_path_buf(td_scratch.path().to_path_buf()).unwrap());

        let lifecycle = GenerationLifecycle::new(&vcs, &store, &llm, &history, &params);
        let gen = lifecycle.start("main").await.unwrap();

        assert_eq!(vcs.current_branch(&repo_dir).await.unwrap(), gen.branch);
        assert!(vcs.branch_exists(&repo_dir, &gen.branch).await.unwrap());
        let tags = vcs.list_tags(&repo_dir, &format!("{}-start", gen.name)).await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(history.read_base_branch(), Some("main".to_string()));
    }

    #[tokio::test]
    async fn resume_recovers_stale_task_branches_and_orphaned_in_progress_labels() {
        let (_td, repo_dir) = init_repo().await;
        let vcs = cobbler_vcs::GitVcs::new(NativeRunner, Duration::from_secs(10));
        let llm = LlmGateway::new(StubLlmRunner, CommandSpec::new("claude"), Duration::from_secs(5));
        let td_scratch = tempfile::TempDir::new().unwrap();
        let (params, history) = params(repo_dir.clone(), Utf8PathBuf::from_path_buf(td_scratch.path().to_path_buf()).unwrap());

        let store = FakeStore::new(vec![]);
        let lifecycle = GenerationLifecycle::new(&vcs, &store, &llm, &history, &params);
        let gen = lifecycle.start("main").await.unwrap();

        // A stale task branch left behind by an interrupted worktree executor run.
        vcs.checkout_new_branch(&repo_dir, &format!("task/{}-7", gen.name), &gen.branch)
            .await
            .unwrap();
        vcs.checkout(&repo_dir, &gen.branch).await.unwrap();

        let label = generation_label(&params.prefix, &gen.name);
        let fm = IssueFrontMatter::new(gen.name.clone(), 1, -1);
        let body = format_issue_body(&fm, "deliverable_type: code\n");
        store.issues.lock().unwrap().push(Issue {
            number: 7,
            title: "orphaned task".to_string(),
            body,
            labels: vec![label, cobbler_issues::LABEL_IN_PROGRESS.to_string()],
            state: IssueState::Open,
        });

        lifecycle.recover_stale_task_branches(&gen).await.unwrap();
        assert!(!vcs.branch_exists(&repo_dir, &format!("task/{}-7", gen.name)).await.unwrap());

        lifecycle.reset_orphaned_issues(&gen).await.unwrap();
        let issues = store.issues.lock().unwrap();
        let issue = issues.iter().find(|i| i.number == 7).unwrap();
        assert!(!issue.labels.iter().any(|l| l == cobbler_issues::LABEL_IN_PROGRESS));
    }

    #[tokio::test]
    async fn stop_merges_tags_and_closes_remaining_issues() {
        let (_td, repo_dir) = init_repo().await;
        let vcs = cobbler_vcs::GitVcs::new(NativeRunner, Duration::from_secs(10));
        let llm = LlmGateway::new(StubLlmRunner, CommandSpec::new("claude"), Duration::from_secs(5));
        let td_scratch = tempfile::TempDir::new().unwrap();
        let (params, history) = params(repo_dir.clone(), Utf8PathBuf::from_path_buf(td_scratch.path().to_path_buf()).unwrap());

        let store = FakeStore::new(vec![]);
        let lifecycle = GenerationLifecycle::new(&vcs, &store, &llm, &history, &params);
        let gen = lifecycle.start("main").await.unwrap();

        std::fs::write(repo_dir.join("feature.txt"), "work\n").unwrap();
        vcs.stage_all(&repo_dir).await.unwrap();
        vcs.commit(&repo_dir, "a task landed", false).await.unwrap();

        let label = generation_label(&params.prefix, &gen.name);
        let fm = IssueFrontMatter::new(gen.name.clone(), 1, -1);
        let body = format_issue_body(&fm, "deliverable_type: code\n");
        store.issues.lock().unwrap().push(Issue {
            number: 1,
            title: "still open".to_string(),
            body,
            labels: vec![label],
            state: IssueState::Open,
        });

        lifecycle.stop(&gen).await.unwrap();

        assert_eq!(vcs.current_branch(&repo_dir).await.unwrap(), "main");
        assert!(!vcs.branch_exists(&repo_dir, &gen.branch).await.unwrap());
        let merged_tags = vcs.list_tags(&repo_dir, &format!("{}-merged", gen.name)).await.unwrap();
        assert_eq!(merged_tags.len(), 1);
        assert_eq!(std::fs::read_to_string(repo_dir.join("feature.txt")).unwrap(), "work\n");
        let issues = store.issues.lock().unwrap();
        assert_eq!(issues[0].state, IssueState::Closed);
    }

    #[tokio::test]
    async fn reset_abandons_the_generation_and_closes_its_issues() {
        let (_td, repo_dir) = init_repo().await;
        let vcs = cobbler_vcs::GitVcs::new(NativeRunner, Duration::from_secs(10));
        let llm = LlmGateway::new(StubLlmRunner, CommandSpec::new("claude"), Duration::from_secs(5));
        let td_scratch = tempfile::TempDir::new().unwrap();
        let (params, history) = params(repo_dir.clone(), Utf8PathBuf::from_path_buf(td_scratch.path().to_path_buf()).unwrap());

        let store = FakeStore::new(vec![]);
        let lifecycle = GenerationLifecycle::new(&vcs, &store, &llm, &history, &params);
        let gen = lifecycle.start("main").await.unwrap();

        let label = generation_label(&params.prefix, &gen.name);
        let fm = IssueFrontMatter::new(gen.name.clone(), 1, -1);
        let body = format_issue_body(&fm, "deliverable_type: code\n");
        store.issues.lock().unwrap().push(Issue {
            number: 1,
            title: "abandoned task".to_string(),
            body,
            labels: vec![label],
            state: IssueState::Open,
        });

        lifecycle.reset(&gen).await.unwrap();

        assert_eq!(vcs.current_branch(&repo_dir).await.unwrap(), "main");
        assert!(!vcs.branch_exists(&repo_dir, &gen.branch).await.unwrap());
        let abandoned_tags = vcs.list_tags(&repo_dir, &format!("{}-abandoned", gen.name)).await.unwrap();
        assert_eq!(abandoned_tags.len(), 1);
        assert!(!history.root().as_std_path().exists());
        let issues = store.issues.lock().unwrap();
        assert_eq!(issues[0].state, IssueState::Closed);
    }
}

use std::collections::HashSet;

use cobbler_issues::{IssueStore, LABEL_IN_PROGRESS, LABEL_READY, parse_issue_front_matter};

use crate::error::SchedulerError;

/// The Task DAG scheduler (spec.md sec 4.7). All state lives in labels on
/// open issues carrying `generation_label`; this type performs no reads or
/// writes outside that label surface. Callers MUST serialize calls per
/// generation (single-reader-per-generation, spec.md sec 4.7) — this type
/// enforces no locking of its own.
pub struct Scheduler<'a> {
    store: &'a dyn IssueStore,
    generation_label: String,
}

impl<'a> Scheduler<'a> {
    #[must_use]
    pub fn new(store: &'a dyn IssueStore, generation_label: impl Into<String>) -> Self {
        Self {
            store,
            generation_label: generation_label.into(),
        }
    }

    /// Recompute `ready` across every open issue for the generation
    /// (spec.md sec 4.7 "Promote"). Idempotent.
    ///
    /// # Errors
    /// Returns [`SchedulerError`] if listing issues fails. Individual
    /// label-mutation failures are logged and do not abort the sweep — the
    /// next promote call corrects any transient drift (spec.md sec 4.7
    /// "Failure semantics").
    pub async fn promote(&self) -> Result<(), SchedulerError> {
        let issues = self.store.list_open_issues_with_label(&self.generation_label).await?;

        let open_indices: HashSet<i64> = issues
            .iter()
            .map(|issue| parse_issue_front_matter(&issue.body).0.index)
            .collect();

        for issue in &issues {
            let (fm, _) = parse_issue_front_matter(&issue.body);
            let blocked = fm.is_blocked_by(&open_indices);
            let has_ready = issue.labels.iter().any(|l| l == LABEL_READY);

            if !blocked && !has_ready {
                if let Err(err) = self.store.add_label(issue.number, LABEL_READY).await {
                    tracing::warn!(issue = issue.number, error = %err, "failed to add ready label, next promote will retry");
                }
            } else if blocked && has_ready {
                if let Err(err) = self.store.remove_label(issue.number, LABEL_READY).await {
                    tracing::warn!(issue = issue.number, error = %err, "failed to remove ready label, next promote will retry");
                }
            }
        }

        Ok(())
    }

    /// Promote, then claim the lowest-numbered `ready`, non-`in-progress`
    /// issue by adding `in-progress` to it (spec.md sec 4.7 "Pick"). Returns
    /// `None` if no issue is eligible.
    ///
    /// # Errors
    /// Returns [`SchedulerError`] if listing or label mutation fails.
    pub async fn pick(&self) -> Result<Option<cobbler_issues::Issue>, SchedulerError> {
        self.promote().await?;

        let mut ready = self.store.list_open_issues_with_label(&self.generation_label).await?;
        ready.retain(|issue| {
            issue.labels.iter().any(|l| l == LABEL_READY) && !issue.labels.iter().any(|l| l == LABEL_IN_PROGRESS)
        });
        ready.sort_by_key(|issue| issue.number);

        let Some(mut issue) = ready.into_iter().next() else {
            return Ok(None);
        };

        self.store.add_label(issue.number, LABEL_IN_PROGRESS).await?;
        issue.labels.push(LABEL_IN_PROGRESS.to_string());
        Ok(Some(issue))
    }

    /// Close the issue via the issue store, then promote (a closed
    /// dependency may unblock siblings) (spec.md sec 4.7 "Close").
    ///
    /// # Errors
    /// Returns [`SchedulerError`] if closing or the subsequent promote
    /// sweep fails.
    pub async fn close(&self, number: u64) -> Result<(), SchedulerError> {
        self.store.close_issue(number).await?;
        self.promote().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cobbler_issues::{Issue, IssueError, IssueState, IssueFrontMatter, format_issue_body};
    use std::sync::Mutex;

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

    fn issue(number: u64, index: i64, depends_on: i64, gen_label: &str, extra_labels: &[&str]) -> Issue {
        let fm = IssueFrontMatter::new("gen-1", index, depends_on);
        let body = format_issue_body(&fm, "description: task\n");
        let mut labels = vec![gen_label.to_string()];
        labels.extend(extra_labels.iter().map(|s| s.to_string()));
        Issue {
            number,
            title: format!("task {index}"),
            body,
            labels,
            state: IssueState::Open,
        }
    }

    #[tokio::test]
    async fn promote_marks_unblocked_issues_ready() {
        let gen = "cobbler-gen-g1";
        let store = FakeStore::new(vec![issue(1, 1, -1, gen, &[])]);
        let scheduler = Scheduler::new(&store, gen);
        scheduler.promote().await.unwrap();
        let issues = store.issues.lock().unwrap();
        assert!(issues[0].labels.iter().any(|l| l == LABEL_READY));
    }

    #[tokio::test]
    async fn promote_keeps_blocked_issues_unready() {
        let gen = "cobbler-gen-g1";
        let store = FakeStore::new(vec![issue(1, 1, -1, gen, &[]), issue(2, 2, 1, gen, &[])]);
        let scheduler = Scheduler::new(&store, gen);
        scheduler.promote().await.unwrap();
        let issues = store.issues.lock().unwrap();
        let dependent = issues.iter().find(|i| i.number == 2).unwrap();
        assert!(!dependent.labels.iter().any(|l| l == LABEL_READY));
    }

    #[tokio::test]
    async fn promote_removes_ready_once_a_dependency_reappears_as_blocking() {
        let gen = "cobbler-gen-g1";
        let store = FakeStore::new(vec![issue(2, 2, 1, gen, &[LABEL_READY]), issue(1, 1, -1, gen, &[])]);
        let scheduler = Scheduler::new(&store, gen);
        scheduler.promote().await.unwrap();
        let issues = store.issues.lock().unwrap();
        let dependent = issues.iter().find(|i| i.number == 2).unwrap();
        assert!(!dependent.labels.iter().any(|l| l == LABEL_READY));
    }

    #[tokio::test]
    async fn pick_returns_lowest_numbered_ready_issue_and_marks_in_progress() {
        let gen = "cobbler-gen-g1";
        let store = FakeStore::new(vec![issue(5, 1, -1, gen, &[]), issue(3, 2, -1, gen, &[])]);
        let scheduler = Scheduler::new(&store, gen);
        let picked = scheduler.pick().await.unwrap().unwrap();
        assert_eq!(picked.number, 3);
        let issues = store.issues.lock().unwrap();
        let stored = issues.iter().find(|i| i.number == 3).unwrap();
        assert!(stored.labels.iter().any(|l| l == LABEL_IN_PROGRESS));
    }

    #[tokio::test]
    async fn pick_skips_issues_already_in_progress() {
        let gen = "cobbler-gen-g1";
        let store = FakeStore::new(vec![
            issue(1, 1, -1, gen, &[LABEL_READY, LABEL_IN_PROGRESS]),
            issue(2, 2, -1, gen, &[]),
        ]);
        let scheduler = Scheduler::new(&store, gen);
        let picked = scheduler.pick().await.unwrap().unwrap();
        assert_eq!(picked.number, 2);
    }

    #[tokio::test]
    async fn pick_returns_none_when_nothing_is_ready() {
        let gen = "cobbler-gen-g1";
        let store = FakeStore::new(vec![issue(1, 1, -1, gen, &[LABEL_IN_PROGRESS])]);
        let scheduler = Scheduler::new(&store, gen);
        assert!(scheduler.pick().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn close_unblocks_dependents_via_the_post_close_promote() {
        let gen = "cobbler-gen-g1";
        let store = FakeStore::new(vec![issue(1, 1, -1, gen, &[LABEL_IN_PROGRESS]), issue(2, 2, 1, gen, &[])]);
        let scheduler = Scheduler::new(&store, gen);
        scheduler.close(1).await.unwrap();
        let issues = store.issues.lock().unwrap();
        let dependent = issues.iter().find(|i| i.number == 2).unwrap();
        // issue 1 is closed, so it is no longer in open_indices, so 2 unblocks.
        assert!(dependent.labels.iter().any(|l| l == LABEL_READY));
    }
}

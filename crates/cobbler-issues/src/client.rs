use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::IssueError;
use crate::types::{Issue, IssueState};

/// Operations consumed by C7/C8/C9 against the remote issue store
/// (spec.md sec 4.3, 6.2). List reads MUST use the direct list endpoint, not
/// a search endpoint, because the scheduler's correctness depends on reads
/// reflecting very recent label changes (spec.md sec 4.3, 9 "Strongly-
/// consistent reads only").
#[async_trait]
pub trait IssueStore: Send + Sync {
    async fn ensure_labels(&self, labels: &[(&str, &str, &str)]) -> Result<(), IssueError>;
    async fn create_issue(&self, title: &str, body: &str, labels: &[String]) -> Result<Issue, IssueError>;
    async fn list_open_issues_with_label(&self, label: &str) -> Result<Vec<Issue>, IssueError>;
    async fn view_issue(&self, number: u64) -> Result<Issue, IssueError>;
    async fn labels_on(&self, number: u64) -> Result<Vec<String>, IssueError>;
    async fn add_label(&self, number: u64, label: &str) -> Result<(), IssueError>;
    async fn remove_label(&self, number: u64, label: &str) -> Result<(), IssueError>;
    async fn close_issue(&self, number: u64) -> Result<(), IssueError>;
}

/// GitHub-flavored REST implementation. `repo` is `owner/repo`.
pub struct GithubIssueStore {
    client: Client,
    base_url: String,
    repo: String,
    token: String,
}

impl GithubIssueStore {
    /// `base_url` defaults to `https://api.github.com` in production; tests
    /// point it at a local mock server.
    pub fn new(repo: impl Into<String>, token: impl Into<String>, base_url: impl Into<String>) -> Result<Self, IssueError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("cobbler")
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            repo: repo.into(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/repos/{}{}", self.base_url, self.repo, path)
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct ApiIssue {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    labels: Vec<ApiLabel>,
    state: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct ApiLabel {
    name: String,
}

impl From<ApiIssue> for Issue {
    fn from(api: ApiIssue) -> Self {
        Issue {
            number: api.number,
            title: api.title,
            body: api.body.unwrap_or_default(),
            labels: api.labels.into_iter().map(|l| l.name).collect(),
            state: if api.state == "closed" {
                IssueState::Closed
            } else {
                IssueState::Open
            },
        }
    }
}

#[async_trait]
impl IssueStore for GithubIssueStore {
    async fn ensure_labels(&self, labels: &[(&str, &str, &str)]) -> Result<(), IssueError> {
        for (name, color, description) in labels {
            let resp = self
                .client
                .post(self.url("/labels"))
                .bearer_auth(&self.token)
                .json(&json!({ "name": name, "color": color, "description": description }))
                .send()
                .await?;
            // 422 "already_exists" is the idempotent no-op case.
            if !resp.status().is_success() && resp.status() != StatusCode::UNPROCESSABLE_ENTITY {
                let status = resp.status().as_u16();
                let body = resp.text().await.unwrap_or_default();
                return Err(IssueError::Api {
                    operation: "create label".to_string(),
                    status,
                    body,
                });
            }
        }
        Ok(())
    }

    async fn create_issue(&self, title: &str, body: &str, labels: &[String]) -> Result<Issue, IssueError> {
        let resp = self
            .client
            .post(self.url("/issues"))
            .bearer_auth(&self.token)
            .json(&json!({ "title": title, "body": body, "labels": labels }))
            .send()
            .await?;
        decode_issue(resp, "create issue").await
    }

    async fn list_open_issues_with_label(&self, label: &str) -> Result<Vec<Issue>, IssueError> {
        let resp = self
            .client
            .get(self.url("/issues"))
            .bearer_auth(&self.token)
            .query(&[("labels", label), ("state", "open"), ("per_page", "100")])
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(IssueError::Api {
                operation: "list open issues".to_string(),
                status,
                body,
            });
        }
        let raw = resp.text().await?;
        let issues: Vec<ApiIssue> = serde_json::from_str(&raw).map_err(|source| IssueError::Decode {
            operation: "list open issues".to_string(),
            source,
        })?;
        Ok(issues.into_iter().map(Issue::from).collect())
    }

    async fn view_issue(&self, number: u64) -> Result<Issue, IssueError> {
        let resp = self
            .client
            .get(self.url(&format!("/issues/{number}")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        decode_issue(resp, "view issue").await
    }

    async fn labels_on(&self, number: u64) -> Result<Vec<String>, IssueError> {
        Ok(self.view_issue(number).await?.labels)
    }

    async fn add_label(&self, number: u64, label: &str) -> Result<(), IssueError> {
        let resp = self
            .client
            .post(self.url(&format!("/issues/{number}/labels")))
            .bearer_auth(&self.token)
            .json(&json!({ "labels": [label] }))
            .send()
            .await?;
        ensure_success(resp, "add label").await
    }

    async fn remove_label(&self, number: u64, label: &str) -> Result<(), IssueError> {
        let resp = self
            .client
            .delete(self.url(&format!("/issues/{number}/labels/{label}")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        // 404 means the label was already absent; treat as success
        // (remove_label is used by idempotent recovery paths).
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        ensure_success(resp, "remove label").await
    }

    async fn close_issue(&self, number: u64) -> Result<(), IssueError> {
        let resp = self
            .client
            .patch(self.url(&format!("/issues/{number}")))
            .bearer_auth(&self.token)
            .json(&json!({ "state": "closed" }))
            .send()
            .await?;
        ensure_success(resp, "close issue").await
    }
}

async fn decode_issue(resp: reqwest::Response, operation: &str) -> Result<Issue, IssueError> {
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(IssueError::Api {
            operation: operation.to_string(),
            status,
            body,
        });
    }
    let raw = resp.text().await?;
    let api: ApiIssue = serde_json::from_str(&raw).map_err(|source| IssueError::Decode {
        operation: operation.to_string(),
        source,
    })?;
    Ok(api.into())
}

async fn ensure_success(resp: reqwest::Response, operation: &str) -> Result<(), IssueError> {
    if resp.status().is_success() {
        return Ok(());
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(IssueError::Api {
        operation: operation.to_string(),
        status,
        body,
    })
}

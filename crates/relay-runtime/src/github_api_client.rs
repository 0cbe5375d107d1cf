//! GitHub REST collaborator: workflow dispatch, run listing, and the status comment.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use relay_core::correlation::CandidateRun;
use relay_core::transport_helpers::{RequestSafety, RetryPolicy};
use relay_core::RelayError;
use serde::Deserialize;
use serde_json::json;

use crate::collaborators::{DocumentStore, RunLister, WorkflowDispatcher};
use crate::http_retry::{decode_json, send_with_retry};

pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
const RUNS_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn parse(raw: &str) -> Result<Self, RelayError> {
        let invalid = || {
            RelayError::InvalidConfig(format!("invalid repository '{raw}', expected owner/repo"))
        };
        let (owner, name) = raw.trim().split_once('/').ok_or_else(invalid)?;
        let owner = owner.trim();
        let name = name.trim();
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn as_slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone)]
pub struct GithubApiConfig {
    pub api_base: String,
    pub token: String,
    pub repo: RepoRef,
    pub request_timeout_ms: u64,
    pub retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct IssueCommentResponse {
    id: u64,
    #[serde(default)]
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WorkflowRunsPage {
    #[serde(default)]
    workflow_runs: Vec<WorkflowRunRecord>,
}

#[derive(Debug, Deserialize)]
struct WorkflowRunRecord {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    display_title: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
}

impl WorkflowRunRecord {
    fn into_candidate(self) -> Option<CandidateRun> {
        let name = self
            .display_title
            .filter(|title| !title.trim().is_empty())
            .or(self.name)?;
        let url = self.html_url?;
        Some(CandidateRun { name, url })
    }
}

#[derive(Clone)]
pub struct GithubApiClient {
    http: reqwest::Client,
    api_base: String,
    repo: RepoRef,
    retry: RetryPolicy,
}

impl GithubApiClient {
    pub fn new(config: GithubApiConfig) -> Result<Self, RelayError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("command-relay"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            reqwest::header::HeaderValue::from_static("2022-11-28"),
        );
        let auth_header = format!("Bearer {}", config.token.trim());
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&auth_header).map_err(|_| {
                RelayError::InvalidConfig("invalid github authorization header".to_string())
            })?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            repo: config.repo,
            retry: config.retry,
        })
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.repo.owner, self.repo.name, path
        )
    }
}

#[async_trait]
impl WorkflowDispatcher for GithubApiClient {
    async fn dispatch_workflow(
        &self,
        workflow_id: &str,
        git_ref: &str,
        inputs: &BTreeMap<String, String>,
    ) -> Result<(), RelayError> {
        let url = self.repo_url(&format!("actions/workflows/{workflow_id}/dispatches"));
        let payload = json!({ "ref": git_ref, "inputs": inputs });
        send_with_retry(
            "github api dispatch workflow",
            self.retry,
            RequestSafety::NonIdempotent,
            || self.http.post(&url).json(&payload),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl RunLister for GithubApiClient {
    async fn list_runs(&self, since: DateTime<Utc>) -> Result<Vec<CandidateRun>, RelayError> {
        let url = self.repo_url("actions/runs");
        let created = format!(">={}", since.to_rfc3339_opts(SecondsFormat::Secs, true));
        let per_page = RUNS_PAGE_SIZE.to_string();
        let mut page = 1_u32;
        let mut candidates = Vec::new();
        loop {
            let page_value = page.to_string();
            let response = send_with_retry(
                "github api list workflow runs",
                self.retry,
                RequestSafety::Idempotent,
                || {
                    self.http.get(&url).query(&[
                        ("created", created.as_str()),
                        ("event", "workflow_dispatch"),
                        ("exclude_pull_requests", "true"),
                        ("per_page", per_page.as_str()),
                        ("page", page_value.as_str()),
                    ])
                },
            )
            .await?;
            let chunk: WorkflowRunsPage = decode_json("github workflow runs", response).await?;
            let chunk_len = chunk.workflow_runs.len();
            candidates.extend(
                chunk
                    .workflow_runs
                    .into_iter()
                    .filter_map(WorkflowRunRecord::into_candidate),
            );
            if chunk_len < RUNS_PAGE_SIZE {
                break;
            }
            page = page.saturating_add(1);
        }
        tracing::debug!(
            candidates = candidates.len(),
            created = created.as_str(),
            "listed workflow runs"
        );
        Ok(candidates)
    }
}

#[async_trait]
impl DocumentStore for GithubApiClient {
    async fn create(&self, thread_id: u64, body: &str) -> Result<u64, RelayError> {
        let url = self.repo_url(&format!("issues/{thread_id}/comments"));
        let payload = json!({ "body": body });
        let response = send_with_retry(
            "github api create issue comment",
            self.retry,
            RequestSafety::NonIdempotent,
            || self.http.post(&url).json(&payload),
        )
        .await?;
        let created: IssueCommentResponse = decode_json("github issue comment", response).await?;
        Ok(created.id)
    }

    async fn read(&self, document_id: u64) -> Result<Option<String>, RelayError> {
        let url = self.repo_url(&format!("issues/comments/{document_id}"));
        let response = match send_with_retry(
            "github api get issue comment",
            self.retry,
            RequestSafety::Idempotent,
            || self.http.get(&url),
        )
        .await
        {
            Ok(response) => response,
            Err(RelayError::HttpStatus { status: 404, .. }) => return Ok(None),
            Err(error) => return Err(error),
        };
        let comment: IssueCommentResponse = decode_json("github issue comment", response).await?;
        Ok(comment.body)
    }

    async fn update(&self, document_id: u64, body: &str) -> Result<(), RelayError> {
        let url = self.repo_url(&format!("issues/comments/{document_id}"));
        let payload = json!({ "body": body });
        send_with_retry(
            "github api update issue comment",
            self.retry,
            RequestSafety::Idempotent,
            || self.http.patch(&url).json(&payload),
        )
        .await?;
        Ok(())
    }
}

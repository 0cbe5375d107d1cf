//! Azure DevOps Pipelines collaborator: starts a run and returns its web URL.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use relay_core::transport_helpers::{RequestSafety, RetryPolicy};
use relay_core::RelayError;
use serde::Deserialize;
use serde_json::json;

use crate::collaborators::PipelineStarter;
use crate::http_retry::{decode_json, send_with_retry};

const PIPELINES_API_VERSION: &str = "7.1";

#[derive(Debug, Clone)]
pub struct AzurePipelinesConfig {
    /// Organization URL, e.g. `https://dev.azure.com/my-org`.
    pub organization_url: String,
    pub token: String,
    pub request_timeout_ms: u64,
    pub retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct PipelineRunResponse {
    #[serde(default, rename = "_links")]
    links: Option<PipelineRunLinks>,
}

#[derive(Debug, Deserialize)]
struct PipelineRunLinks {
    #[serde(default)]
    web: Option<PipelineRunLink>,
}

#[derive(Debug, Deserialize)]
struct PipelineRunLink {
    href: String,
}

/// PATs are sent as basic auth with an empty user name.
fn basic_auth_header(token: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!(":{}", token.trim())))
}

#[derive(Clone)]
pub struct AzurePipelinesClient {
    http: reqwest::Client,
    organization_url: String,
    retry: RetryPolicy,
}

impl AzurePipelinesClient {
    pub fn new(config: AzurePipelinesConfig) -> Result<Self, RelayError> {
        let organization_url = config.organization_url.trim().trim_end_matches('/').to_string();
        if organization_url.is_empty() {
            return Err(RelayError::InvalidConfig(
                "azure devops organization url cannot be empty".to_string(),
            ));
        }

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("command-relay"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&basic_auth_header(&config.token)).map_err(
                |_| {
                    RelayError::InvalidConfig(
                        "invalid azure devops authorization header".to_string(),
                    )
                },
            )?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()?;
        Ok(Self {
            http,
            organization_url,
            retry: config.retry,
        })
    }
}

#[async_trait]
impl PipelineStarter for AzurePipelinesClient {
    async fn start_pipeline(
        &self,
        project: &str,
        pipeline_id: u64,
        parameters: &BTreeMap<String, String>,
    ) -> Result<String, RelayError> {
        let url = format!(
            "{}/{project}/_apis/pipelines/{pipeline_id}/runs",
            self.organization_url
        );
        let payload = json!({ "templateParameters": parameters });
        let response = send_with_retry(
            "azure devops start pipeline run",
            self.retry,
            RequestSafety::NonIdempotent,
            || {
                self.http
                    .post(&url)
                    .query(&[("api-version", PIPELINES_API_VERSION)])
                    .json(&payload)
            },
        )
        .await?;
        let run: PipelineRunResponse = decode_json("azure devops pipeline run", response).await?;
        run.links
            .and_then(|links| links.web)
            .map(|link| link.href)
            .filter(|href| !href.trim().is_empty())
            .ok_or_else(|| {
                RelayError::InvalidResponse(format!(
                    "pipeline {pipeline_id} in {project} started without a web link"
                ))
            })
    }
}

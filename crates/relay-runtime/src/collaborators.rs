//! External collaborators the engine talks to.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_core::correlation::CandidateRun;
use relay_core::RelayError;

#[async_trait]
/// Fire-and-forget launch of an external CI workflow.
pub trait WorkflowDispatcher: Send + Sync {
    async fn dispatch_workflow(
        &self,
        workflow_id: &str,
        git_ref: &str,
        inputs: &BTreeMap<String, String>,
    ) -> Result<(), RelayError>;
}

#[async_trait]
/// Synchronous pipeline start that hands back a usable result URL.
pub trait PipelineStarter: Send + Sync {
    async fn start_pipeline(
        &self,
        project: &str,
        pipeline_id: u64,
        parameters: &BTreeMap<String, String>,
    ) -> Result<String, RelayError>;
}

#[async_trait]
/// Lists externally created runs so the poller can correlate them.
pub trait RunLister: Send + Sync {
    /// Runs created at or after `since`.
    async fn list_runs(&self, since: DateTime<Utc>) -> Result<Vec<CandidateRun>, RelayError>;
}

#[async_trait]
/// Storage for the status document. Whole-body reads and writes only.
pub trait DocumentStore: Send + Sync {
    async fn create(&self, thread_id: u64, body: &str) -> Result<u64, RelayError>;

    /// `None` when the document no longer exists or has no body.
    async fn read(&self, document_id: u64) -> Result<Option<String>, RelayError>;

    async fn update(&self, document_id: u64, body: &str) -> Result<(), RelayError>;
}

//! In-memory collaborators shared by the runtime unit tests.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relay_core::correlation::CandidateRun;
use relay_core::run_state::{DistinctId, RunState};
use relay_core::RelayError;

use crate::collaborators::{DocumentStore, PipelineStarter, RunLister, WorkflowDispatcher};
use crate::launcher::{LaunchContext, Launcher, LauncherKind};

pub(crate) fn launch_context(seed: u64, ordinal: usize, document_id: u64) -> LaunchContext {
    LaunchContext {
        distinct_id: DistinctId::new(seed, ordinal),
        line: "do something".to_string(),
        arguments: BTreeMap::new(),
        issue_number: 1,
        status_document_id: document_id,
        requester_login: "alice".to_string(),
    }
}

pub(crate) fn candidate(name: &str, url: &str) -> CandidateRun {
    CandidateRun {
        name: name.to_string(),
        url: url.to_string(),
    }
}

#[derive(Debug, Clone)]
pub(crate) struct WorkflowDispatchCall {
    pub(crate) workflow_id: String,
    pub(crate) git_ref: String,
    pub(crate) inputs: BTreeMap<String, String>,
}

#[derive(Default)]
pub(crate) struct RecordingWorkflowDispatcher {
    calls: Mutex<Vec<WorkflowDispatchCall>>,
    failure: Option<String>,
}

impl RecordingWorkflowDispatcher {
    pub(crate) fn failing(message: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failure: Some(message.to_string()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<WorkflowDispatchCall> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl WorkflowDispatcher for RecordingWorkflowDispatcher {
    async fn dispatch_workflow(
        &self,
        workflow_id: &str,
        git_ref: &str,
        inputs: &BTreeMap<String, String>,
    ) -> Result<(), RelayError> {
        self.calls.lock().expect("calls lock").push(WorkflowDispatchCall {
            workflow_id: workflow_id.to_string(),
            git_ref: git_ref.to_string(),
            inputs: inputs.clone(),
        });
        match &self.failure {
            Some(message) => Err(RelayError::HttpStatus {
                operation: "github api dispatch workflow".to_string(),
                status: 404,
                body: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

pub(crate) struct StaticPipelineStarter {
    base_url: String,
    delay: Duration,
    calls: AtomicUsize,
}

impl StaticPipelineStarter {
    pub(crate) fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PipelineStarter for StaticPipelineStarter {
    async fn start_pipeline(
        &self,
        project: &str,
        pipeline_id: u64,
        _parameters: &BTreeMap<String, String>,
    ) -> Result<String, RelayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(format!("{}/{project}/{pipeline_id}", self.base_url))
    }
}

/// Launcher whose outcome is fixed up front.
pub(crate) struct ScriptedLauncher {
    kind: LauncherKind,
    outcome: Result<RunState, String>,
    delay: Duration,
}

impl ScriptedLauncher {
    pub(crate) fn failing(message: &str) -> Self {
        Self {
            kind: LauncherKind::Workflow,
            outcome: Err(message.to_string()),
            delay: Duration::ZERO,
        }
    }

    pub(crate) fn resolved_after(url: &str, delay: Duration) -> Self {
        Self {
            kind: LauncherKind::Pipeline,
            outcome: Ok(RunState::Resolved {
                url: url.to_string(),
            }),
            delay,
        }
    }
}

#[async_trait]
impl Launcher for ScriptedLauncher {
    fn kind(&self) -> LauncherKind {
        self.kind
    }

    async fn launch(&self, _context: &LaunchContext) -> Result<RunState, RelayError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome
            .clone()
            .map_err(RelayError::InvalidResponse)
    }
}

/// Run lister replaying a queue of responses; the last one repeats forever.
#[derive(Default)]
pub(crate) struct ScriptedRunLister {
    responses: Mutex<VecDeque<Result<Vec<CandidateRun>, String>>>,
    since: Mutex<Vec<DateTime<Utc>>>,
}

impl ScriptedRunLister {
    pub(crate) fn new(responses: Vec<Result<Vec<CandidateRun>, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            since: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.since.lock().expect("since lock").len()
    }

    pub(crate) fn since_values(&self) -> Vec<DateTime<Utc>> {
        self.since.lock().expect("since lock").clone()
    }
}

#[async_trait]
impl RunLister for ScriptedRunLister {
    async fn list_runs(&self, since: DateTime<Utc>) -> Result<Vec<CandidateRun>, RelayError> {
        self.since.lock().expect("since lock").push(since);
        let mut responses = self.responses.lock().expect("responses lock");
        let response = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };
        match response {
            Some(Ok(candidates)) => Ok(candidates),
            Some(Err(message)) => Err(RelayError::InvalidResponse(message)),
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Default)]
pub(crate) struct InMemoryDocumentStore {
    documents: Mutex<HashMap<u64, String>>,
    next_id: AtomicU64,
    creates: AtomicUsize,
    updates: Mutex<Vec<String>>,
}

impl InMemoryDocumentStore {
    pub(crate) fn body(&self, document_id: u64) -> Option<String> {
        self.documents
            .lock()
            .expect("documents lock")
            .get(&document_id)
            .cloned()
    }

    pub(crate) fn set_body(&self, document_id: u64, body: &str) {
        self.documents
            .lock()
            .expect("documents lock")
            .insert(document_id, body.to_string());
    }

    pub(crate) fn remove(&self, document_id: u64) {
        self.documents
            .lock()
            .expect("documents lock")
            .remove(&document_id);
    }

    pub(crate) fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub(crate) fn update_count(&self) -> usize {
        self.updates.lock().expect("updates lock").len()
    }

    /// Bodies passed to `update`, oldest first.
    pub(crate) fn updated_bodies(&self) -> Vec<String> {
        self.updates.lock().expect("updates lock").clone()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create(&self, _thread_id: u64, body: &str) -> Result<u64, RelayError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let document_id = 9_000 + self.next_id.fetch_add(1, Ordering::SeqCst);
        self.set_body(document_id, body);
        Ok(document_id)
    }

    async fn read(&self, document_id: u64) -> Result<Option<String>, RelayError> {
        Ok(self.body(document_id))
    }

    async fn update(&self, document_id: u64, body: &str) -> Result<(), RelayError> {
        self.updates
            .lock()
            .expect("updates lock")
            .push(body.to_string());
        self.set_body(document_id, body);
        Ok(())
    }
}

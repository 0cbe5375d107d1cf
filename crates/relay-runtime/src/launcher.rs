//! Launchers: the pluggable handlers bound to each command.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use relay_core::run_state::{DistinctId, RunState};
use relay_core::RelayError;

use crate::collaborators::{PipelineStarter, WorkflowDispatcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LauncherKind {
    /// Accepted for async execution; resolved later by polling.
    Workflow,
    /// Resolved synchronously with a result URL.
    Pipeline,
}

impl LauncherKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Workflow => "workflow",
            Self::Pipeline => "pipeline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Everything a launcher knows about the invocation it serves.
pub struct LaunchContext {
    pub distinct_id: DistinctId,
    pub line: String,
    pub arguments: BTreeMap<String, String>,
    pub issue_number: u64,
    pub status_document_id: u64,
    pub requester_login: String,
}

#[async_trait]
pub trait Launcher: Send + Sync {
    fn kind(&self) -> LauncherKind;

    async fn launch(&self, context: &LaunchContext) -> Result<RunState, RelayError>;
}

pub const DISTINCT_ID_INPUT: &str = "distinct_id";

pub struct WorkflowLauncher {
    dispatcher: Arc<dyn WorkflowDispatcher>,
    workflow_id: String,
    git_ref: String,
    inputs: BTreeMap<String, String>,
    status_comment_input: Option<String>,
}

impl WorkflowLauncher {
    pub fn new(
        dispatcher: Arc<dyn WorkflowDispatcher>,
        workflow_id: impl Into<String>,
        git_ref: impl Into<String>,
    ) -> Self {
        Self {
            dispatcher,
            workflow_id: workflow_id.into(),
            git_ref: git_ref.into(),
            inputs: BTreeMap::new(),
            status_comment_input: None,
        }
    }

    pub fn with_inputs(mut self, inputs: BTreeMap<String, String>) -> Self {
        self.inputs = inputs;
        self
    }

    /// Names the workflow input that receives the status document id.
    pub fn with_status_comment_input(mut self, input: impl Into<String>) -> Self {
        self.status_comment_input = Some(input.into());
        self
    }

    /// Static inputs, overridden by captured arguments, plus the correlation id.
    pub fn build_inputs(&self, context: &LaunchContext) -> BTreeMap<String, String> {
        let mut inputs = self.inputs.clone();
        inputs.extend(
            context
                .arguments
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        if let Some(input) = &self.status_comment_input {
            inputs.insert(input.clone(), context.status_document_id.to_string());
        }
        inputs.insert(
            DISTINCT_ID_INPUT.to_string(),
            context.distinct_id.to_string(),
        );
        inputs
    }
}

#[async_trait]
impl Launcher for WorkflowLauncher {
    fn kind(&self) -> LauncherKind {
        LauncherKind::Workflow
    }

    async fn launch(&self, context: &LaunchContext) -> Result<RunState, RelayError> {
        let inputs = self.build_inputs(context);
        self.dispatcher
            .dispatch_workflow(&self.workflow_id, &self.git_ref, &inputs)
            .await?;
        tracing::debug!(
            distinct_id = %context.distinct_id,
            workflow = self.workflow_id.as_str(),
            git_ref = self.git_ref.as_str(),
            "workflow dispatch accepted"
        );
        Ok(RunState::Unresolved)
    }
}

pub struct PipelineLauncher {
    starter: Arc<dyn PipelineStarter>,
    project: String,
    pipeline_id: u64,
    parameters: BTreeMap<String, String>,
}

impl PipelineLauncher {
    pub fn new(
        starter: Arc<dyn PipelineStarter>,
        project: impl Into<String>,
        pipeline_id: u64,
    ) -> Self {
        Self {
            starter,
            project: project.into(),
            pipeline_id,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: BTreeMap<String, String>) -> Self {
        self.parameters = parameters;
        self
    }
}

#[async_trait]
impl Launcher for PipelineLauncher {
    fn kind(&self) -> LauncherKind {
        LauncherKind::Pipeline
    }

    async fn launch(&self, context: &LaunchContext) -> Result<RunState, RelayError> {
        let mut parameters = self.parameters.clone();
        parameters.extend(
            context
                .arguments
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        let url = self
            .starter
            .start_pipeline(&self.project, self.pipeline_id, &parameters)
            .await?;
        tracing::debug!(
            distinct_id = %context.distinct_id,
            project = self.project.as_str(),
            pipeline_id = self.pipeline_id,
            url = url.as_str(),
            "pipeline run started"
        );
        Ok(RunState::Resolved { url })
    }
}

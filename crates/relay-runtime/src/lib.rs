//! Async runtime for the chat-triggered command relay.
//!
//! Wires launchers, the concurrent dispatcher, status-document reconciliation,
//! and the resolution poller into one episode engine, and provides the GitHub
//! and Azure Pipelines REST collaborators used in production.

use std::sync::Arc;

pub mod azure_pipelines_client;
pub mod collaborators;
pub mod command_file;
pub mod dispatcher;
pub mod engine;
pub mod github_api_client;
mod http_retry;
pub mod launcher;
pub mod poller;
pub mod status_manager;

#[cfg(test)]
mod test_support;

pub use collaborators::{DocumentStore, PipelineStarter, RunLister, WorkflowDispatcher};
pub use engine::{EngineConfig, EpisodeReport, RelayEngine};
pub use launcher::{LaunchContext, Launcher, LauncherKind, PipelineLauncher, WorkflowLauncher};
pub use poller::PollSettings;

/// Registry whose handlers are launchers.
pub type RelayCommandRegistry = relay_core::command_registry::CommandRegistry<Arc<dyn Launcher>>;

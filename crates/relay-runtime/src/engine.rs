//! One episode: match, publish, dispatch, reconcile, poll.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use relay_core::event_payload::TriggerComment;
use relay_core::run_state::Run;
use relay_core::RelayError;
use serde::Serialize;

use crate::collaborators::{DocumentStore, RunLister};
use crate::dispatcher::{dispatch_planned_runs, plan_runs, DispatchContext};
use crate::poller::{poll_until_resolved, PollReport, PollSettings};
use crate::status_manager::StatusDocument;
use crate::RelayCommandRegistry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub poll: PollSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// What an episode did. `document_id` is `None` when nothing matched.
pub struct EpisodeReport {
    pub document_id: Option<u64>,
    pub runs: Vec<Run>,
    pub poll: Option<PollReport>,
}

impl EpisodeReport {
    pub fn is_noop(&self) -> bool {
        self.document_id.is_none()
    }
}

pub struct RelayEngine {
    config: EngineConfig,
    registry: RelayCommandRegistry,
    documents: Arc<dyn DocumentStore>,
    run_lister: Arc<dyn RunLister>,
}

impl RelayEngine {
    pub fn new(
        config: EngineConfig,
        registry: RelayCommandRegistry,
        documents: Arc<dyn DocumentStore>,
        run_lister: Arc<dyn RunLister>,
    ) -> Self {
        Self {
            config,
            registry,
            documents,
            run_lister,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &RelayCommandRegistry {
        &self.registry
    }

    /// Handles one trigger comment end to end.
    ///
    /// Only a failure to publish the status document aborts the episode;
    /// launch, listing, and reconcile failures are absorbed into run states
    /// and logs.
    pub async fn run_episode(&self, trigger: &TriggerComment) -> Result<EpisodeReport, RelayError> {
        let since = Utc::now();
        let started = Instant::now();

        let invocations = self
            .registry
            .match_invocations(&trigger.body, &trigger.requester);
        if invocations.is_empty() {
            tracing::info!(
                comment_id = trigger.comment_id,
                requester = trigger.requester.login.as_str(),
                role = trigger.requester.role.as_str(),
                "no authorized commands in comment"
            );
            return Ok(EpisodeReport::default());
        }

        let planned = plan_runs(trigger.comment_id, invocations);
        tracing::info!(
            comment_id = trigger.comment_id,
            commands = planned.len(),
            "matched commands"
        );

        let document = StatusDocument::publish(
            self.documents.clone(),
            trigger.issue_number,
            planned.iter().map(|plan| plan.row()),
        )
        .await?;

        let context = DispatchContext {
            issue_number: trigger.issue_number,
            status_document_id: document.document_id(),
            requester_login: trigger.requester.login.clone(),
        };
        let mut runs = dispatch_planned_runs(&planned, &context).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            elapsed_ms,
            runs = runs.len(),
            "Started in {elapsed_ms} ms"
        );

        if let Err(error) = document.reconcile(&runs).await {
            tracing::warn!(
                document_id = document.document_id(),
                error = %error,
                "status document reconcile failed"
            );
        }

        let poll = poll_until_resolved(
            &mut runs,
            self.run_lister.as_ref(),
            since,
            &document,
            &self.config.poll,
        )
        .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            elapsed_ms,
            ticks = poll.ticks,
            resolved = poll.resolved,
            timed_out = poll.timed_out,
            "Found in {elapsed_ms} ms"
        );

        Ok(EpisodeReport {
            document_id: Some(document.document_id()),
            runs,
            poll: Some(poll),
        })
    }
}

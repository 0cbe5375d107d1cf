//! Concurrent dispatch of matched invocations to their launchers.

use std::sync::Arc;

use futures_util::future::join_all;
use relay_core::command_registry::Invocation;
use relay_core::run_state::{DistinctId, Run, RunState};
use relay_core::status_document::StatusRowView;
use relay_core::transport_helpers::truncate_for_error;

use crate::launcher::{LaunchContext, Launcher};

const LAUNCH_ERROR_MAX_CHARS: usize = 600;

/// An invocation with its correlation id assigned, ready to launch.
#[derive(Debug)]
pub struct PlannedRun<'a> {
    pub distinct_id: DistinctId,
    pub invocation: Invocation<'a, Arc<dyn Launcher>>,
}

impl<'a> PlannedRun<'a> {
    pub fn row(&self) -> StatusRowView<'_> {
        StatusRowView {
            distinct_id: &self.distinct_id,
            display_name: &self.invocation.line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchContext {
    pub issue_number: u64,
    pub status_document_id: u64,
    pub requester_login: String,
}

/// Assigns `{seed}-{ordinal}` ids in invocation order.
pub fn plan_runs(
    seed: u64,
    invocations: Vec<Invocation<'_, Arc<dyn Launcher>>>,
) -> Vec<PlannedRun<'_>> {
    invocations
        .into_iter()
        .enumerate()
        .map(|(ordinal, invocation)| PlannedRun {
            distinct_id: DistinctId::new(seed, ordinal),
            invocation,
        })
        .collect()
}

/// Launches every planned run concurrently on the current task.
///
/// The returned table has one run per planned run, in plan order, whatever
/// the completion order. A failed launch becomes an `Error` run and never
/// affects its siblings.
pub async fn dispatch_planned_runs(
    planned: &[PlannedRun<'_>],
    context: &DispatchContext,
) -> Vec<Run> {
    let launches = planned.iter().map(|plan| async move {
        let launch_context = LaunchContext {
            distinct_id: plan.distinct_id.clone(),
            line: plan.invocation.line.clone(),
            arguments: plan.invocation.arguments.clone(),
            issue_number: context.issue_number,
            status_document_id: context.status_document_id,
            requester_login: context.requester_login.clone(),
        };
        let launcher = plan.invocation.command.handler();
        let state = match launcher.launch(&launch_context).await {
            Ok(state) => state,
            Err(error) => {
                tracing::warn!(
                    distinct_id = %plan.distinct_id,
                    command = plan.invocation.command.name(),
                    launcher = launcher.kind().as_str(),
                    error = %error,
                    "launch failed"
                );
                RunState::Error {
                    message: truncate_for_error(&error.to_string(), LAUNCH_ERROR_MAX_CHARS),
                }
            }
        };
        Run::new(
            plan.distinct_id.clone(),
            plan.invocation.line.clone(),
            state,
        )
    });
    join_all(launches).await
}

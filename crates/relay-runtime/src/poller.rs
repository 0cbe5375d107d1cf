//! Resolution poller: turns accepted-but-unconfirmed runs into terminal runs.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use relay_core::correlation::{find_matching_candidate, CandidateRun};
use relay_core::run_state::Run;
use serde::Serialize;
use tokio::time::Instant;

use crate::collaborators::RunLister;
use crate::status_manager::StatusDocument;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Loop bounds. With both caps unset the loop only stops once every run is terminal.
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
    pub timeout: Option<Duration>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_attempts: None,
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollReport {
    pub ticks: u32,
    pub resolved: usize,
    pub timed_out: usize,
}

/// Resolves unresolved runs against one listing. Returns how many moved.
///
/// A candidate claimed by one run is not offered to later runs of the same tick.
pub fn apply_candidates(runs: &mut [Run], candidates: &[CandidateRun]) -> usize {
    let mut claimed = HashSet::new();
    let mut resolved = 0;
    for run in runs.iter_mut().filter(|run| run.is_unresolved()) {
        let Some((index, candidate)) =
            find_matching_candidate(candidates, run.distinct_id().as_str(), &claimed)
        else {
            continue;
        };
        if run.resolve(candidate.url.clone()) {
            claimed.insert(index);
            resolved += 1;
            tracing::info!(
                distinct_id = %run.distinct_id(),
                url = candidate.url.as_str(),
                "run resolved"
            );
        }
    }
    resolved
}

fn unresolved_count(runs: &[Run]) -> usize {
    runs.iter().filter(|run| run.is_unresolved()).count()
}

fn budget_exhausted(settings: &PollSettings, ticks: u32, started: Instant) -> bool {
    let attempts_spent = settings
        .max_attempts
        .is_some_and(|max_attempts| ticks >= max_attempts);
    let deadline_passed = settings
        .timeout
        .is_some_and(|timeout| started.elapsed() >= timeout);
    attempts_spent || deadline_passed
}

async fn reconcile_logged(document: &StatusDocument, runs: &[Run]) {
    if let Err(error) = document.reconcile(runs).await {
        tracing::warn!(
            document_id = document.document_id(),
            error = %error,
            "status document reconcile failed"
        );
    }
}

/// Polls `lister` until every run is terminal or the budget runs out.
///
/// Every tick reconciles the document; reconcile and listing failures are
/// logged and never end the loop early.
pub async fn poll_until_resolved(
    runs: &mut [Run],
    lister: &dyn RunLister,
    since: DateTime<Utc>,
    document: &StatusDocument,
    settings: &PollSettings,
) -> PollReport {
    let started = Instant::now();
    let mut report = PollReport::default();

    loop {
        let unresolved = unresolved_count(runs);
        if unresolved == 0 {
            break;
        }
        if budget_exhausted(settings, report.ticks, started) {
            for run in runs.iter_mut() {
                if run.time_out(report.ticks) {
                    report.timed_out += 1;
                    tracing::warn!(
                        distinct_id = %run.distinct_id(),
                        polls = report.ticks,
                        "run timed out without a matching listing"
                    );
                }
            }
            reconcile_logged(document, runs).await;
            break;
        }

        tokio::time::sleep(settings.interval).await;
        report.ticks += 1;
        tracing::debug!(tick = report.ticks, unresolved, "polling run listing");

        match lister.list_runs(since).await {
            Ok(candidates) => {
                report.resolved += apply_candidates(runs, &candidates);
            }
            Err(error) => {
                tracing::warn!(tick = report.ticks, error = %error, "run listing failed");
            }
        }
        reconcile_logged(document, runs).await;
    }

    report
}

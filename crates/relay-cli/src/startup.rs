//! Wires flags, credentials, and the command file into one relay episode.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use relay_core::event_payload::{IssueCommentEvent, TriggerComment};
use relay_core::transport_helpers::RetryPolicy;
use relay_runtime::azure_pipelines_client::{AzurePipelinesClient, AzurePipelinesConfig};
use relay_runtime::command_file::{
    build_command_registry, load_command_specs, requires_pipelines, LauncherBackends,
};
use relay_runtime::github_api_client::{GithubApiClient, GithubApiConfig, RepoRef};
use relay_runtime::{EngineConfig, EpisodeReport, PipelineStarter, PollSettings, RelayEngine};

use crate::cli_args::{Cli, CliAzureFlags, CliGithubFlags, CliPollFlags};

pub(crate) fn load_trigger(event_path: &Path, bot_login: &str) -> Result<Option<TriggerComment>> {
    let raw = std::fs::read_to_string(event_path)
        .with_context(|| format!("failed to read event payload {}", event_path.display()))?;
    let event = IssueCommentEvent::from_json_str(&raw)
        .with_context(|| format!("failed to parse event payload {}", event_path.display()))?;
    Ok(event.into_trigger(Some(bot_login)))
}

fn retry_policy(flags: &CliGithubFlags) -> RetryPolicy {
    RetryPolicy::new(flags.retry_max_attempts, flags.retry_base_delay_ms)
}

pub(crate) fn github_api_config(flags: &CliGithubFlags) -> Result<GithubApiConfig> {
    let token = flags
        .github_token
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .context("missing GitHub token: set --github-token or GITHUB_TOKEN")?;
    Ok(GithubApiConfig {
        api_base: flags.github_api_base.clone(),
        token: token.to_string(),
        repo: RepoRef::parse(&flags.github_repo)?,
        request_timeout_ms: flags.request_timeout_ms,
        retry: retry_policy(flags),
    })
}

/// `None` when no command starts a pipeline; an error when one does but
/// Azure DevOps is not configured.
pub(crate) fn azure_pipelines_config(
    flags: &CliAzureFlags,
    github: &CliGithubFlags,
    pipelines_required: bool,
) -> Result<Option<AzurePipelinesConfig>> {
    if !pipelines_required {
        return Ok(None);
    }
    let Some(organization_url) = flags
        .azure_devops_org_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
    else {
        bail!("the command file declares pipeline commands but --azure-devops-org-url is not set");
    };
    let token = flags
        .azure_devops_token
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .context("missing Azure DevOps token: set --azure-devops-token or AZURE_DEVOPS_TOKEN")?;
    Ok(Some(AzurePipelinesConfig {
        organization_url: organization_url.to_string(),
        token: token.to_string(),
        request_timeout_ms: github.request_timeout_ms,
        retry: retry_policy(github),
    }))
}

pub(crate) fn engine_config(flags: &CliPollFlags) -> EngineConfig {
    EngineConfig {
        poll: PollSettings {
            interval: Duration::from_millis(flags.poll_interval_ms),
            max_attempts: flags.max_poll_attempts,
            timeout: flags.poll_timeout_seconds.map(Duration::from_secs),
        },
    }
}

fn log_report(report: &EpisodeReport) {
    for run in &report.runs {
        tracing::info!(
            distinct_id = %run.distinct_id(),
            command = run.display_name(),
            state = run.state().as_str(),
            "run finished"
        );
    }
    if let Some(poll) = report.poll {
        tracing::info!(
            document_id = report.document_id,
            runs = report.runs.len(),
            ticks = poll.ticks,
            resolved = poll.resolved,
            timed_out = poll.timed_out,
            "episode complete"
        );
    }
}

pub(crate) async fn run_cli(cli: Cli) -> Result<()> {
    let Some(trigger) = load_trigger(&cli.event_path, &cli.github.github_bot_login)? else {
        tracing::info!(
            event_path = %cli.event_path.display(),
            "event does not start an episode"
        );
        return Ok(());
    };

    let specs = load_command_specs(&cli.command_file)?;
    let github = Arc::new(
        GithubApiClient::new(github_api_config(&cli.github)?)
            .context("failed to create github api client")?,
    );
    let pipelines = azure_pipelines_config(&cli.azure, &cli.github, requires_pipelines(&specs))?
        .map(|config| {
            AzurePipelinesClient::new(config)
                .map(|client| Arc::new(client) as Arc<dyn PipelineStarter>)
                .context("failed to create azure pipelines client")
        })
        .transpose()?;
    let registry = build_command_registry(
        &cli.bot_prefix,
        &specs,
        &LauncherBackends {
            workflows: github.clone(),
            pipelines,
            default_ref: cli.github.workflow_ref.clone(),
        },
    )?;
    tracing::info!(
        repo = %github.repo().as_slug(),
        commands = registry.len(),
        comment_id = trigger.comment_id,
        issue_number = trigger.issue_number,
        "relay episode starting"
    );

    let engine = RelayEngine::new(engine_config(&cli.poll), registry, github.clone(), github);
    let report = engine
        .run_episode(&trigger)
        .await
        .context("relay episode failed")?;
    log_report(&report);

    if cli.summary_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to render episode report")?
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use clap::Parser;
    use serde_json::json;
    use tempfile::tempdir;

    use super::{azure_pipelines_config, engine_config, github_api_config, load_trigger};
    use crate::cli_args::Cli;

    fn cli(extra: &[&str]) -> Cli {
        let mut args = vec![
            "relay",
            "--event-path",
            "event.json",
            "--github-repo",
            "octo/relay",
        ];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args).expect("parse")
    }

    #[test]
    fn unit_engine_config_maps_poll_bounds() {
        let cli = cli(&[
            "--poll-interval-ms",
            "25",
            "--max-poll-attempts",
            "4",
            "--poll-timeout-seconds",
            "90",
        ]);
        let config = engine_config(&cli.poll);
        assert_eq!(config.poll.interval, Duration::from_millis(25));
        assert_eq!(config.poll.max_attempts, Some(4));
        assert_eq!(config.poll.timeout, Some(Duration::from_secs(90)));
    }

    #[test]
    fn functional_github_api_config_uses_token_and_repo() {
        let cli = cli(&["--github-token", " secret ", "--retry-max-attempts", "2"]);
        let config = github_api_config(&cli.github).expect("config");
        assert_eq!(config.token, "secret");
        assert_eq!(config.repo.as_slug(), "octo/relay");
        assert_eq!(config.retry.max_attempts, 2);
    }

    #[test]
    fn regression_github_api_config_rejects_blank_token() {
        let cli = cli(&["--github-token", "  "]);
        let error = github_api_config(&cli.github).expect_err("blank token");
        assert!(error.to_string().contains("missing GitHub token"));
    }

    #[test]
    fn regression_azure_config_is_only_required_for_pipeline_commands() {
        let cli = cli(&[]);
        if cli.azure.azure_devops_org_url.is_none() {
            assert!(azure_pipelines_config(&cli.azure, &cli.github, true).is_err());
        }
        assert!(azure_pipelines_config(&cli.azure, &cli.github, false)
            .expect("not required")
            .is_none());

        let cli = self::cli(&[
            "--azure-devops-org-url",
            "https://dev.azure.com/my-org",
            "--azure-devops-token",
            "pat",
        ]);
        let config = azure_pipelines_config(&cli.azure, &cli.github, true)
            .expect("config")
            .expect("required");
        assert_eq!(config.organization_url, "https://dev.azure.com/my-org");
        assert_eq!(config.token, "pat");
    }

    #[test]
    fn functional_load_trigger_skips_bot_comments_and_edits() {
        let temp = tempdir().expect("tempdir");
        let payload = |action: &str, login: &str| {
            json!({
                "action": action,
                "comment": {
                    "id": 10,
                    "body": "@relay deploy staging",
                    "user": {"login": login},
                    "author_association": "MEMBER"
                },
                "issue": {"number": 3}
            })
            .to_string()
        };

        let created = temp.path().join("created.json");
        fs::write(&created, payload("created", "alice")).expect("write");
        let trigger = load_trigger(&created, "github-actions[bot]")
            .expect("load")
            .expect("trigger");
        assert_eq!(trigger.comment_id, 10);
        assert_eq!(trigger.issue_number, 3);
        assert!(!trigger.requester.is_pull_request);

        let from_bot = temp.path().join("bot.json");
        fs::write(&from_bot, payload("created", "github-actions[bot]")).expect("write");
        assert!(load_trigger(&from_bot, "github-actions[bot]")
            .expect("load")
            .is_none());

        let edited = temp.path().join("edited.json");
        fs::write(&edited, payload("edited", "alice")).expect("write");
        assert!(load_trigger(&edited, "github-actions[bot]")
            .expect("load")
            .is_none());
    }

    #[test]
    fn regression_load_trigger_reports_unreadable_payloads() {
        let temp = tempdir().expect("tempdir");
        let missing = temp.path().join("missing.json");
        let error = load_trigger(&missing, "bot").expect_err("missing payload");
        assert!(error.to_string().contains("failed to read event payload"));

        let garbage = temp.path().join("garbage.json");
        fs::write(&garbage, "{not json").expect("write");
        let error = load_trigger(&garbage, "bot").expect_err("invalid payload");
        assert!(error.to_string().contains("failed to parse event payload"));
    }
}

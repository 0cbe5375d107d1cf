use clap::Args;
use relay_runtime::github_api_client::DEFAULT_GITHUB_API_BASE;

use super::{parse_positive_u64, parse_positive_usize};

/// GitHub API access, workflow dispatch target, and shared HTTP transport flags.
#[derive(Debug, Args)]
pub(crate) struct CliGithubFlags {
    #[arg(
        long = "github-repo",
        env = "GITHUB_REPOSITORY",
        help = "GitHub repository in owner/repo format hosting the comment thread and workflows"
    )]
    pub github_repo: String,

    #[arg(
        long = "github-token",
        env = "GITHUB_TOKEN",
        hide_env_values = true,
        help = "GitHub token used to dispatch workflows, list runs, and edit the status comment"
    )]
    pub github_token: Option<String>,

    #[arg(
        long = "github-api-base",
        env = "GITHUB_API_URL",
        default_value = DEFAULT_GITHUB_API_BASE,
        help = "GitHub API base URL"
    )]
    pub github_api_base: String,

    #[arg(
        long = "github-bot-login",
        env = "RELAY_GITHUB_BOT_LOGIN",
        default_value = "github-actions[bot]",
        help = "Login whose own comments never trigger an episode"
    )]
    pub github_bot_login: String,

    #[arg(
        long = "workflow-ref",
        env = "RELAY_WORKFLOW_REF",
        default_value = "main",
        help = "Git ref dispatched workflows run on when a command does not set one"
    )]
    pub workflow_ref: String,

    #[arg(
        long = "request-timeout-ms",
        env = "RELAY_REQUEST_TIMEOUT_MS",
        default_value_t = 10_000,
        value_parser = parse_positive_u64,
        help = "Timeout for each outbound HTTP request in milliseconds"
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long = "retry-max-attempts",
        env = "RELAY_RETRY_MAX_ATTEMPTS",
        default_value_t = 4,
        value_parser = parse_positive_usize,
        help = "Maximum attempts for retryable API failures (429/5xx/transport)"
    )]
    pub retry_max_attempts: usize,

    #[arg(
        long = "retry-base-delay-ms",
        env = "RELAY_RETRY_BASE_DELAY_MS",
        default_value_t = 500,
        help = "Base backoff delay in milliseconds for API retries"
    )]
    pub retry_base_delay_ms: u64,
}

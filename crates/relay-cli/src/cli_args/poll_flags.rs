use clap::Args;
use relay_runtime::poller::DEFAULT_POLL_INTERVAL_MS;

use super::{parse_positive_u32, parse_positive_u64};

/// Bounds for the loop that waits for dispatched workflows to show up.
#[derive(Debug, Args)]
pub(crate) struct CliPollFlags {
    #[arg(
        long = "poll-interval-ms",
        env = "RELAY_POLL_INTERVAL_MS",
        default_value_t = DEFAULT_POLL_INTERVAL_MS,
        value_parser = parse_positive_u64,
        help = "Delay between workflow run listings in milliseconds"
    )]
    pub poll_interval_ms: u64,

    #[arg(
        long = "max-poll-attempts",
        env = "RELAY_MAX_POLL_ATTEMPTS",
        value_parser = parse_positive_u32,
        help = "Give up on unmatched runs after this many listings (unbounded when unset)"
    )]
    pub max_poll_attempts: Option<u32>,

    #[arg(
        long = "poll-timeout-seconds",
        env = "RELAY_POLL_TIMEOUT_SECONDS",
        value_parser = parse_positive_u64,
        help = "Give up on unmatched runs after this many seconds of polling (unbounded when unset)"
    )]
    pub poll_timeout_seconds: Option<u64>,
}

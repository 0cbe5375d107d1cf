use std::path::PathBuf;

use clap::{ArgAction, Parser};

mod azure_flags;
mod github_flags;
mod poll_flags;

pub(crate) use azure_flags::CliAzureFlags;
pub(crate) use github_flags::CliGithubFlags;
pub(crate) use poll_flags::CliPollFlags;

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u32(value: &str) -> Result<u32, String> {
    let parsed = value
        .parse::<u32>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "relay",
    about = "Launch CI jobs from issue comments and track them in a status comment",
    version
)]
pub(crate) struct Cli {
    #[arg(
        long = "event-path",
        env = "GITHUB_EVENT_PATH",
        help = "Path to the issue_comment webhook payload that triggers this episode"
    )]
    pub event_path: PathBuf,

    #[arg(
        long = "command-file",
        env = "RELAY_COMMAND_FILE",
        default_value = ".github/relay-commands.toml",
        help = "TOML file declaring the commands, their patterns, roles, and launchers"
    )]
    pub command_file: PathBuf,

    #[arg(
        long = "bot-prefix",
        env = "RELAY_BOT_PREFIX",
        default_value = "@relay",
        help = "Prefix that marks a comment line as a command invocation"
    )]
    pub bot_prefix: String,

    #[arg(
        long = "summary-json",
        env = "RELAY_SUMMARY_JSON",
        default_value_t = false,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        help = "Print the episode report as JSON on stdout when the episode ends"
    )]
    pub summary_json: bool,

    #[command(flatten)]
    pub github: CliGithubFlags,

    #[command(flatten)]
    pub poll: CliPollFlags,

    #[command(flatten)]
    pub azure: CliAzureFlags,
}

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "RELAY_LOG";
const FALLBACK_LOG_ENV_VAR: &str = "RUST_LOG";

fn log_filter(directives: Option<&str>) -> EnvFilter {
    let directives = directives.map(str::trim).unwrap_or_default();
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives)
}

/// Logs go to stderr; stdout is reserved for `--summary-json`.
pub(crate) fn init_tracing() {
    let directives = std::env::var(LOG_ENV_VAR)
        .or_else(|_| std::env::var(FALLBACK_LOG_ENV_VAR))
        .ok();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use tracing::level_filters::LevelFilter;

    use super::log_filter;

    #[test]
    fn unit_log_filter_defaults_to_info() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(Some("  ")).max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn functional_log_filter_accepts_per_crate_directives() {
        let filter = log_filter(Some("relay_runtime=debug"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }
}

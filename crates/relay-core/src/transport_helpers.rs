use std::time::Duration;

const MAX_RETRY_DELAY_MS: u64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Per-request retry budget for HTTP collaborators.
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 500,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms: base_delay_ms.max(1),
        }
    }

    /// Whether another attempt may follow the 1-based `attempt` that just failed.
    pub fn allows_retry(&self, attempt: usize) -> bool {
        attempt < self.max_attempts
    }

    /// Exponential delay after `attempt`, floored by any `Retry-After` hint.
    pub fn delay_for(&self, attempt: usize, retry_after: Option<Duration>) -> Duration {
        if let Some(delay) = retry_after {
            return delay.max(Duration::from_millis(self.base_delay_ms));
        }
        let exponent = attempt.saturating_sub(1).min(10) as u32;
        let scaled = self
            .base_delay_ms
            .saturating_mul(2_u64.saturating_pow(exponent));
        Duration::from_millis(scaled.min(MAX_RETRY_DELAY_MS))
    }
}

pub fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    let raw = headers.get(reqwest::header::RETRY_AFTER)?.to_str().ok()?;
    let seconds = raw.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(seconds))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Whether sending a request twice can repeat its side effect.
pub enum RequestSafety {
    /// Reads, and updates that replace the whole resource.
    Idempotent,
    /// Comment creation and workflow or pipeline starts. A timeout or 5xx may
    /// arrive after the server already acted, so only rejections that prove
    /// nothing happened are retried.
    NonIdempotent,
}

impl RequestSafety {
    pub fn retries_status(self, status: u16) -> bool {
        match self {
            Self::Idempotent => is_retryable_status(status),
            Self::NonIdempotent => status == 429,
        }
    }

    pub fn retries_transport_error(self, error: &reqwest::Error) -> bool {
        match self {
            Self::Idempotent => is_retryable_transport_error(error),
            Self::NonIdempotent => error.is_connect(),
        }
    }
}

pub fn is_retryable_transport_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || status >= 500
}

pub fn truncate_for_error(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated = text.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}

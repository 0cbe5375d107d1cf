use relay_core::transport_helpers::{
    parse_retry_after, truncate_for_error, RequestSafety, RetryPolicy,
};
use relay_core::RelayError;
use serde::de::DeserializeOwned;

const RETRY_ATTEMPT_HEADER: &str = "x-relay-retry-attempt";
const ERROR_BODY_MAX_CHARS: usize = 800;

/// Sends the request built by `request_builder`, retrying the failures
/// `safety` allows: 429/5xx and transient transport errors for idempotent
/// requests, only 429 and refused connections otherwise. Any other
/// non-success status is returned as `RelayError::HttpStatus`.
pub(crate) async fn send_with_retry<F>(
    operation: &str,
    retry: RetryPolicy,
    safety: RequestSafety,
    mut request_builder: F,
) -> Result<reqwest::Response, RelayError>
where
    F: FnMut() -> reqwest::RequestBuilder,
{
    let mut attempt = 0_usize;
    loop {
        attempt = attempt.saturating_add(1);
        let response = request_builder()
            .header(RETRY_ATTEMPT_HEADER, attempt.saturating_sub(1).to_string())
            .send()
            .await;
        match response {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }

                let retry_after = parse_retry_after(response.headers());
                let body = response.text().await.unwrap_or_default();
                if retry.allows_retry(attempt) && safety.retries_status(status.as_u16()) {
                    let delay = retry.delay_for(attempt, retry_after);
                    tracing::debug!(
                        operation,
                        attempt,
                        status = status.as_u16(),
                        delay_ms = delay.as_millis() as u64,
                        "retrying request"
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }

                return Err(RelayError::HttpStatus {
                    operation: operation.to_string(),
                    status: status.as_u16(),
                    body: truncate_for_error(&body, ERROR_BODY_MAX_CHARS),
                });
            }
            Err(error) => {
                if retry.allows_retry(attempt) && safety.retries_transport_error(&error) {
                    let delay = retry.delay_for(attempt, None);
                    tracing::debug!(operation, attempt, error = %error, "retrying request");
                    tokio::time::sleep(delay).await;
                    continue;
                }
                return Err(RelayError::Http(error));
            }
        }
    }
}

pub(crate) async fn decode_json<T>(
    operation: &str,
    response: reqwest::Response,
) -> Result<T, RelayError>
where
    T: DeserializeOwned,
{
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|error| {
        RelayError::InvalidResponse(format!("failed to decode {operation}: {error}"))
    })
}

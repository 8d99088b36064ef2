use crate::error::Result;
use reqwest::StatusCode;
use std::time::Duration;

/// Retry contract shared by the batch jobs: a bounded number of retries
/// with exponential backoff from a base delay. Only transient-looking
/// failures (429, 5xx, transport errors) are retried; any other HTTP
/// status is permanent and the call gives up immediately.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self { max_retries, base_delay }
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(600),
        }
    }
}

pub fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

pub fn build_client(user_agent: &str, timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Send a request under the retry policy. Returns `None` when the call
/// failed permanently or exhausted its retries; the caller treats that
/// as "no data", never as a fatal error.
pub async fn send_with_retry(
    builder: reqwest::RequestBuilder,
    policy: &RetryPolicy,
) -> Option<reqwest::Response> {
    for attempt in 0..=policy.max_retries {
        let request = builder.try_clone()?;

        match request.send().await {
            Ok(resp) if resp.status().is_success() => return Some(resp),
            Ok(resp) if is_transient_status(resp.status()) => {
                if attempt < policy.max_retries {
                    tracing::debug!(
                        status = %resp.status(),
                        attempt,
                        "transient HTTP status, backing off"
                    );
                    tokio::time::sleep(policy.backoff(attempt)).await;
                    continue;
                }
                tracing::warn!(status = %resp.status(), "retries exhausted");
                return None;
            }
            Ok(resp) => {
                tracing::debug!(status = %resp.status(), "permanent HTTP failure, not retrying");
                return None;
            }
            Err(e) => {
                if attempt < policy.max_retries {
                    tracing::debug!(error = %e, attempt, "transport error, backing off");
                    tokio::time::sleep(policy.backoff(attempt)).await;
                    continue;
                }
                tracing::warn!(error = %e, "retries exhausted");
                return None;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_transient_status(StatusCode::BAD_GATEWAY));
        assert!(is_transient_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_transient_status(StatusCode::NOT_FOUND));
        assert!(!is_transient_status(StatusCode::UNAUTHORIZED));
        assert!(!is_transient_status(StatusCode::OK));
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let policy = RetryPolicy::new(4, Duration::from_millis(600));
        assert_eq!(policy.backoff(0), Duration::from_millis(600));
        assert_eq!(policy.backoff(1), Duration::from_millis(1200));
        assert_eq!(policy.backoff(2), Duration::from_millis(2400));
        assert_eq!(policy.backoff(3), Duration::from_millis(4800));
    }
}

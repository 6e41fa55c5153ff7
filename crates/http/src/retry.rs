use std::time::Duration;

use tracing::{debug, warn};
use vidfuse_protocol::constants::CONTROL_TIMEOUT;

use crate::{HttpError, HttpRequest, HttpResponse, HttpTransport, fetch_with_timeout};

/// Default attempts per logical request.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(300);

/// How a logical request is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. 0 is treated as 1.
    pub max_attempts: u32,
    /// Delay after the first failure; doubled after each further failure.
    pub initial_backoff: Duration,
    /// Optional cap on the backoff. `None` lets it grow unbounded.
    pub max_backoff: Option<Duration>,
    /// Deadline applied to every individual attempt.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: None,
            timeout: CONTROL_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    /// Same policy with a different per-attempt deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fresh retry state for one logical request.
    pub fn start(&self) -> RetryState {
        RetryState {
            attempts_remaining: self.max_attempts.max(1),
            backoff: self.initial_backoff,
            max_backoff: self.max_backoff,
        }
    }
}

/// Retry bookkeeping for a single logical request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    attempts_remaining: u32,
    backoff: Duration,
    max_backoff: Option<Duration>,
}

impl RetryState {
    pub fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }

    /// Delay that will follow the next failure.
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Records a failed attempt.
    ///
    /// Returns the delay to wait before retrying, or `None` when no attempts
    /// remain. The stored backoff doubles each time a delay is handed out.
    pub fn on_failure(&mut self) -> Option<Duration> {
        self.attempts_remaining = self.attempts_remaining.saturating_sub(1);
        if self.attempts_remaining == 0 {
            return None;
        }
        let delay = self.backoff;
        let doubled = self.backoff.saturating_mul(2);
        self.backoff = match self.max_backoff {
            Some(cap) => doubled.min(cap),
            None => doubled,
        };
        Some(delay)
    }
}

/// Repeats [`fetch_with_timeout`] until a 2xx response arrives or the
/// policy's attempts are exhausted.
///
/// Non-2xx statuses, transport failures and timeouts all count as failures.
/// After the final failure the last error is returned inside
/// [`HttpError::Exhausted`], which records the attempt count. Attempts run
/// strictly one after another; concurrent callers share no state.
pub async fn fetch_with_retry<T: HttpTransport + ?Sized>(
    transport: &T,
    request: &HttpRequest,
    policy: &RetryPolicy,
) -> Result<HttpResponse, HttpError> {
    let mut state = policy.start();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        let error = match fetch_with_timeout(transport, request, policy.timeout).await {
            Ok(resp) if resp.is_success() => {
                debug!(
                    method = request.method.as_str(),
                    url = %request.url,
                    status = resp.status,
                    attempt,
                    "request succeeded"
                );
                return Ok(resp);
            }
            Ok(resp) => HttpError::Status {
                status: resp.status,
                body: resp.text(),
            },
            Err(e) => e,
        };

        match state.on_failure() {
            Some(delay) => {
                warn!(
                    method = request.method.as_str(),
                    url = %request.url,
                    attempt,
                    retry_in_ms = delay.as_millis() as u64,
                    error = %error,
                    "request failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            None => {
                warn!(
                    method = request.method.as_str(),
                    url = %request.url,
                    attempts = attempt,
                    error = %error,
                    "request failed, giving up"
                );
                return Err(HttpError::Exhausted {
                    attempts: attempt,
                    source: Box::new(error),
                });
            }
        }
    }
}

use reqwest::StatusCode;
use std::time::{Duration, SystemTime};

/// Backoff parameters for failed translation requests.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay, server hints included.
    pub max_delay: Duration,
    /// Number of retries allowed after the initial attempt.
    pub max_retries: u32,
}

impl RetryPolicy {
    pub const fn new(base_delay: Duration, max_delay: Duration, max_retries: u32) -> Self {
        Self {
            base_delay,
            max_delay,
            max_retries,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(30), 3)
    }
}

/// How a translation request failed, as far as retrying is concerned.
#[derive(Debug, Clone, Copy)]
pub enum RequestFailure {
    /// The service answered with a non-success status.
    Status {
        status: StatusCode,
        retry_after: Option<Duration>,
    },
    /// The request never produced a status (connect, timeout, body read).
    Transport,
}

/// Decision for one failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDecision {
    pub should_retry: bool,
    pub delay: Duration,
    pub used_header: bool,
}

impl RetryDecision {
    const fn no_retry() -> Self {
        Self {
            should_retry: false,
            delay: Duration::ZERO,
            used_header: false,
        }
    }

    fn retry_with(delay: Duration, used_header: bool, max_delay: Duration) -> Self {
        Self {
            should_retry: true,
            delay: delay.min(max_delay),
            used_header,
        }
    }
}

/// Decides whether a failed attempt is worth repeating and how long to wait.
///
/// `previous_attempts` counts the retries already made, so the first failure
/// evaluates with `0`.
pub fn evaluate_retry(
    failure: RequestFailure,
    policy: RetryPolicy,
    previous_attempts: u32,
) -> RetryDecision {
    if previous_attempts >= policy.max_retries {
        return RetryDecision::no_retry();
    }

    match failure {
        RequestFailure::Status { status, .. } if !is_retryable_status(status) => {
            RetryDecision::no_retry()
        }
        RequestFailure::Status {
            retry_after: Some(hinted),
            ..
        } => RetryDecision::retry_with(hinted, true, policy.max_delay),
        RequestFailure::Status { .. } | RequestFailure::Transport => {
            let delay = exponential_backoff(policy.base_delay, policy.max_delay, previous_attempts);
            RetryDecision::retry_with(delay, false, policy.max_delay)
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

fn exponential_backoff(base: Duration, max_delay: Duration, previous_attempts: u32) -> Duration {
    let mut delay = base;
    for _ in 0..previous_attempts {
        delay = delay.saturating_mul(2).min(max_delay);
    }
    delay.min(max_delay)
}

/// Parses the value of an HTTP `Retry-After` header.
///
/// Accepts the delay-seconds and HTTP-date forms; a date in the past reads
/// as zero. Returns `None` when parsing fails.
pub fn parse_retry_after(value: &str, now: SystemTime) -> Option<Duration> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(seconds) = trimmed.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    if let Ok(instant) = httpdate::parse_http_date(trimmed) {
        if let Ok(duration) = instant.duration_since(now) {
            return Some(duration);
        }
        return Some(Duration::from_secs(0));
    }

    None
}

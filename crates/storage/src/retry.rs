//! Bounded exponential-backoff retry for store operations.
//!
//! The operation is re-run only when its error is transient. It may therefore
//! execute up to `max_retries + 1` times and must be safe to repeat.

use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Message fragments that mark an error as transient when the error carries
/// no structured information.
pub const TRANSIENT_MARKERS: [&str; 3] = ["prepared statement", "bind message", "connection"];

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);

/// Whether a failure is expected to clear when the same call is retried.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// Case-sensitive substring check against [`TRANSIENT_MARKERS`].
pub fn message_is_transient(message: &str) -> bool {
    TRANSIENT_MARKERS.iter().any(|m| message.contains(m))
}

impl Transient for sqlx::Error {
    fn is_transient(&self) -> bool {
        match self {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::WorkerCrashed => true,
            sqlx::Error::Database(db) if db.code().is_some_and(|c| is_busy_code(&c)) => true,
            other => message_is_transient(&other.to_string()),
        }
    }
}

/// SQLITE_BUSY (5) and SQLITE_LOCKED (6), including their extended codes.
fn is_busy_code(code: &str) -> bool {
    code.parse::<i32>()
        .map(|n| matches!(n & 0xff, 5 | 6))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self { max_retries, base_delay }
    }

    /// `base_delay * 2^attempt`, attempt counted from zero.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Run `op`, retrying while the error reports itself as transient.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + fmt::Display,
{
    with_retry_if(policy, op, Transient::is_transient).await
}

/// Like [`with_retry`] with an explicit classifier.
pub async fn with_retry_if<T, E, F, Fut, C>(
    policy: &RetryPolicy,
    mut op: F,
    is_transient: C,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
    C: Fn(&E) -> bool,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if !is_transient(&e) => return Err(e),
            Err(e) if attempt >= policy.max_retries => {
                tracing::error!(attempts = attempt + 1, "Store operation failed after retries: {e}");
                return Err(e);
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Transient store error, retrying: {e}"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

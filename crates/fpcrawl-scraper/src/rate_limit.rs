//! Pacing and retry utilities for catalog page loads.
//!
//! Provides the randomized courtesy delays applied between pages and between
//! emitted records, and exponential backoff retry logic for transient
//! navigation errors such as 429 responses. Non-retriable errors (404s,
//! unexpected statuses, parse failures) are propagated immediately.

use std::future::Future;
use std::time::Duration;

use fpcrawl_core::DelayRange;
use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::error::ScraperError;

/// Draws a delay uniformly from `range` (inclusive).
#[must_use]
pub fn random_delay(range: DelayRange) -> Duration {
    if range.max_ms <= range.min_ms {
        return range.min();
    }
    let ms = rand::rng().random_range(range.min_ms..=range.max_ms);
    Duration::from_millis(ms)
}

/// Sleeps for `delay` unless `cancel` fires first.
///
/// Returns `false` when the wait was cut short by cancellation.
pub async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    if delay.is_zero() {
        return true;
    }
    tokio::select! {
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(delay) => true,
    }
}

/// Sleeps for a random duration drawn from `range` unless cancelled.
///
/// Returns `false` when cancelled.
pub async fn pace(range: DelayRange, cancel: &CancellationToken) -> bool {
    sleep_or_cancel(random_delay(range), cancel).await
}

/// Returns `true` if `err` represents a transient condition worth retrying.
///
/// Retriable errors:
/// - [`ScraperError::RateLimited`]: HTTP 429, the server has asked us to back off.
/// - [`ScraperError::Http`]: network-level failure (connection reset, etc.).
/// - [`ScraperError::NavigationTimeout`]: the page did not settle in time.
fn is_retriable(err: &ScraperError) -> bool {
    matches!(
        err,
        ScraperError::RateLimited { .. }
            | ScraperError::Http(_)
            | ScraperError::NavigationTimeout { .. }
    )
}

/// Backoff before retry number `attempt + 1`: `base_secs * 2^attempt`.
fn backoff_delay(base_secs: u64, attempt: u32) -> Duration {
    Duration::from_secs(base_secs.saturating_mul(1u64 << attempt.min(62)))
}

/// Runs `operation`, retrying transient failures with exponential backoff.
///
/// The operation runs once plus up to `max_retries` more times, sleeping
/// `backoff_base_secs * 2^attempt` seconds between tries. Non-retriable
/// errors and the error from the final try are returned as-is.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if is_retriable(&err) && attempt < max_retries => err,
            Err(err) => return Err(err),
        };

        let delay = backoff_delay(backoff_base_secs, attempt);
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs = delay.as_secs(),
            error = %err,
            "transient navigation error, retrying after backoff"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

//! The classified retry loop.
//!
//! Every public entry point here funnels into [`run_classified`]: invoke the
//! operation, classify any failure, ask the policy what to do, then either
//! give up, retry at once, or sleep and retry.

use std::fmt;

use tokio::time::Instant;

use super::classify::ErrorClass;
use super::error::RetryExhausted;
use super::policy::{RetryDecision, RetryEvent, RetryPolicy};
use crate::operation::Operation;

/// Retry an operation, classifying failures by their message.
///
/// Errors whose `Display` output contains `"429"` back off exponentially;
/// every other error is retried immediately. When the policy is exhausted the
/// error from the last attempt is returned unchanged.
///
/// # Example
///
/// ```rust
/// use tributary::{retry, RetryPolicy};
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// # tokio_test::block_on(async {
/// let counter = AtomicU32::new(0);
/// let calls = &counter;
/// let flaky = move || async move {
///     if calls.fetch_add(1, Ordering::SeqCst) == 0 {
///         Err("500 Internal Server Error")
///     } else {
///         Ok("profile")
///     }
/// };
///
/// assert_eq!(retry(&flaky, &RetryPolicy::default()).await, Ok("profile"));
/// assert_eq!(calls.load(Ordering::SeqCst), 2);
/// # });
/// ```
pub async fn retry<O>(operation: &O, policy: &RetryPolicy) -> Result<O::Output, O::Error>
where
    O: Operation + ?Sized,
    O::Error: fmt::Display,
{
    run_classified(operation, policy, ErrorClass::of, |_| {})
        .await
        .map_err(RetryExhausted::into_error)
}

/// Retry with a caller-supplied classifier.
///
/// Useful when the error carries a structured status instead of a message.
///
/// # Example
///
/// ```rust
/// use tributary::{retry_with_classifier, ErrorClass, RetryPolicy};
///
/// #[derive(Debug, PartialEq)]
/// struct Status(u16);
///
/// # tokio_test::block_on(async {
/// let op = || async { Err::<(), _>(Status(503)) };
/// let classify = |s: &Status| match s.0 {
///     429 => ErrorClass::RateLimited,
///     500..=599 => ErrorClass::Transient,
///     _ => ErrorClass::Other,
/// };
///
/// let policy = RetryPolicy::default().with_max_retries(1);
/// assert_eq!(retry_with_classifier(&op, &policy, classify).await, Err(Status(503)));
/// # });
/// ```
pub async fn retry_with_classifier<O, C>(
    operation: &O,
    policy: &RetryPolicy,
    classify: C,
) -> Result<O::Output, O::Error>
where
    O: Operation + ?Sized,
    C: Fn(&O::Error) -> ErrorClass + Send + Sync,
{
    run_classified(operation, policy, classify, |_| {})
        .await
        .map_err(RetryExhausted::into_error)
}

/// Retry with hooks for observability.
///
/// The `on_failure` callback is invoked after every failed attempt, the
/// final one included (its `next_delay` is `None`). The callback is
/// synchronous and should not block; use it for logging/metrics.
///
/// # Example
///
/// ```rust
/// use tributary::{retry_with_hooks, RetryEvent, RetryPolicy};
/// use std::sync::Mutex;
///
/// # tokio_test::block_on(async {
/// let seen = Mutex::new(Vec::new());
/// let op = || async { Err::<(), _>("500 Internal Server Error") };
///
/// let result = retry_with_hooks(
///     &op,
///     &RetryPolicy::default().with_max_retries(2),
///     |event: &RetryEvent<'_, &str>| seen.lock().unwrap().push(event.attempt),
/// )
/// .await;
///
/// assert!(result.is_err());
/// assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
/// # });
/// ```
pub async fn retry_with_hooks<O, H>(
    operation: &O,
    policy: &RetryPolicy,
    on_failure: H,
) -> Result<O::Output, O::Error>
where
    O: Operation + ?Sized,
    O::Error: fmt::Display,
    H: Fn(&RetryEvent<'_, O::Error>) + Send + Sync,
{
    run_classified(operation, policy, ErrorClass::of, on_failure)
        .await
        .map_err(RetryExhausted::into_error)
}

/// Retry and report exhaustion with attempt count, final class and duration.
pub async fn retry_detailed<O>(
    operation: &O,
    policy: &RetryPolicy,
) -> Result<O::Output, RetryExhausted<O::Error>>
where
    O: Operation + ?Sized,
    O::Error: fmt::Display,
{
    run_classified(operation, policy, ErrorClass::of, |_| {}).await
}

async fn run_classified<O, C, H>(
    operation: &O,
    policy: &RetryPolicy,
    classify: C,
    on_failure: H,
) -> Result<O::Output, RetryExhausted<O::Error>>
where
    O: Operation + ?Sized,
    C: Fn(&O::Error) -> ErrorClass + Send + Sync,
    H: Fn(&RetryEvent<'_, O::Error>) + Send + Sync,
{
    let start = Instant::now();
    let mut attempt = 0u32;

    loop {
        let error = match operation.run().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        let class = classify(&error);
        let decision = policy.decide(attempt, class);
        let next_delay = match decision {
            RetryDecision::GiveUp => None,
            RetryDecision::RetryAfter(d) => Some(d),
        };

        on_failure(&RetryEvent {
            attempt,
            error: &error,
            class,
            next_delay,
            elapsed: start.elapsed(),
        });

        match decision {
            RetryDecision::GiveUp => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    attempts = attempt + 1,
                    %class,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "operation failed, retries exhausted"
                );
                return Err(RetryExhausted::new(
                    error,
                    attempt + 1,
                    class,
                    start.elapsed(),
                ));
            }
            RetryDecision::RetryAfter(delay) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    attempt,
                    %class,
                    delay_ms = delay.as_millis() as u64,
                    "operation failed, retrying"
                );
                drop(error);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
        }
    }
}

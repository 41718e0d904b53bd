//! Error types for retry operations.

use std::fmt;
use std::time::Duration;

use super::classify::ErrorClass;

/// The final failure of an operation whose retries ran out.
///
/// Carries the error from the last attempt, how that error was classified,
/// and how much work the executor put in before giving up.
///
/// # Examples
///
/// ```rust
/// use tributary::{retry_detailed, ErrorClass, RetryPolicy};
///
/// # tokio_test::block_on(async {
/// let policy = RetryPolicy::default().with_max_retries(2);
///
/// let op = || async { Err::<(), _>("500 Internal Server Error") };
///
/// match retry_detailed(&op, &policy).await {
///     Err(exhausted) => {
///         assert_eq!(exhausted.final_error, "500 Internal Server Error");
///         assert_eq!(exhausted.attempts, 3); // 1 initial + 2 retries
///         assert_eq!(exhausted.class, ErrorClass::Transient);
///     }
///     Ok(_) => panic!("Expected failure"),
/// }
/// # });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryExhausted<E> {
    /// The error from the final attempt.
    pub final_error: E,
    /// Total number of attempts made (initial + retries).
    pub attempts: u32,
    /// Classification of the final error.
    pub class: ErrorClass,
    /// Time from the first attempt until giving up.
    pub total_duration: Duration,
}

impl<E> RetryExhausted<E> {
    /// Record the outcome of a retry sequence that never succeeded.
    pub fn new(final_error: E, attempts: u32, class: ErrorClass, total_duration: Duration) -> Self {
        Self {
            final_error,
            attempts,
            class,
            total_duration,
        }
    }

    /// Extract the final error, discarding metadata.
    pub fn into_error(self) -> E {
        self.final_error
    }

    /// Get a reference to the final error.
    pub fn error(&self) -> &E {
        &self.final_error
    }

    /// Returns true if the operation was still being rate limited when it
    /// gave up.
    pub fn was_rate_limited(&self) -> bool {
        self.class == ErrorClass::RateLimited
    }
}

impl<E: fmt::Display> fmt::Display for RetryExhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gave up after {} attempts in {:?}, last failure {}: {}",
            self.attempts, self.total_duration, self.class, self.final_error
        )
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryExhausted<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.final_error)
    }
}

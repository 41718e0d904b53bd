//! Retry policy types and configuration.

use std::time::Duration;

use super::classify::ErrorClass;

/// A retry policy describing how to retry failed operations.
///
/// Policies are pure data - they describe retry behavior but don't execute it.
/// This makes them easy to test, clone, and inspect.
///
/// `max_retries` does not count the initial attempt: a policy with
/// `max_retries = 3` makes at most 4 attempts.
///
/// # Examples
///
/// ```rust
/// use tributary::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_retries(), 3);
/// assert_eq!(policy.base_delay(), Duration::from_millis(100));
///
/// let policy = RetryPolicy::new(5, Duration::from_millis(250));
/// assert_eq!(policy.max_retries(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase", default)
)]
pub struct RetryPolicy {
    max_retries: u32,
    #[cfg_attr(feature = "serde", serde(with = "crate::duration_ms"))]
    base_delay: Duration,
}

/// Decision returned by the retry policy for a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Stop retrying and surface the error.
    GiveUp,
    /// Retry after the given delay. A zero delay retries immediately.
    RetryAfter(Duration),
}

/// Information about a failed attempt, passed to hooks.
#[derive(Debug, Clone)]
pub struct RetryEvent<'a, E> {
    /// Which attempt just failed (0-indexed).
    pub attempt: u32,
    /// The error from the failed attempt.
    pub error: &'a E,
    /// How the error was classified.
    pub class: ErrorClass,
    /// Delay before next attempt, or `None` if this was the last one.
    pub next_delay: Option<Duration>,
    /// Total elapsed time since first attempt.
    pub elapsed: Duration,
}

impl<E> RetryEvent<'_, E> {
    /// Returns true if no further attempt follows this one.
    pub fn is_final(&self) -> bool {
        self.next_delay.is_none()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with explicit bounds.
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Set the maximum number of retry attempts.
    ///
    /// `with_max_retries(0)` means the operation runs exactly once.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tributary::RetryPolicy;
    ///
    /// let policy = RetryPolicy::default().with_max_retries(0);
    /// assert_eq!(policy.max_attempts(), 1);
    /// ```
    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Set the base delay used for rate-limit backoff.
    pub fn with_base_delay(mut self, d: Duration) -> Self {
        self.base_delay = d;
        self
    }

    /// Get the maximum number of retries.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Get the base backoff delay.
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Total attempts this policy allows (initial + retries).
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retrying after attempt N (0-indexed) failed with `class`.
    ///
    /// Rate-limited failures back off exponentially: `base * 2^attempt`.
    /// Every other class retries immediately.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tributary::{ErrorClass, RetryPolicy};
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::default();
    ///
    /// assert_eq!(policy.delay_for(0, ErrorClass::RateLimited), Duration::from_millis(100));
    /// assert_eq!(policy.delay_for(1, ErrorClass::RateLimited), Duration::from_millis(200));
    /// assert_eq!(policy.delay_for(2, ErrorClass::RateLimited), Duration::from_millis(400));
    /// assert_eq!(policy.delay_for(2, ErrorClass::Transient), Duration::ZERO);
    /// ```
    pub fn delay_for(&self, attempt: u32, class: ErrorClass) -> Duration {
        match class {
            ErrorClass::RateLimited => exponential(self.base_delay, attempt),
            ErrorClass::Transient | ErrorClass::Other => Duration::ZERO,
        }
    }

    /// Decide what to do after attempt N (0-indexed) failed with `class`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tributary::{ErrorClass, RetryDecision, RetryPolicy};
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::default().with_max_retries(2);
    ///
    /// assert_eq!(
    ///     policy.decide(1, ErrorClass::RateLimited),
    ///     RetryDecision::RetryAfter(Duration::from_millis(200))
    /// );
    /// assert_eq!(policy.decide(2, ErrorClass::RateLimited), RetryDecision::GiveUp);
    /// ```
    pub fn decide(&self, attempt: u32, class: ErrorClass) -> RetryDecision {
        if attempt >= self.max_retries {
            return RetryDecision::GiveUp;
        }
        RetryDecision::RetryAfter(self.delay_for(attempt, class))
    }
}

/// `base * 2^attempt`, saturating at `Duration::MAX`.
fn exponential(base: Duration, attempt: u32) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;

    let nanos = base.as_nanos();
    if nanos == 0 {
        return Duration::ZERO;
    }
    // The shift must not push any set bit out of the u128.
    if attempt >= nanos.leading_zeros() {
        return Duration::MAX;
    }
    let scaled = nanos << attempt;

    match u64::try_from(scaled / NANOS_PER_SEC) {
        Ok(secs) => Duration::new(secs, (scaled % NANOS_PER_SEC) as u32),
        Err(_) => Duration::MAX,
    }
}

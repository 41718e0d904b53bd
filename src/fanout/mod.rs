//! Parallel fan-out of independently retried operations.
//!
//! Every operation is wrapped in [`retry`](crate::retry::retry) and all
//! wrapped operations are polled together on the caller's task, so the
//! total latency approaches the slowest operation instead of the sum.
//!
//! - [`Fanout`] - builder over named operations of one type
//! - [`load_all`] - the same with the default policy, from an iterator
//! - [`load3`] - three operations with different output types
//!
//! The fan-out waits for every operation to settle. If any of them exhausts
//! its retries the whole fan-out fails with that operation's final error;
//! when several fail, the one registered first wins. Siblings are never
//! cancelled and their results are discarded.
//!
//! # Example
//!
//! ```rust
//! use tributary::fanout::Fanout;
//!
//! # tokio_test::block_on(async {
//! let fetch = |body: &'static str| move || async move { Ok::<_, String>(body) };
//!
//! let result = Fanout::new()
//!     .add("profile", fetch("user-1"))
//!     .add("orders", fetch("[]"))
//!     .run()
//!     .await
//!     .unwrap();
//!
//! assert!(result.success);
//! assert_eq!(result.get("profile"), Some(&"user-1"));
//! # });
//! ```
//!
//! Closures are distinct types, so mixing several of them in one `Fanout`
//! needs [`BoxedOperation`](crate::BoxedOperation):
//!
//! ```rust
//! use tributary::{load_all, OperationExt};
//!
//! # tokio_test::block_on(async {
//! let result = load_all(vec![
//!     ("profile", (|| async { Ok::<_, String>(1) }).boxed()),
//!     ("orders", (|| async { Ok::<_, String>(2) }).boxed()),
//! ])
//! .await
//! .unwrap();
//!
//! assert_eq!(result.get("orders"), Some(&2));
//! # });
//! ```

mod aggregate;

pub use aggregate::Aggregate;

use std::collections::HashMap;
use std::fmt;

use futures::future::join_all;
use tokio::time::Instant;

use crate::operation::Operation;
use crate::retry::{retry, RetryPolicy};

/// Slot name to value map produced by a successful [`Fanout`].
pub type SlotMap<T> = HashMap<String, T>;

/// A fixed set of named operations to run concurrently.
///
/// Each operation gets its own independent retry budget from the fan-out's
/// [`RetryPolicy`]. Names attribute results; if a name is used twice both
/// operations still run and the later slot's value is kept.
#[derive(Debug)]
pub struct Fanout<O> {
    slots: Vec<(String, O)>,
    policy: RetryPolicy,
}

impl<O> Default for Fanout<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> Fanout<O> {
    /// Create an empty fan-out using the default retry policy.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            policy: RetryPolicy::default(),
        }
    }

    /// Use a different retry policy for every operation.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Add a named operation.
    pub fn add(mut self, name: impl Into<String>, operation: O) -> Self {
        self.push(name, operation);
        self
    }

    /// Add a named operation in place.
    pub fn push(&mut self, name: impl Into<String>, operation: O) {
        self.slots.push((name.into(), operation));
    }

    /// Number of operations registered.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no operation is registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The policy each operation is retried with.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Slot names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|(name, _)| name.as_str())
    }
}

impl<O> Fanout<O>
where
    O: Operation,
    O::Error: fmt::Display,
{
    /// Run every operation concurrently and wait for all of them to settle.
    ///
    /// Returns the slot map when all succeed, otherwise the final error of
    /// the first registered operation that failed.
    pub async fn run(&self) -> Result<Aggregate<SlotMap<O::Output>>, O::Error> {
        let settle = self.settle();

        #[cfg(feature = "tracing")]
        let settle = tracing::Instrument::instrument(
            settle,
            tracing::debug_span!("fanout", slots = self.slots.len()),
        );

        settle.await
    }

    async fn settle(&self) -> Result<Aggregate<SlotMap<O::Output>>, O::Error> {
        let start = Instant::now();
        let policy = &self.policy;

        // join_all polls every future once before awaiting any of them, so
        // all first attempts start before any completion is observed.
        let results = join_all(self.slots.iter().map(|(_, op)| retry(op, policy))).await;

        let mut data = HashMap::with_capacity(self.slots.len());
        for ((name, _), result) in self.slots.iter().zip(results) {
            match result {
                Ok(value) => {
                    data.insert(name.clone(), value);
                }
                Err(error) => {
                    log_failure(name, &error);
                    return Err(error);
                }
            }
        }

        let elapsed = start.elapsed();
        #[cfg(feature = "tracing")]
        tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "fanout complete");

        Ok(Aggregate::new(data, elapsed))
    }
}

#[cfg(feature = "tracing")]
fn log_failure<E: fmt::Display>(slot: &str, error: &E) {
    tracing::warn!(slot, %error, "fanout failed");
}

#[cfg(not(feature = "tracing"))]
fn log_failure<E: fmt::Display>(_slot: &str, _error: &E) {}

impl<N, O> FromIterator<(N, O)> for Fanout<O>
where
    N: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, O)>>(iter: I) -> Self {
        let mut fanout = Fanout::new();
        fanout.extend(iter);
        fanout
    }
}

impl<N, O> Extend<(N, O)> for Fanout<O>
where
    N: Into<String>,
{
    fn extend<I: IntoIterator<Item = (N, O)>>(&mut self, iter: I) {
        for (name, op) in iter {
            self.push(name, op);
        }
    }
}

/// Run named operations concurrently with the default retry policy.
///
/// Shorthand for collecting into a [`Fanout`] and calling [`Fanout::run`].
pub async fn load_all<N, O, I>(operations: I) -> Result<Aggregate<SlotMap<O::Output>>, O::Error>
where
    I: IntoIterator<Item = (N, O)>,
    N: Into<String>,
    O: Operation,
    O::Error: fmt::Display,
{
    operations.into_iter().collect::<Fanout<O>>().run().await
}

/// Run three operations with different output types concurrently, using the
/// default retry policy.
///
/// # Example
///
/// ```rust
/// use tributary::load3;
///
/// # tokio_test::block_on(async {
/// let result = load3(
///     || async { Ok::<_, String>("user-1") },
///     || async { Ok::<_, String>(vec![101, 102]) },
///     || async { Ok::<_, String>(5u32) },
/// )
/// .await
/// .unwrap();
///
/// let (profile, orders, notifications) = result.data;
/// assert_eq!(profile, "user-1");
/// assert_eq!(orders, vec![101, 102]);
/// assert_eq!(notifications, 5);
/// # });
/// ```
pub async fn load3<A, B, C, E>(
    a: A,
    b: B,
    c: C,
) -> Result<Aggregate<(A::Output, B::Output, C::Output)>, E>
where
    A: Operation<Error = E>,
    B: Operation<Error = E>,
    C: Operation<Error = E>,
    E: fmt::Display + Send,
{
    load3_with_policy(a, b, c, &RetryPolicy::default()).await
}

/// [`load3`] with an explicit retry policy.
///
/// When more than one operation fails, the error of the earliest argument
/// is returned.
pub async fn load3_with_policy<A, B, C, E>(
    a: A,
    b: B,
    c: C,
    policy: &RetryPolicy,
) -> Result<Aggregate<(A::Output, B::Output, C::Output)>, E>
where
    A: Operation<Error = E>,
    B: Operation<Error = E>,
    C: Operation<Error = E>,
    E: fmt::Display + Send,
{
    let start = Instant::now();

    let (ra, rb, rc) = futures::join!(retry(&a, policy), retry(&b, policy), retry(&c, policy));

    let data = (ra?, rb?, rc?);
    Ok(Aggregate::new(data, start.elapsed()))
}

#[cfg(test)]
mod tests;

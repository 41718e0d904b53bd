//! # Tributary
//!
//! > *Many streams, one river.*
//!
//! Resilient parallel fetching for async Rust.
//!
//! Tributary fans out a handful of independent asynchronous operations, runs
//! them concurrently so the total latency is that of the slowest one, and
//! retries each of them on its own according to what went wrong:
//!
//! - **Rate limited** (`429`): back off exponentially, 100ms, 200ms, 400ms, ...
//! - **Anything else**: retry immediately
//! - **Out of attempts**: surface the error from the last attempt
//!
//! ## Quick Example
//!
//! ```rust
//! use tributary::{load_all, OperationExt};
//!
//! # tokio_test::block_on(async {
//! let dashboard = load_all(vec![
//!     ("profile", (|| async { Ok::<_, String>("Ada") }).boxed()),
//!     ("orders", (|| async { Ok::<_, String>("3 open") }).boxed()),
//!     ("notifications", (|| async { Ok::<_, String>("none") }).boxed()),
//! ])
//! .await;
//!
//! match dashboard {
//!     Ok(result) => {
//!         println!("loaded {} slots in {:?}", result.data.len(), result.time_taken);
//!     }
//!     Err(error) => {
//!         println!("dashboard failed: {}", error);
//!     }
//! }
//! # });
//! ```
//!
//! ## Modules
//!
//! - [`operation`]: the re-invocable [`Operation`] abstraction
//! - [`retry`]: classified retry with backoff for one operation
//! - [`fanout`]: concurrent aggregation of retried operations

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

#[cfg(feature = "serde")]
mod duration_ms;
pub mod fanout;
pub mod operation;
pub mod retry;

// Re-exports
pub use fanout::{load3, load3_with_policy, load_all, Aggregate, Fanout, SlotMap};
pub use operation::{BoxFuture, BoxedOperation, Operation, OperationExt};
pub use retry::{
    classify_message, retry, retry_detailed, retry_with_classifier, retry_with_hooks, ErrorClass,
    RetryDecision, RetryEvent, RetryExhausted, RetryPolicy,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fanout::{load3, load_all, Aggregate, Fanout};
    pub use crate::operation::{BoxedOperation, Operation, OperationExt};
    pub use crate::retry::{retry, ErrorClass, RetryExhausted, RetryPolicy};
}

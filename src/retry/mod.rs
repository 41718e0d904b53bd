//! Classified retry with backoff for a single operation.
//!
//! The retry decision is split into pure data and a thin executor:
//!
//! - **Pure core**: [`RetryPolicy`] and [`classify_message`] describe *what*
//!   should happen after a failure, with no side effects.
//! - **Executor**: [`retry`] and friends invoke the operation, sleep when the
//!   policy asks for it, and surface the last error once attempts run out.
//!
//! # Quick Start
//!
//! ```rust
//! use tributary::{retry, RetryPolicy};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let policy = RetryPolicy::default()
//!     .with_max_retries(3)
//!     .with_base_delay(Duration::from_millis(100));
//!
//! let fetch = || async { Ok::<_, String>(42) };
//!
//! assert_eq!(retry(&fetch, &policy).await, Ok(42));
//! # });
//! ```
//!
//! # Error Classes
//!
//! - **Rate limited** (message contains `"429"`): wait `base * 2^attempt`,
//!   so 100ms, 200ms, 400ms, ... with the default policy
//! - **Transient** (anything else): retry immediately
//!
//! # Error Types
//!
//! - [`RetryExhausted`]: returned by [`retry_detailed`] when all attempts fail,
//!   contains the final error and metadata

mod classify;
mod error;
mod executor;
mod policy;

pub use classify::{classify_message, ErrorClass, RATE_LIMIT_TOKEN};
pub use error::RetryExhausted;
pub use executor::{retry, retry_detailed, retry_with_classifier, retry_with_hooks};
pub use policy::{RetryDecision, RetryEvent, RetryPolicy};

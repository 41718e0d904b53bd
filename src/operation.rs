//! The operation abstraction - a re-invocable unit of asynchronous work.
//!
//! An [`Operation`] is anything that can be called with no arguments and
//! produces a future resolving to `Result<Output, Error>`. Unlike a future,
//! an operation can be called again, which is exactly what a retry needs:
//! every attempt starts the work from scratch.
//!
//! Closures implement the trait directly:
//!
//! ```rust
//! use tributary::Operation;
//!
//! # tokio_test::block_on(async {
//! let fetch = || async { Ok::<_, String>(42) };
//!
//! assert_eq!(fetch.run().await, Ok(42));
//! assert_eq!(fetch.run().await, Ok(42));
//! # });
//! ```
//!
//! Use [`BoxedOperation`] when differently-typed closures have to live in the
//! same collection, for example when fanning out over several endpoints.

use std::future::Future;
use std::pin::Pin;

/// A boxed future that is Send.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A zero-argument asynchronous operation that may be invoked repeatedly.
///
/// # Type Parameters
///
/// * `Output` - The value produced on success
/// * `Error` - The error produced on failure
pub trait Operation: Send + Sync {
    /// The success type produced by this operation.
    type Output: Send;

    /// The error type that may be produced.
    type Error: Send;

    /// Start one invocation of the operation.
    fn run(&self) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;
}

impl<F, Fut, T, E> Operation for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send,
    T: Send,
    E: Send,
{
    type Output = T;
    type Error = E;

    fn run(&self) -> impl Future<Output = Result<T, E>> + Send {
        self()
    }
}

/// A type-erased operation.
///
/// Every run produces a fresh boxed future, so boxing costs one allocation
/// per attempt.
///
/// # Example
///
/// ```rust
/// use tributary::{BoxedOperation, Operation, OperationExt};
///
/// # tokio_test::block_on(async {
/// let ops: Vec<BoxedOperation<i32, String>> = vec![
///     (|| async { Ok(1) }).boxed(),
///     (|| async { Err("down".to_string()) }).boxed(),
/// ];
///
/// assert_eq!(ops[0].run().await, Ok(1));
/// assert_eq!(ops[1].run().await, Err("down".to_string()));
/// # });
/// ```
pub struct BoxedOperation<T, E> {
    run_fn: Box<dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync>,
}

impl<T, E> std::fmt::Debug for BoxedOperation<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxedOperation")
            .field("run_fn", &"<function>")
            .finish()
    }
}

impl<T, E> BoxedOperation<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Box a closure whose future is `'static`.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        BoxedOperation {
            run_fn: Box::new(move || Box::pin(f())),
        }
    }
}

impl<T, E> Operation for BoxedOperation<T, E>
where
    T: Send,
    E: Send,
{
    type Output = T;
    type Error = E;

    fn run(&self) -> impl Future<Output = Result<T, E>> + Send {
        (self.run_fn)()
    }
}

/// Extension methods for closure-based operations.
pub trait OperationExt<T, E>: Sized {
    /// Erase the concrete type of this operation.
    fn boxed(self) -> BoxedOperation<T, E>;
}

impl<F, Fut, T, E> OperationExt<T, E> for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    fn boxed(self) -> BoxedOperation<T, E> {
        BoxedOperation::new(self)
    }
}

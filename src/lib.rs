//! Forward the outcome of one completed future to many promises.
//!
//! A [`PromiseNotifier`] is registered as a [`CompletionListener`] on a source
//! future. When the source finishes, the notifier reads its outcome once and
//! completes every target promise with it, in the order the targets were
//! given.
//!
//! # Examples
//!
//! ```
//! use promise_notifier::{poly::Producer, PromiseNotifier};
//! use futures::executor::block_on;
//!
//! let (source, _) = Producer::<i32>::new();
//! let (a, a_out) = Producer::<i32>::new();
//! let (b, b_out) = Producer::<i32>::new();
//!
//! source.add_listener(PromiseNotifier::new(&[a, b]));
//! source.resolve(42);
//!
//! assert_eq!(block_on(a_out).unwrap(), 42);
//! assert_eq!(block_on(b_out).unwrap(), 42);
//! ```
use std::sync::Arc;

pub mod notifier;
pub mod poly;

pub use notifier::PromiseNotifier;

/// Reason a future finished without a value.
pub type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("promise already completed")]
    AlreadyCompleted,
    #[error("future is not completed yet")]
    Incomplete,
    #[error("future failed: {0}")]
    Failed(Cause),
    #[error("promise was cancelled")]
    Cancelled,
}

impl Error {
    /// Wrap this error so it can be handed to [`Promise::fail`].
    pub fn into_cause(self) -> Cause {
        Arc::new(self)
    }
}

/// Read side of a completed computation.
pub trait SourceFuture<V> {
    /// Whether the future reached a terminal state.
    fn is_done(&self) -> bool;

    /// Whether the future completed with a value.
    fn is_success(&self) -> bool;

    /// The value of a successful future.
    ///
    /// Returns [`Error::Failed`] if the future failed and
    /// [`Error::Incomplete`] if it has not finished.
    fn get(&self) -> Result<V>;

    /// The failure cause, or `None` if the future succeeded or is still
    /// running.
    fn cause(&self) -> Option<Cause>;
}

/// Write side of a computation: a handle that can be driven to a terminal
/// state exactly once.
pub trait Promise<V> {
    /// Complete with `value`, or [`Error::AlreadyCompleted`] if the promise is
    /// terminal.
    fn succeed(&self, value: V) -> Result<()>;

    /// Complete with `cause`, or [`Error::AlreadyCompleted`] if the promise is
    /// terminal.
    fn fail(&self, cause: Cause) -> Result<()>;

    /// Complete with `value` unless already terminal. Returns `false` when the
    /// promise was left untouched.
    fn try_succeed(&self, value: V) -> bool;

    /// Complete with `cause` unless already terminal. Returns `false` when the
    /// promise was left untouched.
    fn try_fail(&self, cause: Cause) -> bool;
}

/// Callback run once a future of type `F` reaches a terminal state.
pub trait CompletionListener<F: ?Sized> {
    fn on_complete(&self, future: &F) -> Result<()>;
}

macro_rules! forward_promise {
    ($($ptr:ty),*) => {$(
        impl<V, P: Promise<V> + ?Sized> Promise<V> for $ptr {
            fn succeed(&self, value: V) -> Result<()> {
                (**self).succeed(value)
            }
            fn fail(&self, cause: Cause) -> Result<()> {
                (**self).fail(cause)
            }
            fn try_succeed(&self, value: V) -> bool {
                (**self).try_succeed(value)
            }
            fn try_fail(&self, cause: Cause) -> bool {
                (**self).try_fail(cause)
            }
        }
    )*};
}

forward_promise!(&P, Arc<P>, Box<P>);

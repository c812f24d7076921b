use crate::{Cause, CompletionListener, Error, Promise, Result, SourceFuture};
use parking_lot::Mutex;
use std::fmt::{self, Debug};
use std::sync::Arc;
use std::{future::Future, task::{Poll, Waker}};
use tracing::{trace, warn};

/// This `poly::Producer` promise can have many consumers and many listeners.
/// The producer itself may be cloned, so several parties can race to complete
/// it; only the first completion sticks. The consumers return a
/// `Result<T, Cause>`.
///
/// # Examples
///
/// ```
/// use promise_notifier::poly::Producer;
/// use futures::executor::block_on;
/// use std::thread;
/// let (promise, consumer) = Producer::<String>::new();
/// let consumer2 = consumer.clone();
/// let task1 = thread::spawn(move || block_on(async {
///     println!("Received on task 1 {:?}",  consumer.await);
/// }));
/// let task2 = thread::spawn(move || block_on(async {
///     println!("Received on task 2 {:?}",  consumer2.await);
/// }));
/// promise.resolve("Hi".into());
/// task1.join().expect("The task1 thread has panicked.");
/// task2.join().expect("The task2 thread has panicked.");
/// ```
pub struct Producer<T> {
    promise: Arc<Mutex<Inner<T>>>,
}

pub struct Consumer<T> {
    promise: Arc<Mutex<Inner<T>>>,
}

type Outcome<T> = std::result::Result<T, Cause>;

type Listener<T> = Box<dyn CompletionListener<Producer<T>> + Send + Sync>;

struct Inner<T> {
    value: Option<Outcome<T>>,
    waker: Vec<Waker>,
    listeners: Vec<Listener<T>>,
}

impl<T> Producer<T> {
    /// promise.new
    ///
    /// Returns the write handle together with a first [`Consumer`]; more can
    /// be made with [`Producer::consumer`] or by cloning.
    pub fn new() -> (Self, Consumer<T>) {
        let producer = Self {
            promise: Arc::new(Mutex::new(Inner {
                value: None,
                waker: vec![],
                listeners: vec![],
            })),
        };
        let consumer = producer.consumer();
        (producer, consumer)
    }

    pub fn consumer(&self) -> Consumer<T> {
        Consumer {
            promise: self.promise.clone(),
        }
    }

    ///promiseOut.resolve
    ///
    /// Best-effort: returns `false` if the promise was already completed.
    pub fn resolve(&self, value: T) -> bool {
        self.complete(Ok(value))
    }

    ///promiseOut.reject
    ///
    /// Best-effort: returns `false` if the promise was already completed.
    pub fn reject(&self, cause: Cause) -> bool {
        self.complete(Err(cause))
    }

    /// Fail the promise with [`Error::Cancelled`] unless it already finished.
    pub fn cancel(&self) -> bool {
        self.complete(Err(Error::Cancelled.into_cause()))
    }

    pub fn is_cancelled(&self) -> bool {
        match &self.promise.lock().value {
            Some(Err(cause)) => matches!(cause.downcast_ref::<Error>(), Some(Error::Cancelled)),
            _ => false,
        }
    }

    /// Run `listener` once this promise is completed.
    ///
    /// A listener added after completion runs right away on the calling
    /// thread. Otherwise it runs on the thread that completes the promise,
    /// after every listener registered before it.
    pub fn add_listener<L>(&self, listener: L)
    where
        L: CompletionListener<Self> + Send + Sync + 'static,
    {
        {
            let mut promise = self.promise.lock();
            if promise.value.is_none() {
                promise.listeners.push(Box::new(listener));
                return;
            }
        }
        self.notify_listeners(vec![Box::new(listener)]);
    }

    fn complete(&self, outcome: Outcome<T>) -> bool {
        let success = outcome.is_ok();
        let (wakers, listeners) = {
            let mut promise = self.promise.lock();
            if promise.value.is_some() {
                trace!(success, "promise already completed");
                return false;
            }
            promise.value = Some(outcome);
            (
                std::mem::take(&mut promise.waker),
                std::mem::take(&mut promise.listeners),
            )
        };
        trace!(
            success,
            wakers = wakers.len(),
            listeners = listeners.len(),
            "promise completed"
        );
        for waker in wakers {
            waker.wake()
        }
        self.notify_listeners(listeners);
        true
    }

    fn notify_listeners(&self, listeners: Vec<Listener<T>>) {
        for listener in listeners {
            if let Err(err) = listener.on_complete(self) {
                warn!(error = %err, "completion listener failed");
            }
        }
    }
}

impl<T> Promise<T> for Producer<T> {
    fn succeed(&self, value: T) -> Result<()> {
        if self.complete(Ok(value)) {
            Ok(())
        } else {
            Err(Error::AlreadyCompleted)
        }
    }

    fn fail(&self, cause: Cause) -> Result<()> {
        if self.complete(Err(cause)) {
            Ok(())
        } else {
            Err(Error::AlreadyCompleted)
        }
    }

    fn try_succeed(&self, value: T) -> bool {
        self.complete(Ok(value))
    }

    fn try_fail(&self, cause: Cause) -> bool {
        self.complete(Err(cause))
    }
}

impl<T: Clone> SourceFuture<T> for Producer<T> {
    fn is_done(&self) -> bool {
        self.promise.lock().value.is_some()
    }

    fn is_success(&self) -> bool {
        matches!(self.promise.lock().value, Some(Ok(_)))
    }

    fn get(&self) -> Result<T> {
        match &self.promise.lock().value {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(cause)) => Err(Error::Failed(cause.clone())),
            None => Err(Error::Incomplete),
        }
    }

    fn cause(&self) -> Option<Cause> {
        match &self.promise.lock().value {
            Some(Err(cause)) => Some(cause.clone()),
            _ => None,
        }
    }
}

impl<T> Clone for Producer<T> {
    fn clone(&self) -> Self {
        Self {
            promise: self.promise.clone(),
        }
    }
}

impl<T> Clone for Consumer<T> {
    fn clone(&self) -> Self {
        Self {
            promise: self.promise.clone(),
        }
    }
}

impl<T: Debug> Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let promise = self.promise.lock();
        f.debug_struct("Producer")
            .field("value", &promise.value)
            .field("listeners", &promise.listeners.len())
            .finish()
    }
}

impl<T: Clone> Future for Consumer<T> {
    type Output = Outcome<T>;

    fn poll(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Self::Output> {
        let mut promise = self.promise.lock();
        if let Some(value) = &promise.value {
            return Poll::Ready(value.clone());
        }
        promise.waker.push(cx.waker().clone());
        Poll::Pending
    }
}

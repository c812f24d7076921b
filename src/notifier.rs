//! A [`CompletionListener`] that hands the outcome of the future it listens
//! to on to a fixed list of promises.
use crate::{Cause, CompletionListener, Error, Promise, Result, SourceFuture};
use std::fmt;
use std::marker::PhantomData;

/// Completes a list of promises with the outcome of a source future.
///
/// The list is copied at construction and never changes afterwards. On
/// [`on_complete`](CompletionListener::on_complete) every promise receives
/// either the source's value or its cause, strictly in the order given.
///
/// With `try_notify` set the promises are completed through
/// [`Promise::try_succeed`] and [`Promise::try_fail`], so a promise that is
/// already terminal is skipped. Otherwise [`Promise::succeed`] and
/// [`Promise::fail`] are used and the first [`Error::AlreadyCompleted`] stops
/// the loop: earlier promises stay completed, later ones are not touched.
///
/// # Examples
///
/// ```
/// use promise_notifier::{poly::Producer, CompletionListener, Promise, PromiseNotifier, SourceFuture};
///
/// let (source, _) = Producer::<&str>::new();
/// let (first, _) = Producer::<&str>::new();
/// let (second, _) = Producer::<&str>::new();
/// second.succeed("early").unwrap();
///
/// let notifier = PromiseNotifier::with_try_notify(true, &[first.clone(), second.clone()]);
/// source.succeed("late").unwrap();
/// notifier.on_complete(&source).unwrap();
///
/// assert_eq!(first.get().unwrap(), "late");
/// assert_eq!(second.get().unwrap(), "early");
/// ```
pub struct PromiseNotifier<V, P> {
    promises: Box<[P]>,
    try_notify: bool,
    _value: PhantomData<fn(V)>,
}

impl<V, P> PromiseNotifier<V, P>
where
    P: Promise<V> + Clone,
{
    /// Notifier that completes `promises` unconditionally.
    pub fn new(promises: &[P]) -> Self {
        Self::with_try_notify(false, promises)
    }

    /// Notifier that completes `promises` with the `try_*` operations when
    /// `try_notify` is set, and unconditionally otherwise.
    pub fn with_try_notify(try_notify: bool, promises: &[P]) -> Self {
        Self {
            promises: promises.into(),
            try_notify,
            _value: PhantomData,
        }
    }

    /// Build a notifier from input that may have holes in it.
    ///
    /// Fails with [`Error::InvalidArgument`] if `promises` is `None` or if any
    /// of its slots is empty.
    ///
    /// ```
    /// use promise_notifier::{poly::Producer, Error, PromiseNotifier};
    ///
    /// let (p, _) = Producer::<u8>::new();
    /// let res = PromiseNotifier::from_slots(false, Some(&[Some(p), None][..]));
    /// assert!(matches!(res, Err(Error::InvalidArgument(_))));
    /// ```
    pub fn from_slots(try_notify: bool, promises: Option<&[Option<P>]>) -> Result<Self> {
        let promises = promises.ok_or(Error::InvalidArgument("promises"))?;
        let promises = promises
            .iter()
            .map(|slot| {
                slot.clone()
                    .ok_or(Error::InvalidArgument("promises contains null Promise"))
            })
            .collect::<Result<Box<[P]>>>()?;
        Ok(Self {
            promises,
            try_notify,
            _value: PhantomData,
        })
    }
}

impl<V, P> PromiseNotifier<V, P> {
    pub fn promises(&self) -> &[P] {
        &self.promises
    }

    pub fn is_try_notify(&self) -> bool {
        self.try_notify
    }
}

impl<V, P> PromiseNotifier<V, P>
where
    V: Clone,
    P: Promise<V>,
{
    fn notify_success(&self, value: V) -> Result<()> {
        for promise in self.promises.iter() {
            if self.try_notify {
                promise.try_succeed(value.clone());
            } else {
                promise.succeed(value.clone())?;
            }
        }
        Ok(())
    }

    fn notify_failure(&self, cause: Cause) -> Result<()> {
        for promise in self.promises.iter() {
            if self.try_notify {
                promise.try_fail(cause.clone());
            } else {
                promise.fail(cause.clone())?;
            }
        }
        Ok(())
    }
}

impl<V, P, F> CompletionListener<F> for PromiseNotifier<V, P>
where
    V: Clone,
    P: Promise<V>,
    F: SourceFuture<V> + ?Sized,
{
    fn on_complete(&self, future: &F) -> Result<()> {
        if future.is_success() {
            let value = future.get()?;
            return self.notify_success(value);
        }
        // A terminal future that is not successful always carries a cause.
        let cause = future.cause().ok_or(Error::Incomplete)?;
        self.notify_failure(cause)
    }
}

impl<V, P> Clone for PromiseNotifier<V, P>
where
    P: Clone,
{
    fn clone(&self) -> Self {
        Self {
            promises: self.promises.clone(),
            try_notify: self.try_notify,
            _value: PhantomData,
        }
    }
}

impl<V, P: fmt::Debug> fmt::Debug for PromiseNotifier<V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromiseNotifier")
            .field("promises", &self.promises)
            .field("try_notify", &self.try_notify)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::PromiseNotifier;
    use crate::{Cause, CompletionListener, Error, Promise, Result, SourceFuture};
    use std::cell::RefCell;
    use std::sync::Arc;

    /// Records every call made on it.
    #[derive(Default)]
    struct Recorder {
        completed: RefCell<bool>,
        calls: RefCell<Vec<&'static str>>,
    }

    impl Recorder {
        fn complete(&self, call: &'static str) -> bool {
            self.calls.borrow_mut().push(call);
            !self.completed.replace(true)
        }
    }

    impl Promise<u32> for Recorder {
        fn succeed(&self, _value: u32) -> Result<()> {
            self.complete("succeed")
                .then_some(())
                .ok_or(Error::AlreadyCompleted)
        }
        fn fail(&self, _cause: Cause) -> Result<()> {
            self.complete("fail").then_some(()).ok_or(Error::AlreadyCompleted)
        }
        fn try_succeed(&self, _value: u32) -> bool {
            self.complete("try_succeed")
        }
        fn try_fail(&self, _cause: Cause) -> bool {
            self.complete("try_fail")
        }
    }

    /// A source whose value cannot be read.
    struct Broken;

    impl SourceFuture<u32> for Broken {
        fn is_done(&self) -> bool {
            true
        }
        fn is_success(&self) -> bool {
            true
        }
        fn get(&self) -> Result<u32> {
            Err(Error::Incomplete)
        }
        fn cause(&self) -> Option<Cause> {
            None
        }
    }

    struct Done(std::result::Result<u32, Cause>);

    impl SourceFuture<u32> for Done {
        fn is_done(&self) -> bool {
            true
        }
        fn is_success(&self) -> bool {
            self.0.is_ok()
        }
        fn get(&self) -> Result<u32> {
            self.0.clone().map_err(Error::Failed)
        }
        fn cause(&self) -> Option<Cause> {
            self.0.clone().err()
        }
    }

    fn calls(recorders: &[Arc<Recorder>]) -> Vec<Vec<&'static str>> {
        recorders.iter().map(|r| r.calls.borrow().clone()).collect()
    }

    #[test]
    fn test_unconditional_uses_succeed() {
        let targets = [Arc::new(Recorder::default()), Arc::new(Recorder::default())];
        let notifier = PromiseNotifier::new(&targets);
        notifier.on_complete(&Done(Ok(1))).unwrap();
        assert_eq!(calls(&targets), vec![vec!["succeed"], vec!["succeed"]]);
    }

    #[test]
    fn test_try_mode_uses_try_fail() {
        let targets = [Arc::new(Recorder::default()), Arc::new(Recorder::default())];
        let notifier = PromiseNotifier::with_try_notify(true, &targets);
        notifier
            .on_complete(&Done(Err(Error::Cancelled.into_cause())))
            .unwrap();
        assert_eq!(calls(&targets), vec![vec!["try_fail"], vec!["try_fail"]]);
    }

    #[test]
    fn test_try_mode_ignores_false() {
        let targets = [Arc::new(Recorder::default()), Arc::new(Recorder::default())];
        targets[0].completed.replace(true);
        let notifier = PromiseNotifier::with_try_notify(true, &targets);
        notifier.on_complete(&Done(Ok(3))).unwrap();
        assert_eq!(calls(&targets), vec![vec!["try_succeed"], vec!["try_succeed"]]);
    }

    #[test]
    fn test_unconditional_stops_at_first_error() {
        let targets = [
            Arc::new(Recorder::default()),
            Arc::new(Recorder::default()),
            Arc::new(Recorder::default()),
        ];
        targets[1].completed.replace(true);
        let notifier = PromiseNotifier::new(&targets);
        let err = notifier.on_complete(&Done(Ok(3))).unwrap_err();
        assert!(matches!(err, Error::AlreadyCompleted));
        assert_eq!(
            calls(&targets),
            vec![vec!["succeed"], vec!["succeed"], Vec::<&str>::new()]
        );
    }

    #[test]
    fn test_value_retrieval_error_surfaces() {
        let targets = [Arc::new(Recorder::default())];
        let notifier = PromiseNotifier::with_try_notify(true, &targets);
        let err = notifier.on_complete(&Broken).unwrap_err();
        assert!(matches!(err, Error::Incomplete));
        assert!(targets[0].calls.borrow().is_empty());
    }

    #[test]
    fn test_copy_is_defensive() {
        let mut targets = vec![Arc::new(Recorder::default())];
        let notifier = PromiseNotifier::new(&targets);
        targets.push(Arc::new(Recorder::default()));
        targets.swap(0, 1);
        assert_eq!(notifier.promises().len(), 1);
        assert!(Arc::ptr_eq(&notifier.promises()[0], &targets[1]));
    }

    #[test]
    fn test_from_slots() {
        let ok = PromiseNotifier::<u32, _>::from_slots(
            true,
            Some(&[Some(Arc::new(Recorder::default()))][..]),
        )
        .unwrap();
        assert!(ok.is_try_notify());
        assert_eq!(ok.promises().len(), 1);

        let missing = PromiseNotifier::<u32, Arc<Recorder>>::from_slots(false, None);
        assert!(matches!(missing, Err(Error::InvalidArgument("promises"))));

        let hole = PromiseNotifier::<u32, _>::from_slots(
            false,
            Some(&[Some(Arc::new(Recorder::default())), None][..]),
        );
        assert!(matches!(
            hole,
            Err(Error::InvalidArgument("promises contains null Promise"))
        ));
    }
}

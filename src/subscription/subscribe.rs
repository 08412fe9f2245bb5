use std::{
    error::Error,
    sync::Arc,
};

use tokio::task::{JoinError, JoinHandle};

use crate::observer::Observer;

/// A trait for types that can be subscribed to, allowing consumers to receive
/// values pushed by a stream.
pub trait Subscribeable {
    /// The type of items the stream emits.
    type ObsType;

    /// Subscribes to the stream and specifies how emitted values are handled.
    ///
    /// The `Subscriber` parameter carries the `next`, `error` and `complete`
    /// callbacks for this subscription. The returned `Subscription` manages
    /// the subscription's lifetime: dropping values stops only when it is
    /// unsubscribed or the source completes.
    fn subscribe(&mut self, s: Subscriber<Self::ObsType>) -> Subscription;
}

/// A trait for types that can be unsubscribed, releasing the resources a
/// subscription holds.
pub trait Unsubscribeable {
    /// Unsubscribes and releases associated resources, such as cancelling a
    /// timer task the producer spawned.
    ///
    /// The instance is consumed, making it unusable after the call, which is
    /// also what makes repeated unsubscribing unrepresentable.
    fn unsubscribe(self);
}

type NextFn<T> = Box<dyn FnMut(T) + Send>;
type CompleteFn = Box<dyn FnMut() + Send + Sync>;
type ErrorFn = Box<dyn FnMut(Arc<dyn Error + Send + Sync>) + Send + Sync>;

/// The concrete observer handed to producers and subjects: user callbacks for
/// `next`, `error` and `complete`, with exactly-once delivery of the terminal
/// signals.
///
/// A subscriber without an error callback swallows errors silently; there is
/// no default error sink. Register one with [`Subscriber::on_error`] (or use
/// [`Subscriber::new`]) wherever an error is meaningful.
///
/// After an error is delivered the subscriber is spent: further `next`,
/// `complete` and `error` calls on it are ignored. A delivered `complete`
/// only blocks further `complete` calls: a subscription that stays active
/// past a forwarded completion (a merged stream whose first source finished,
/// for example) keeps receiving values.
pub struct Subscriber<NextFnType> {
    next_fn: NextFn<NextFnType>,
    complete_fn: Option<CompleteFn>,
    error_fn: Option<ErrorFn>,
    completed: bool,
    errored: bool,
}

impl<NextFnType> Subscriber<NextFnType> {
    /// Creates a `Subscriber` with handlers for all three signals.
    pub fn new(
        next_fn: impl FnMut(NextFnType) + 'static + Send,
        error_fn: impl FnMut(Arc<dyn Error + Send + Sync>) + 'static + Send + Sync,
        complete_fn: impl FnMut() + 'static + Send + Sync,
    ) -> Self {
        Subscriber {
            next_fn: Box::new(next_fn),
            complete_fn: Some(Box::new(complete_fn)),
            error_fn: Some(Box::new(error_fn)),
            completed: false,
            errored: false,
        }
    }

    /// Creates a `Subscriber` with only a `next` handler.
    pub fn on_next(next_fn: impl FnMut(NextFnType) + 'static + Send) -> Self {
        Subscriber {
            next_fn: Box::new(next_fn),
            complete_fn: None,
            error_fn: None,
            completed: false,
            errored: false,
        }
    }

    /// Sets the completion handler, called once when the stream completes or
    /// this subscription is unsubscribed.
    pub fn on_complete(&mut self, complete_fn: impl FnMut() + 'static + Send + Sync) {
        self.complete_fn = Some(Box::new(complete_fn));
    }

    /// Sets the error handler, called at most once with the error the stream
    /// produced.
    pub fn on_error(
        &mut self,
        error_fn: impl FnMut(Arc<dyn Error + Send + Sync>) + 'static + Send + Sync,
    ) {
        self.error_fn = Some(Box::new(error_fn));
    }
}

impl<T> Observer for Subscriber<T> {
    type NextFnType = T;

    fn next(&mut self, v: Self::NextFnType) {
        if self.errored {
            return;
        }
        (self.next_fn)(v);
    }

    fn complete(&mut self) {
        if self.errored || self.completed {
            return;
        }
        self.completed = true;
        if let Some(cfn) = &mut self.complete_fn {
            (cfn)();
        }
    }

    fn error(&mut self, e: Arc<dyn Error + Send + Sync>) {
        if self.errored {
            return;
        }
        self.errored = true;
        if let Some(efn) = &mut self.error_fn {
            (efn)(e);
        }
    }
}

/// Handle used by a `Subscription` to await the producer task, if the source
/// spawned one.
pub enum SubscriptionHandle {
    /// No task to await.
    Nil,

    /// Join handle of the tokio task driving an asynchronous source, such as
    /// a timer.
    JoinTask(JoinHandle<()>),
}

/// Represents one subscription to a stream, owning its teardown.
///
/// Unsubscribing runs the teardown, which for the stream types of this crate
/// fires the subscription's own `complete` callback, deactivates the
/// subscription and releases whatever the producer captured, exactly once,
/// whichever of unsubscribe and source completion comes first.
pub struct Subscription {
    pub(crate) unsubscribe_logic: UnsubscribeLogic,
    pub(crate) subscription_future: SubscriptionHandle,
}

impl Subscription {
    /// Creates a `Subscription` from teardown logic and an optional producer
    /// task handle.
    #[must_use]
    pub fn new(
        unsubscribe_logic: UnsubscribeLogic,
        subscription_future: SubscriptionHandle,
    ) -> Self {
        Subscription {
            unsubscribe_logic,
            subscription_future,
        }
    }

    /// Awaits the completion of the producer task associated with this
    /// subscription, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the awaited task panicked or was cancelled.
    pub async fn join(self) -> Result<(), JoinError> {
        match self.subscription_future {
            SubscriptionHandle::JoinTask(task_handle) => task_handle.await,
            SubscriptionHandle::Nil => Ok(()),
        }
    }
}

impl Unsubscribeable for Subscription {
    fn unsubscribe(self) {
        self.unsubscribe_logic.unsubscribe();
    }
}

/// Teardown carried by a [`Subscription`].
pub enum UnsubscribeLogic {
    /// Nothing to release.
    Nil,

    /// Teardown defined by a function.
    Logic(Box<dyn FnOnce() + Send>),
}

impl UnsubscribeLogic {
    fn unsubscribe(self) {
        match self {
            UnsubscribeLogic::Nil => (),
            UnsubscribeLogic::Logic(fnc) => fnc(),
        }
    }
}

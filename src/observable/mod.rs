//! The push-based stream engine: cold observables built from producer
//! functions, with per-subscription gating, completion tracking and
//! exactly-once teardown.

use std::sync::{Arc, Mutex};

use crate::atom::Atom;
use crate::observer::Observer;
use crate::subscription::subscribe::{
    Subscribeable, Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic, Unsubscribeable,
};

type ProducerFn<T> = Box<dyn FnMut(Subscriber<T>) -> Subscription + Send + Sync>;

/// A cold, push-based stream of values.
///
/// An `Observable` wraps a producer function. Every [`subscribe`] call runs
/// the producer once with a fresh observer, so each subscription gets its own
/// private run of the producer, and values are not shared between
/// subscriptions.
/// The producer returns a [`Subscription`] carrying whatever teardown it
/// needs (cancelling a spawned task, releasing an upstream subscription), and
/// the engine guarantees that teardown runs at most once, on unsubscribe or
/// on completion of this observable, whichever comes first.
///
/// The observable owns a completion flag. Once [`complete`](Observable::complete)
/// has been called, every value any producer pushes is dropped before it
/// reaches a subscriber: subscribing to a completed observable still runs the
/// producer, but the subscription stays silent.
///
/// Cloning an `Observable` clones the handle, not the stream: all clones
/// share the producer and the completion state.
///
/// # Example
///
/// ```
/// use coals::subscribe::{Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic};
/// use coals::{Observable, Observer, Subscribeable};
///
/// // Emits the first three squares, then completes.
/// let mut squares = Observable::new(|mut observer: Subscriber<u32>| {
///     for i in 1..=3 {
///         observer.next(i * i);
///     }
///     observer.complete();
///
///     // Nothing to release and no task to await.
///     Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
/// });
///
/// let observer = Subscriber::new(
///     |v| println!("emitted {}", v),
///     |e| eprintln!("error: {}", e),
///     || println!("done"),
/// );
///
/// squares.subscribe(observer);
/// ```
///
/// [`subscribe`]: Subscribeable::subscribe
pub struct Observable<T> {
    producer: Arc<Mutex<ProducerFn<T>>>,
    completed: Atom<bool>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Observable {
            producer: Arc::clone(&self.producer),
            completed: self.completed.clone(),
        }
    }
}

impl<T: 'static> Observable<T> {
    /// Creates an observable from a producer function.
    ///
    /// The producer receives the subscription's observer and returns the
    /// teardown for whatever it started, or an inert subscription
    /// (`UnsubscribeLogic::Nil`) when there is nothing to release. A producer
    /// that fails during setup reports the failure through
    /// `observer.error(..)` and returns an inert subscription.
    pub fn new(
        producer: impl FnMut(Subscriber<T>) -> Subscription + Send + Sync + 'static,
    ) -> Observable<T> {
        Observable::with_completion(Atom::new(false), producer)
    }

    /// Builds an observable around an externally held completion cell, so a
    /// producer can complete the observable it belongs to.
    pub(crate) fn with_completion(
        completed: Atom<bool>,
        producer: impl FnMut(Subscriber<T>) -> Subscription + Send + Sync + 'static,
    ) -> Observable<T> {
        Observable {
            producer: Arc::new(Mutex::new(Box::new(producer))),
            completed,
        }
    }

    /// Whether this observable has completed.
    pub fn is_completed(&self) -> bool {
        self.completed.value()
    }

    /// Completes the observable: sets the completion flag, then tears down
    /// every active subscription, firing each one's `complete` callback.
    ///
    /// Completion is terminal. Calling `complete` again is harmless and no
    /// subscriber receives the signal twice.
    pub fn complete(&self) {
        self.completed.update(true);
        self.completed.reset();
    }

    /// Applies `op` to this observable, consuming it. Operators compose left
    /// to right, either by chaining `pipe` calls or with a single [`pipe!`]
    /// composition:
    ///
    /// ```
    /// use coals::operators::{filter, map};
    /// use coals::subscribe::Subscriber;
    /// use coals::{events, pipe, Subscribeable};
    ///
    /// let mut evens_scaled = events::<i32>()
    ///     .pipe(pipe!(filter(|v| v % 2 == 0), map(|v| v * 10)));
    ///
    /// evens_scaled.subscribe(Subscriber::on_next(|v| println!("{}", v)));
    /// ```
    ///
    /// [`pipe!`]: crate::pipe
    pub fn pipe<R>(self, op: impl FnOnce(Observable<T>) -> R) -> R {
        op(self)
    }
}

impl<T: 'static> Subscribeable for Observable<T> {
    type ObsType = T;

    fn subscribe(&mut self, v: Subscriber<T>) -> Subscription {
        let shared = Arc::new(Mutex::new(v));
        let shared_next = Arc::clone(&shared);
        let shared_error = Arc::clone(&shared);
        let shared_complete = Arc::clone(&shared);

        // Per-subscription liveness flag; the completion cell closes the gate
        // for every subscription at once.
        let active = Arc::new(Mutex::new(true));
        let active_next = Arc::clone(&active);
        let active_error = Arc::clone(&active);
        let active_complete = Arc::clone(&active);
        let completed = self.completed.clone();

        let gate = Subscriber::new(
            move |value| {
                if *active_next.lock().unwrap() && !completed.value() {
                    shared_next.lock().unwrap().next(value);
                }
            },
            move |observable_error| {
                if *active_error.lock().unwrap() {
                    shared_error.lock().unwrap().error(observable_error);
                }
            },
            move || {
                if *active_complete.lock().unwrap() {
                    shared_complete.lock().unwrap().complete();
                }
            },
        );

        let mut produced = {
            let mut producer = self.producer.lock().unwrap();
            (*producer)(gate)
        };

        // The producer's task handle stays on the subscription handed back;
        // its teardown moves into the shared finish hook below.
        let handle = std::mem::replace(&mut produced.subscription_future, SubscriptionHandle::Nil);
        let teardown = Arc::new(Mutex::new(Some(produced)));

        // Runs on unsubscribe or on completion of the observable, first
        // caller wins: deliver complete, deactivate, release the producer.
        let finish = {
            let shared = Arc::clone(&shared);
            let teardown = Arc::clone(&teardown);
            let active = Arc::clone(&active);
            move || {
                {
                    let mut still_active = active.lock().unwrap();
                    if !*still_active {
                        return;
                    }
                    *still_active = false;
                }
                shared.lock().unwrap().complete();
                if let Some(captured) = teardown.lock().unwrap().take() {
                    captured.unsubscribe();
                }
            }
        };

        let finish_on_complete = finish.clone();
        let registration = self
            .completed
            .add_watch_with_reset(|_| {}, move || finish_on_complete());

        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                finish();
                registration.remove();
            })),
            handle,
        )
    }
}

/// Creates an [`Observable`] from a producer function. Shorthand for
/// [`Observable::new`].
pub fn create<T: 'static>(
    producer: impl FnMut(Subscriber<T>) -> Subscription + Send + Sync + 'static,
) -> Observable<T> {
    Observable::new(producer)
}

#[cfg(test)]
mod tests;

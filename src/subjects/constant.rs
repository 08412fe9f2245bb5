use std::{error::Error, sync::Arc};

use crate::{
    atom::Atom,
    observer::Observer,
    subscription::subscribe::{Subscribeable, Subscriber, Subscription},
    Observable,
};

use super::subject::Subject;

/// A value-caching subject: a [`Subject`] that remembers the latest pushed
/// value in an [`Atom`] and replays it synchronously to every new
/// subscriber before the subscribe call returns.
///
/// Subscribing therefore means "get the latest value now, watch for future
/// ones". Inside a subscriber callback [`value`](Constant::value) still
/// returns the previous value: the store happens after the fan-out, the way
/// the underlying cell updates.
///
/// After [`complete`](Constant::complete) the value is frozen: further
/// `next` calls neither notify nor change it.
///
/// # Example
///
/// ```
/// use coals::subscribe::Subscriber;
/// use coals::{constant, Subscribeable};
///
/// let mut temperature = constant(21);
///
/// // Replays 21 immediately, then follows updates.
/// temperature.subscribe(Subscriber::on_next(|v| println!("{} degrees", v)));
///
/// temperature.next(23);
/// assert_eq!(temperature.value(), 23);
///
/// temperature.complete();
/// temperature.next(40); // dropped
/// assert_eq!(temperature.value(), 23);
/// ```
pub struct Constant<T> {
    value: Atom<T>,
    subject: Subject<T>,
}

impl<T> Clone for Constant<T> {
    fn clone(&self) -> Self {
        Constant {
            value: self.value.clone(),
            subject: self.subject.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> Constant<T> {
    pub fn new(value: T) -> Constant<T> {
        Constant {
            value: Atom::new(value),
            subject: Subject::new(),
        }
    }

    /// Returns the latest value: the last one pushed, or the initial value if
    /// none has been pushed yet. Frozen once the subject completes.
    pub fn value(&self) -> T {
        self.value.value()
    }

    /// Pushes a value to every subscriber, then stores it as the latest.
    /// A no-op once completed: subscribers are not notified and the
    /// remembered value keeps its frozen state.
    pub fn next(&self, v: T) {
        if self.subject.is_completed() {
            return;
        }
        self.subject.next(v.clone());
        self.value.update(v);
    }

    /// Completes the subject, freezing the value. See [`Subject::complete`].
    pub fn complete(&self) {
        self.subject.complete();
    }

    /// Errors the subject. The value stays frozen at the last stored one.
    /// See [`Subject::error`].
    pub fn error(&self, e: Arc<dyn Error + Send + Sync>) {
        self.subject.error(e);
    }

    pub fn is_completed(&self) -> bool {
        self.subject.is_completed()
    }

    /// Number of currently registered subscribers.
    pub fn len(&self) -> usize {
        self.subject.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subject.is_empty()
    }

    /// Applies an operator (or a [`pipe!`](crate::pipe) composition) to this
    /// subject, viewed as an observable. The subject itself stays usable.
    pub fn pipe<R>(&self, op: impl FnOnce(Observable<T>) -> R) -> R {
        op(self.clone().into())
    }
}

impl<T: Clone + Send + 'static> Subscribeable for Constant<T> {
    type ObsType = T;

    fn subscribe(&mut self, mut v: Subscriber<T>) -> Subscription {
        if self.subject.is_completed() {
            // Terminal path: the inner subject delivers complete or the
            // stored error; no value replay for late subscribers.
            return self.subject.subscribe(v);
        }
        v.next(self.value.value());
        self.subject.subscribe(v)
    }
}

impl<T: Clone + Send + 'static> Observer for Constant<T> {
    type NextFnType = T;

    fn next(&mut self, v: T) {
        Constant::next(self, v);
    }

    fn complete(&mut self) {
        Constant::complete(self);
    }

    fn error(&mut self, e: Arc<dyn Error + Send + Sync>) {
        Constant::error(self, e);
    }
}

impl<T: Clone + Send + 'static> From<Constant<T>> for Subscriber<T> {
    fn from(constant: Constant<T>) -> Subscriber<T> {
        let constant_error = constant.clone();
        let constant_complete = constant.clone();
        Subscriber::new(
            move |v| constant.next(v),
            move |e| constant_error.error(e),
            move || constant_complete.complete(),
        )
    }
}

impl<T: Clone + Send + 'static> From<Constant<T>> for Observable<T> {
    fn from(constant: Constant<T>) -> Observable<T> {
        let mut constant = constant;
        Observable::new(move |o| constant.subscribe(o))
    }
}

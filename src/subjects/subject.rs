use std::{
    error::Error,
    sync::{Arc, Mutex},
};

use crate::{
    observer::Observer,
    subscription::subscribe::{
        Subscribeable, Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic,
    },
    Observable,
};

pub(crate) struct SubjectState<T> {
    pub(crate) observers: Vec<(u64, Arc<Mutex<Subscriber<T>>>)>,
    pub(crate) key_seq: u64,
    pub(crate) completed: bool,
    pub(crate) error: Option<Arc<dyn Error + Send + Sync>>,
}

/// An events stream that is pushed into directly: it has no producer, and
/// every value given to [`next`](Subject::next) fans out to all current
/// subscribers in registration order.
///
/// Unlike a plain [`Observable`], which runs its producer independently per
/// subscription, a `Subject` multicasts: all subscribers observe the same
/// emissions. Completion and errors are terminal: after either, `next` is a
/// silent no-op and late subscribers immediately receive the stored terminal
/// signal instead of values.
///
/// Cloning a `Subject` clones the handle; every clone pushes into and
/// subscribes to the same stream.
///
/// # Example
///
/// ```
/// use coals::subscribe::Subscriber;
/// use coals::{events, Subscribeable};
///
/// let mut numbers = events::<i32>();
///
/// numbers.subscribe(Subscriber::new(
///     |v| println!("first saw {}", v),
///     |e| eprintln!("error: {}", e),
///     || println!("first done"),
/// ));
///
/// numbers.next(1); // reaches the first subscriber
///
/// numbers.subscribe(Subscriber::on_next(|v| println!("second saw {}", v)));
///
/// numbers.next(2); // reaches both, in subscription order
/// numbers.complete(); // both complete callbacks fire
/// numbers.next(3); // dropped
/// ```
pub struct Subject<T> {
    pub(crate) state: Arc<Mutex<SubjectState<T>>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Subject {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Clone + Send + 'static> Default for Subject<T> {
    fn default() -> Self {
        Subject::new()
    }
}

impl<T: Clone + Send + 'static> Subject<T> {
    pub fn new() -> Subject<T> {
        Subject {
            state: Arc::new(Mutex::new(SubjectState {
                observers: Vec::new(),
                key_seq: 0,
                completed: false,
                error: None,
            })),
        }
    }

    /// Pushes a value to every currently registered subscriber, in
    /// registration order. A no-op once the subject has completed or errored.
    ///
    /// The observer list is read once at the start of the pass, so a
    /// subscriber that subscribes or unsubscribes from inside a callback
    /// takes effect from the next push on.
    pub fn next(&self, v: T) {
        let pass: Vec<Arc<Mutex<Subscriber<T>>>> = {
            let state = self.state.lock().unwrap();
            if state.completed {
                return;
            }
            state.observers.iter().map(|(_, o)| Arc::clone(o)).collect()
        };
        for observer in pass {
            observer.lock().unwrap().next(v.clone());
        }
    }

    /// Marks the subject completed and fires every subscriber's `complete`
    /// callback, emptying the subject. Terminal and idempotent.
    pub fn complete(&self) {
        let pass = {
            let mut state = self.state.lock().unwrap();
            if state.completed {
                return;
            }
            state.completed = true;
            state.observers.drain(..).collect::<Vec<_>>()
        };
        for (_, observer) in pass {
            observer.lock().unwrap().complete();
        }
    }

    /// Marks the subject completed, pushes `e` to every subscriber's error
    /// callback and empties the subject. The error is stored so late
    /// subscribers receive it as their terminal signal.
    pub fn error(&self, e: Arc<dyn Error + Send + Sync>) {
        let pass = {
            let mut state = self.state.lock().unwrap();
            if state.completed {
                return;
            }
            state.completed = true;
            state.error = Some(Arc::clone(&e));
            state.observers.drain(..).collect::<Vec<_>>()
        };
        for (_, observer) in pass {
            observer.lock().unwrap().error(Arc::clone(&e));
        }
    }

    /// Whether the subject has completed (or errored).
    pub fn is_completed(&self) -> bool {
        self.state.lock().unwrap().completed
    }

    /// Number of currently registered subscribers.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies an operator (or a [`pipe!`](crate::pipe) composition) to this
    /// subject, viewed as an observable. The subject itself stays usable for
    /// pushing.
    pub fn pipe<R>(&self, op: impl FnOnce(Observable<T>) -> R) -> R {
        op(self.clone().into())
    }
}

impl<T: Clone + Send + 'static> Subscribeable for Subject<T> {
    type ObsType = T;

    fn subscribe(&mut self, mut v: Subscriber<T>) -> Subscription {
        let key;
        let shared;
        {
            let mut state = self.state.lock().unwrap();
            if state.completed {
                // Late subscriber: deliver the stored terminal signal and
                // hand back an inert subscription.
                if let Some(e) = &state.error {
                    v.error(Arc::clone(e));
                } else {
                    v.complete();
                }
                return Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil);
            }
            key = state.key_seq;
            state.key_seq += 1;
            shared = Arc::new(Mutex::new(v));
            state.observers.push((key, Arc::clone(&shared)));
        }

        let state_cloned = Arc::clone(&self.state);
        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                let removed = {
                    let mut state = state_cloned.lock().unwrap();
                    let before = state.observers.len();
                    state.observers.retain(|(k, _)| *k != key);
                    before != state.observers.len()
                };
                // Still registered at teardown time: this unsubscribe ends
                // the subscription, so it delivers the complete signal.
                if removed {
                    shared.lock().unwrap().complete();
                }
            })),
            SubscriptionHandle::Nil,
        )
    }
}

impl<T: Clone + Send + 'static> Observer for Subject<T> {
    type NextFnType = T;

    fn next(&mut self, v: T) {
        Subject::next(self, v);
    }

    fn complete(&mut self) {
        Subject::complete(self);
    }

    fn error(&mut self, e: Arc<dyn Error + Send + Sync>) {
        Subject::error(self, e);
    }
}

impl<T: Clone + Send + 'static> From<Subject<T>> for Subscriber<T> {
    fn from(subject: Subject<T>) -> Subscriber<T> {
        let subject_error = subject.clone();
        let subject_complete = subject.clone();
        Subscriber::new(
            move |v| subject.next(v),
            move |e| subject_error.error(e),
            move || subject_complete.complete(),
        )
    }
}

impl<T: Clone + Send + 'static> From<Subject<T>> for Observable<T> {
    fn from(subject: Subject<T>) -> Observable<T> {
        let mut subject = subject;
        Observable::new(move |o| subject.subscribe(o))
    }
}

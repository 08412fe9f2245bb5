//! Operators that transform and combine observables.
//!
//! Each operator is a function that takes its configuration and returns a
//! closure from one observable to another, so operators compose left to
//! right with [`pipe`](crate::Observable::pipe) or the
//! [`pipe!`](crate::pipe) macro. Subjects participate through their own
//! `pipe` methods, which lift them into observables first.
//!
//! Operators subscribe to their source lazily: nothing runs until the
//! resulting observable is itself subscribed, and every subscription gets a
//! fresh run through the whole chain.

use std::{
    error::Error,
    sync::{Arc, Mutex},
};

use crate::{
    atom::Atom,
    observable::Observable,
    observer::Observer,
    subscription::subscribe::{
        Subscribeable, Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic,
        Unsubscribeable,
    },
};

/// Transforms every value the source emits with `f`, emitting the results.
///
/// Errors and completion pass through untouched.
///
/// # Example
///
/// ```
/// use coals::operators::map;
/// use coals::subscribe::Subscriber;
/// use coals::{events, Subscribeable};
///
/// let celsius = events::<f64>();
/// let mut fahrenheit = celsius.pipe(map(|c| c * 9.0 / 5.0 + 32.0));
///
/// fahrenheit.subscribe(Subscriber::on_next(|f| println!("{} F", f)));
/// celsius.next(20.0); // prints "68 F"
/// ```
pub fn map<T, U, F>(f: F) -> impl FnOnce(Observable<T>) -> Observable<U>
where
    F: (FnOnce(T) -> U) + Copy + Sync + Send + 'static,
    T: 'static,
    U: 'static,
{
    move |mut source: Observable<T>| {
        Observable::new(move |o| {
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);

            let u = Subscriber::new(
                move |v| {
                    let t = f(v);
                    o_shared.lock().unwrap().next(t);
                },
                move |observable_error| {
                    o_cloned_e.lock().unwrap().error(observable_error);
                },
                move || {
                    o_cloned_c.lock().unwrap().complete();
                },
            );
            source.subscribe(u)
        })
    }
}

/// Emits only the values for which `predicate` returns `true`.
pub fn filter<T, P>(predicate: P) -> impl FnOnce(Observable<T>) -> Observable<T>
where
    P: (FnOnce(&T) -> bool) + Copy + Sync + Send + 'static,
    T: 'static,
{
    move |mut source: Observable<T>| {
        Observable::new(move |o| {
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);

            let u = Subscriber::new(
                move |v| {
                    if predicate(&v) {
                        o_shared.lock().unwrap().next(v);
                    }
                },
                move |observable_error| {
                    o_cloned_e.lock().unwrap().error(observable_error);
                },
                move || {
                    o_cloned_c.lock().unwrap().complete();
                },
            );
            source.subscribe(u)
        })
    }
}

/// Combines the piped source with `others`, emitting a `Vec` of the latest
/// value from each whenever any of them emits.
///
/// The piped source occupies slot `0` of the emitted `Vec`; `others` follow
/// in the order given. Nothing is emitted until every source has produced at
/// least one value. The combined stream completes once all sources have
/// completed, and forwards the first error any source produces.
///
/// # Example
///
/// ```
/// use coals::operators::combine;
/// use coals::subscribe::Subscriber;
/// use coals::{events, Subscribeable};
///
/// let width = events::<u32>();
/// let height = events::<u32>();
///
/// let mut dimensions = width.pipe(combine(vec![height.clone().into()]));
/// dimensions.subscribe(Subscriber::on_next(|d: Vec<u32>| {
///     println!("{}x{}", d[0], d[1]);
/// }));
///
/// width.next(1920);
/// height.next(1080); // prints "1920x1080"
/// ```
pub fn combine<T>(others: Vec<Observable<T>>) -> impl FnOnce(Observable<T>) -> Observable<Vec<T>>
where
    T: Clone + Send + 'static,
{
    move |source: Observable<T>| {
        let mut sources = Vec::with_capacity(others.len() + 1);
        sources.push(source);
        sources.extend(others);

        Observable::new(move |o| {
            let o_shared = Arc::new(Mutex::new(o));

            let total = sources.len();
            let latest: Arc<Mutex<Vec<Option<T>>>> = Arc::new(Mutex::new(vec![None; total]));
            let remaining = Arc::new(Mutex::new(total));

            let mut subscriptions = Vec::with_capacity(total);
            for (slot, source) in sources.iter_mut().enumerate() {
                let o_cloned_n = Arc::clone(&o_shared);
                let o_cloned_e = Arc::clone(&o_shared);
                let o_cloned_c = Arc::clone(&o_shared);
                let latest = Arc::clone(&latest);
                let remaining = Arc::clone(&remaining);

                let u = Subscriber::new(
                    move |v| {
                        let snapshot = {
                            let mut latest = latest.lock().unwrap();
                            latest[slot] = Some(v);
                            if latest.iter().all(Option::is_some) {
                                Some(latest.iter().flatten().cloned().collect::<Vec<T>>())
                            } else {
                                None
                            }
                        };
                        if let Some(values) = snapshot {
                            o_cloned_n.lock().unwrap().next(values);
                        }
                    },
                    move |observable_error| {
                        o_cloned_e.lock().unwrap().error(observable_error);
                    },
                    move || {
                        let exhausted = {
                            let mut remaining = remaining.lock().unwrap();
                            *remaining -= 1;
                            *remaining == 0
                        };
                        if exhausted {
                            o_cloned_c.lock().unwrap().complete();
                        }
                    },
                );
                subscriptions.push(source.subscribe(u));
            }

            Subscription::new(
                UnsubscribeLogic::Logic(Box::new(move || {
                    for subscription in subscriptions {
                        subscription.unsubscribe();
                    }
                })),
                SubscriptionHandle::Nil,
            )
        })
    }
}

/// Merges the piped source with `others` into a single stream that emits
/// every value from every source as it arrives.
///
/// Completes once all sources have completed. A completion of one source
/// does not block values still arriving from the rest. Errors forward as
/// they occur; the first one wins.
pub fn merge<T: 'static>(others: Vec<Observable<T>>) -> impl FnOnce(Observable<T>) -> Observable<T> {
    move |source: Observable<T>| {
        let mut sources = Vec::with_capacity(others.len() + 1);
        sources.push(source);
        sources.extend(others);

        Observable::new(move |o| {
            let o_shared = Arc::new(Mutex::new(o));

            let remaining = Arc::new(Mutex::new(sources.len()));

            let mut subscriptions = Vec::with_capacity(sources.len());
            for source in &mut sources {
                let o_cloned_n = Arc::clone(&o_shared);
                let o_cloned_e = Arc::clone(&o_shared);
                let o_cloned_c = Arc::clone(&o_shared);
                let remaining = Arc::clone(&remaining);

                let u = Subscriber::new(
                    move |v| {
                        o_cloned_n.lock().unwrap().next(v);
                    },
                    move |observable_error| {
                        o_cloned_e.lock().unwrap().error(observable_error);
                    },
                    move || {
                        let exhausted = {
                            let mut remaining = remaining.lock().unwrap();
                            *remaining -= 1;
                            *remaining == 0
                        };
                        if exhausted {
                            o_cloned_c.lock().unwrap().complete();
                        }
                    },
                );
                subscriptions.push(source.subscribe(u));
            }

            Subscription::new(
                UnsubscribeLogic::Logic(Box::new(move || {
                    for subscription in subscriptions {
                        subscription.unsubscribe();
                    }
                })),
                SubscriptionHandle::Nil,
            )
        })
    }
}

/// Mirrors the source until `notifier` emits its first value, then completes.
///
/// The first emission of the notifier completes the resulting observable:
/// subscribers receive their `complete` callback, the source subscription is
/// released, and later source values are dropped. Completing the notifier
/// without it ever emitting does not end the stream.
///
/// Only the piped wrapper completes. When the source is a subject lifted
/// into the pipe, the subject itself stays live for its other subscribers.
///
/// # Example
///
/// ```
/// use coals::operators::take_until;
/// use coals::subscribe::Subscriber;
/// use coals::{events, Subscribeable};
///
/// let clicks = events::<u32>();
/// let stop = events::<()>();
///
/// let mut tracked = clicks.pipe(take_until(stop.clone().into()));
/// tracked.subscribe(Subscriber::on_next(|n| println!("click {}", n)));
///
/// clicks.next(1);
/// stop.next(()); // completes `tracked`
/// clicks.next(2); // no longer delivered through `tracked`
/// ```
pub fn take_until<T: 'static, N: 'static>(
    mut notifier: Observable<N>,
) -> impl FnOnce(Observable<T>) -> Observable<T> {
    move |mut source: Observable<T>| {
        let completed = Atom::new(false);
        let stop_cell = completed.clone();

        Observable::with_completion(completed, move |o| {
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);

            let u = Subscriber::new(
                move |v| {
                    o_shared.lock().unwrap().next(v);
                },
                move |observable_error| {
                    o_cloned_e.lock().unwrap().error(observable_error);
                },
                move || {
                    o_cloned_c.lock().unwrap().complete();
                },
            );
            let mut source_subscription = source.subscribe(u);
            let handle = std::mem::replace(
                &mut source_subscription.subscription_future,
                SubscriptionHandle::Nil,
            );

            let stop = stop_cell.clone();
            let n = Subscriber::new(
                move |_| {
                    if stop.value() {
                        return;
                    }
                    stop.update(true);
                    stop.reset();
                },
                |_| {},
                || {},
            );
            let notifier_subscription = notifier.subscribe(n);

            Subscription::new(
                UnsubscribeLogic::Logic(Box::new(move || {
                    source_subscription.unsubscribe();

                    // This logic can run from inside the notifier's own
                    // emission; the notifier is released off the current
                    // call stack.
                    if let Ok(rt) = tokio::runtime::Handle::try_current() {
                        rt.spawn(async move {
                            notifier_subscription.unsubscribe();
                        });
                    } else {
                        std::thread::spawn(move || {
                            notifier_subscription.unsubscribe();
                        });
                    }
                })),
                handle,
            )
        })
    }
}

/// Catches errors from the source, optionally resuming with a replacement
/// observable.
///
/// When the source errors, `handler` is called with the error. Returning
/// `Some(observable)` switches the subscription over to the replacement:
/// its values, completion and errors flow downstream in place of the failed
/// source. Returning `None` swallows the error and completes downstream.
/// Either way the failed source's subscription is released, running its
/// teardown; the release happens off the erroring call stack.
///
/// The downstream subscriber never sees the caught error, so a stream piped
/// through `catch_error` keeps its error callback unused unless the
/// replacement itself fails.
pub fn catch_error<T: 'static, F>(handler: F) -> impl FnOnce(Observable<T>) -> Observable<T>
where
    F: (FnMut(Arc<dyn Error + Send + Sync>) -> Option<Observable<T>>) + Sync + Send + 'static,
{
    let handler = Arc::new(Mutex::new(handler));
    move |mut source: Observable<T>| {
        Observable::new(move |o| {
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);

            let handler = Arc::clone(&handler);

            let fallback_subscription: Arc<Mutex<Option<Subscription>>> =
                Arc::new(Mutex::new(None));
            let fallback_cloned = Arc::clone(&fallback_subscription);

            let upstream_subscription: Arc<Mutex<Option<Subscription>>> =
                Arc::new(Mutex::new(None));
            let upstream_cloned = Arc::clone(&upstream_subscription);
            let upstream_on_error = Arc::clone(&upstream_subscription);

            let source_failed = Arc::new(Mutex::new(false));
            let source_failed_in_error = Arc::clone(&source_failed);

            let u = Subscriber::new(
                move |v| {
                    o_shared.lock().unwrap().next(v);
                },
                move |observable_error| {
                    *source_failed_in_error.lock().unwrap() = true;

                    // The failed source is released here; its own error
                    // delivery still holds locks on this chain, so the
                    // release happens off the emitting call stack.
                    if let Some(failed) = upstream_on_error.lock().unwrap().take() {
                        if let Ok(rt) = tokio::runtime::Handle::try_current() {
                            rt.spawn(async move {
                                failed.unsubscribe();
                            });
                        } else {
                            std::thread::spawn(move || {
                                failed.unsubscribe();
                            });
                        }
                    }

                    let replacement = (*handler.lock().unwrap())(observable_error);

                    match replacement {
                        Some(mut replacement) => {
                            let o_shared = Arc::clone(&o_cloned_e);
                            let o_resumed_e = Arc::clone(&o_cloned_e);
                            let o_resumed_c = Arc::clone(&o_cloned_e);

                            let resumed = Subscriber::new(
                                move |v| {
                                    o_shared.lock().unwrap().next(v);
                                },
                                move |unhandled| {
                                    o_resumed_e.lock().unwrap().error(unhandled);
                                },
                                move || {
                                    o_resumed_c.lock().unwrap().complete();
                                },
                            );
                            let s = replacement.subscribe(resumed);
                            *fallback_subscription.lock().unwrap() = Some(s);
                        }
                        None => {
                            o_cloned_e.lock().unwrap().complete();
                        }
                    }
                },
                move || {
                    o_cloned_c.lock().unwrap().complete();
                },
            );

            let mut upstream = source.subscribe(u);
            let handle = std::mem::replace(
                &mut upstream.subscription_future,
                SubscriptionHandle::Nil,
            );

            // A producer that errored during setup is already spent; release
            // it now instead of parking it in the slot. The erroring
            // subscriber's spent state keeps the release from delivering a
            // second terminal signal.
            if *source_failed.lock().unwrap() {
                upstream.unsubscribe();
            } else {
                *upstream_subscription.lock().unwrap() = Some(upstream);
            }

            Subscription::new(
                UnsubscribeLogic::Logic(Box::new(move || {
                    if let Some(upstream) = upstream_cloned.lock().unwrap().take() {
                        upstream.unsubscribe();
                    }
                    if let Some(fallback) = fallback_cloned.lock().unwrap().take() {
                        fallback.unsubscribe();
                    }
                })),
                handle,
            )
        })
    }
}

/// Projects every source value into an observable and mirrors only the
/// latest one.
///
/// Each source emission unsubscribes the previous projected observable
/// before subscribing the new one, so values from stale projections stop
/// flowing as soon as a fresh value arrives. Completion of a projected
/// observable is not forwarded; the stream completes when the source does.
/// Errors from either the source or the current projection forward
/// downstream.
pub fn switch_map<T, R, F>(project: F) -> impl FnOnce(Observable<T>) -> Observable<R>
where
    F: (FnMut(T) -> Observable<R>) + Sync + Send + 'static,
    T: 'static,
    R: 'static,
{
    let project = Arc::new(Mutex::new(project));
    move |mut source: Observable<T>| {
        Observable::new(move |o| {
            let o_shared = Arc::new(Mutex::new(o));
            let o_cloned_e = Arc::clone(&o_shared);
            let o_cloned_c = Arc::clone(&o_shared);

            let project = Arc::clone(&project);

            let current_subscription: Arc<Mutex<Option<Subscription>>> =
                Arc::new(Mutex::new(None));
            let current_cloned = Arc::clone(&current_subscription);

            let u = Subscriber::new(
                move |v| {
                    let o_inner_n = Arc::clone(&o_shared);
                    let o_inner_e = Arc::clone(&o_shared);

                    let mut inner_observable = (*project.lock().unwrap())(v);

                    let previous = current_subscription.lock().unwrap().take();
                    if let Some(subscription) = previous {
                        subscription.unsubscribe();
                    }

                    let inner_subscriber = Subscriber::new(
                        move |k| {
                            o_inner_n.lock().unwrap().next(k);
                        },
                        move |observable_error| {
                            o_inner_e.lock().unwrap().error(observable_error);
                        },
                        || {},
                    );
                    let s = inner_observable.subscribe(inner_subscriber);
                    *current_subscription.lock().unwrap() = Some(s);
                },
                move |observable_error| {
                    o_cloned_e.lock().unwrap().error(observable_error);
                },
                move || {
                    o_cloned_c.lock().unwrap().complete();
                },
            );

            let mut outer = source.subscribe(u);
            let handle = std::mem::replace(&mut outer.subscription_future, SubscriptionHandle::Nil);

            Subscription::new(
                UnsubscribeLogic::Logic(Box::new(move || {
                    outer.unsubscribe();
                    if let Some(inner) = current_cloned.lock().unwrap().take() {
                        inner.unsubscribe();
                    }
                })),
                handle,
            )
        })
    }
}

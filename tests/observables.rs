mod custom_error;
mod register_emissions;

use std::sync::{Arc, Mutex};

use coals::subscribe::{Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic};
use coals::{create, events, Observable, Observer, Subscribeable, Unsubscribeable};

use custom_error::CustomError;
use register_emissions::Emissions;

#[test]
fn unchained_observable() {
    let value = 100;
    let o = Subscriber::new(
        move |v| {
            assert_eq!(
                v, value,
                "expected integer value {} but {} is emitted",
                value, v
            );
        },
        |_observable_error| {},
        move || {},
    );

    let mut s = create(move |mut o: Subscriber<_>| {
        o.next(value);
        Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
    });

    s.subscribe(o);
}

#[test]
fn observable_emits_then_completes() {
    let emissions = Emissions::new();

    let mut s = create(|mut o: Subscriber<i32>| {
        for i in 1..=3 {
            o.next(i);
        }
        o.complete();
        Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
    });

    s.subscribe(emissions.subscriber());

    assert_eq!(emissions.nexts(), vec![1, 2, 3]);
    assert_eq!(emissions.completes(), 1);
    assert_eq!(emissions.errors(), 0);
}

#[test]
fn complete_is_idempotent_for_subscribers() {
    let emitters: Arc<Mutex<Vec<Subscriber<i32>>>> = Arc::new(Mutex::new(Vec::new()));
    let emitters_in_producer = Arc::clone(&emitters);

    let mut s = create(move |o: Subscriber<i32>| {
        emitters_in_producer.lock().unwrap().push(o);
        Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
    });

    let emissions = Emissions::new();
    s.subscribe(emissions.subscriber());

    emitters.lock().unwrap()[0].next(4);
    s.complete();
    s.complete();

    assert!(s.is_completed());
    assert_eq!(emissions.nexts(), vec![4]);
    assert_eq!(
        emissions.completes(),
        1,
        "a second complete() must not re-deliver the signal"
    );

    // Post-completion values never reach the subscriber.
    emitters.lock().unwrap()[0].next(5);
    assert_eq!(emissions.nexts(), vec![4]);
}

#[test]
fn unsubscribe_stops_delivery_and_runs_teardown_once() {
    let teardowns = Arc::new(Mutex::new(0_u32));
    let teardowns_in_producer = Arc::clone(&teardowns);
    let emitters: Arc<Mutex<Vec<Subscriber<i32>>>> = Arc::new(Mutex::new(Vec::new()));
    let emitters_in_producer = Arc::clone(&emitters);

    let mut s = create(move |o: Subscriber<i32>| {
        emitters_in_producer.lock().unwrap().push(o);
        let teardowns = Arc::clone(&teardowns_in_producer);
        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                *teardowns.lock().unwrap() += 1;
            })),
            SubscriptionHandle::Nil,
        )
    });

    let emissions = Emissions::new();
    let subscription = s.subscribe(emissions.subscriber());

    emitters.lock().unwrap()[0].next(1);
    subscription.unsubscribe();
    emitters.lock().unwrap()[0].next(2);

    // Completing afterwards must not run this subscription's teardown again.
    s.complete();

    assert_eq!(emissions.nexts(), vec![1]);
    assert_eq!(emissions.completes(), 1);
    assert_eq!(*teardowns.lock().unwrap(), 1);
}

#[test]
fn producer_error_reaches_the_error_callback() {
    let emissions = Emissions::new();

    let mut s = create(|mut o: Subscriber<i32>| {
        o.next(7);
        o.error(Arc::new(CustomError));
        // A spent subscriber drops everything after its error.
        o.next(8);
        o.complete();
        Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
    });

    s.subscribe(emissions.subscriber());

    assert_eq!(emissions.nexts(), vec![7]);
    assert_eq!(emissions.errors(), 1);
    assert_eq!(emissions.completes(), 0);
}

#[test]
fn observable_chains_into_a_subject_sink() {
    let mut source = create(|mut o: Subscriber<i32>| {
        o.next(1);
        o.next(2);
        o.complete();
        Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
    });

    let mut relay = events::<i32>();
    let first = Emissions::new();
    let second = Emissions::new();
    relay.subscribe(first.subscriber());
    relay.subscribe(second.subscriber());

    // Subscribing the subject as a sink forwards the whole signal stream.
    source.subscribe(relay.clone().into());

    assert_eq!(first.nexts(), vec![1, 2]);
    assert_eq!(second.nexts(), vec![1, 2]);
    assert_eq!(first.completes(), 1);
    assert_eq!(second.completes(), 1);
    assert!(relay.is_completed());
}

#[test]
fn sink_chaining_forwards_errors() {
    let mut source: Observable<i32> = create(|mut o: Subscriber<i32>| {
        o.error(Arc::new(CustomError));
        Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
    });

    let mut relay = events::<i32>();
    let emissions = Emissions::new();
    relay.subscribe(emissions.subscriber());

    source.subscribe(relay.clone().into());

    assert_eq!(emissions.errors(), 1);
    assert_eq!(emissions.completes(), 0);
    assert!(relay.is_completed());
}

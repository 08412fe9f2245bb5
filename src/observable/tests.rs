use super::*;

type EmissionLog = Arc<Mutex<Vec<i32>>>;
type Emitters = Arc<Mutex<Vec<Subscriber<i32>>>>;

// Observable whose producer parks its observer in a shared slot, so tests can
// push values after `subscribe` returns, and counts every teardown run.
fn stashing_observable(teardowns: Arc<Mutex<u32>>) -> (Observable<i32>, Emitters) {
    let emitters: Emitters = Arc::new(Mutex::new(Vec::new()));
    let emitters_in_producer = Arc::clone(&emitters);

    let observable = Observable::new(move |o: Subscriber<i32>| {
        emitters_in_producer.lock().unwrap().push(o);
        let teardowns = Arc::clone(&teardowns);
        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                *teardowns.lock().unwrap() += 1;
            })),
            SubscriptionHandle::Nil,
        )
    });
    (observable, emitters)
}

fn logging_subscriber(nexts: &EmissionLog, completes: &Arc<Mutex<u32>>) -> Subscriber<i32> {
    let nexts = Arc::clone(nexts);
    let completes = Arc::clone(completes);
    Subscriber::new(
        move |v| nexts.lock().unwrap().push(v),
        |_| {},
        move || *completes.lock().unwrap() += 1,
    )
}

#[test]
fn producer_runs_once_per_subscription() {
    let runs = Arc::new(Mutex::new(0_u32));
    let runs_in_producer = Arc::clone(&runs);

    let mut observable = Observable::new(move |_: Subscriber<i32>| {
        *runs_in_producer.lock().unwrap() += 1;
        Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
    });

    observable.subscribe(Subscriber::on_next(|_| {}));
    observable.subscribe(Subscriber::on_next(|_| {}));
    observable.subscribe(Subscriber::on_next(|_| {}));

    assert_eq!(
        *runs.lock().unwrap(),
        3,
        "a cold observable should run its producer for every subscription"
    );
}

#[test]
fn values_flow_until_unsubscribe() {
    let teardowns = Arc::new(Mutex::new(0_u32));
    let (mut observable, emitters) = stashing_observable(Arc::clone(&teardowns));

    let nexts: EmissionLog = Arc::new(Mutex::new(Vec::new()));
    let completes = Arc::new(Mutex::new(0_u32));
    let subscription = observable.subscribe(logging_subscriber(&nexts, &completes));

    emitters.lock().unwrap()[0].next(1);
    emitters.lock().unwrap()[0].next(2);

    subscription.unsubscribe();

    // The producer still holds its observer, but the subscription is gone.
    emitters.lock().unwrap()[0].next(3);

    assert_eq!(*nexts.lock().unwrap(), vec![1, 2]);
    assert_eq!(
        *completes.lock().unwrap(),
        1,
        "unsubscribing should deliver the subscription's own complete"
    );
    assert_eq!(*teardowns.lock().unwrap(), 1);
}

#[test]
fn unsubscribe_deregisters_the_subscription() {
    let teardowns = Arc::new(Mutex::new(0_u32));
    let (mut observable, _emitters) = stashing_observable(teardowns);

    let subscription = observable.subscribe(Subscriber::on_next(|_| {}));
    assert_eq!(observable.completed.watcher_count(), 1);

    subscription.unsubscribe();
    assert_eq!(
        observable.completed.watcher_count(),
        0,
        "an unsubscribed subscription must not linger in the registry"
    );
}

#[test]
fn complete_tears_down_every_subscription() {
    let teardowns = Arc::new(Mutex::new(0_u32));
    let (mut observable, emitters) = stashing_observable(Arc::clone(&teardowns));

    let nexts: EmissionLog = Arc::new(Mutex::new(Vec::new()));
    let first_completes = Arc::new(Mutex::new(0_u32));
    let second_completes = Arc::new(Mutex::new(0_u32));
    observable.subscribe(logging_subscriber(&nexts, &first_completes));
    observable.subscribe(logging_subscriber(&nexts, &second_completes));

    observable.complete();

    assert!(observable.is_completed());
    assert_eq!(*first_completes.lock().unwrap(), 1);
    assert_eq!(*second_completes.lock().unwrap(), 1);
    assert_eq!(*teardowns.lock().unwrap(), 2);

    // Terminal and idempotent: a second complete changes nothing.
    observable.complete();
    assert_eq!(*first_completes.lock().unwrap(), 1);
    assert_eq!(*second_completes.lock().unwrap(), 1);
    assert_eq!(*teardowns.lock().unwrap(), 2);

    // Values pushed after completion never reach subscribers.
    emitters.lock().unwrap()[0].next(9);
    emitters.lock().unwrap()[1].next(9);
    assert!(nexts.lock().unwrap().is_empty());
}

#[test]
fn subscribing_after_completion_stays_silent() {
    let teardowns = Arc::new(Mutex::new(0_u32));
    let (mut observable, emitters) = stashing_observable(teardowns);

    observable.complete();

    let nexts: EmissionLog = Arc::new(Mutex::new(Vec::new()));
    let completes = Arc::new(Mutex::new(0_u32));
    observable.subscribe(logging_subscriber(&nexts, &completes));

    assert_eq!(
        emitters.lock().unwrap().len(),
        1,
        "the producer runs even for post-completion subscriptions"
    );

    emitters.lock().unwrap()[0].next(1);
    assert!(
        nexts.lock().unwrap().is_empty(),
        "a completed observable must drop every value"
    );
}

#[test]
fn teardown_runs_once_whichever_end_comes_first() {
    // Unsubscribe, then complete.
    let teardowns = Arc::new(Mutex::new(0_u32));
    let (mut observable, _) = stashing_observable(Arc::clone(&teardowns));
    let completes = Arc::new(Mutex::new(0_u32));
    let nexts: EmissionLog = Arc::new(Mutex::new(Vec::new()));

    let subscription = observable.subscribe(logging_subscriber(&nexts, &completes));
    subscription.unsubscribe();
    observable.complete();

    assert_eq!(*teardowns.lock().unwrap(), 1);
    assert_eq!(*completes.lock().unwrap(), 1);

    // Complete, then let the handle go.
    let teardowns = Arc::new(Mutex::new(0_u32));
    let (mut observable, _) = stashing_observable(Arc::clone(&teardowns));
    let completes = Arc::new(Mutex::new(0_u32));
    let nexts: EmissionLog = Arc::new(Mutex::new(Vec::new()));

    let subscription = observable.subscribe(logging_subscriber(&nexts, &completes));
    observable.complete();
    subscription.unsubscribe();

    assert_eq!(*teardowns.lock().unwrap(), 1);
    assert_eq!(
        *completes.lock().unwrap(),
        1,
        "the complete delivered at completion must not repeat on unsubscribe"
    );
}

#[test]
fn producer_error_is_delivered_once() {
    let mut observable = Observable::new(move |mut o: Subscriber<i32>| {
        o.error(Arc::new(std::fmt::Error));
        // A second report from a misbehaving producer must not get through.
        o.error(Arc::new(std::fmt::Error));
        o.next(1);
        Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
    });

    let nexts: EmissionLog = Arc::new(Mutex::new(Vec::new()));
    let nexts_in_subscriber = Arc::clone(&nexts);
    let errors = Arc::new(Mutex::new(0_u32));
    let errors_in_subscriber = Arc::clone(&errors);

    observable.subscribe(Subscriber::new(
        move |v| nexts_in_subscriber.lock().unwrap().push(v),
        move |_| *errors_in_subscriber.lock().unwrap() += 1,
        || {},
    ));

    assert_eq!(*errors.lock().unwrap(), 1);
    assert!(
        nexts.lock().unwrap().is_empty(),
        "a subscriber is spent once it has observed an error"
    );
}

#[test]
fn error_is_local_to_its_subscription() {
    let teardowns = Arc::new(Mutex::new(0_u32));
    let (mut observable, emitters) = stashing_observable(teardowns);

    let first_nexts: EmissionLog = Arc::new(Mutex::new(Vec::new()));
    let first_nexts_in_subscriber = Arc::clone(&first_nexts);
    let first_errors = Arc::new(Mutex::new(0_u32));
    let first_errors_in_subscriber = Arc::clone(&first_errors);
    observable.subscribe(Subscriber::new(
        move |v| first_nexts_in_subscriber.lock().unwrap().push(v),
        move |_| *first_errors_in_subscriber.lock().unwrap() += 1,
        || {},
    ));

    let second_nexts: EmissionLog = Arc::new(Mutex::new(Vec::new()));
    let second_nexts_in_subscriber = Arc::clone(&second_nexts);
    observable.subscribe(Subscriber::new(
        move |v| second_nexts_in_subscriber.lock().unwrap().push(v),
        |_| {},
        || {},
    ));

    emitters.lock().unwrap()[0].error(Arc::new(std::fmt::Error));
    emitters.lock().unwrap()[0].next(1);
    emitters.lock().unwrap()[1].next(2);

    assert_eq!(*first_errors.lock().unwrap(), 1);
    assert!(first_nexts.lock().unwrap().is_empty());
    assert_eq!(
        *second_nexts.lock().unwrap(),
        vec![2],
        "an error on one subscription must not affect its siblings"
    );
}

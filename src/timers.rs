//! Time-driven observables backed by tokio tasks.
//!
//! Both sources spawn their emitting task when subscribed, so subscribing
//! requires a tokio runtime. Each subscription runs its own timer: two
//! subscribers to the same `interval` each start counting from their own
//! subscribe call.

use std::sync::{Arc, Mutex};

use tokio::{sync::mpsc::channel, task, time};

use crate::{
    atom::Atom,
    observable::Observable,
    observer::Observer,
    subscription::subscribe::{Subscription, SubscriptionHandle, UnsubscribeLogic},
};

/// Creates an observable emitting the elapsed milliseconds every
/// `period_ms`, starting one period after subscription.
///
/// The stream never completes on its own; it keeps ticking until the
/// subscription is dropped with `unsubscribe`.
///
/// # Example
///
/// ```no_run
/// use tokio::time::{sleep, Duration};
///
/// use coals::subscribe::Subscriber;
/// use coals::{interval, Subscribeable, Unsubscribeable};
///
/// #[tokio::main]
/// async fn main() {
///     let mut ticks = interval(100);
///
///     let subscription =
///         ticks.subscribe(Subscriber::on_next(|ms| println!("{} ms elapsed", ms)));
///
///     sleep(Duration::from_millis(550)).await;
///     subscription.unsubscribe();
/// }
/// ```
pub fn interval(period_ms: u64) -> Observable<u64> {
    Observable::new(move |mut o| {
        let done = Arc::new(Mutex::new(false));
        let done_c = Arc::clone(&done);
        let (tx, mut rx) = channel::<()>(1);

        // Waits for the unsubscribe signal and stops the ticking task at its
        // next wakeup.
        task::spawn(async move {
            if rx.recv().await.is_some() {
                *done_c.lock().unwrap() = true;
            }
        });

        let join_handle = task::spawn(async move {
            let mut tick: u64 = 0;
            loop {
                time::sleep(time::Duration::from_millis(period_ms)).await;
                if *done.lock().unwrap() {
                    break;
                }
                tick += 1;
                o.next(tick * period_ms);
            }
        });

        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                let _ = tx.try_send(());
            })),
            SubscriptionHandle::JoinTask(join_handle),
        )
    })
}

/// Creates an observable that emits the elapsed milliseconds once, after
/// `due_ms`, and then completes itself.
///
/// The completion is observable-level: after the first subscription fires,
/// [`is_completed`](Observable::is_completed) reports `true` and every
/// remaining subscription receives its `complete` callback and is torn
/// down. Unsubscribing before the deadline cancels the pending emission for
/// that subscription.
///
/// # Example
///
/// ```no_run
/// use coals::subscribe::Subscriber;
/// use coals::{timeout, Subscribeable};
///
/// #[tokio::main]
/// async fn main() {
///     let mut deadline = timeout(500);
///
///     let subscription = deadline.subscribe(Subscriber::new(
///         |elapsed| println!("fired after {} ms", elapsed),
///         |e| eprintln!("{}", e),
///         || println!("done"),
///     ));
///
///     subscription.join().await.unwrap();
///     assert!(deadline.is_completed());
/// }
/// ```
pub fn timeout(due_ms: u64) -> Observable<u64> {
    let completed = Atom::new(false);
    let fire = completed.clone();

    Observable::with_completion(completed, move |mut o| {
        let done = Arc::new(Mutex::new(false));
        let done_c = Arc::clone(&done);
        let (tx, mut rx) = channel::<()>(1);

        task::spawn(async move {
            if rx.recv().await.is_some() {
                *done_c.lock().unwrap() = true;
            }
        });

        let fire = fire.clone();
        let join_handle = task::spawn(async move {
            time::sleep(time::Duration::from_millis(due_ms)).await;
            if *done.lock().unwrap() {
                return;
            }
            o.next(due_ms);
            fire.update(true);
            fire.reset();
        });

        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                let _ = tx.try_send(());
            })),
            SubscriptionHandle::JoinTask(join_handle),
        )
    })
}

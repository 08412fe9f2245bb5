//! `coals` is a small reactive library built around two primitives: the
//! [`Atom`] value cell, which notifies registered watchers on every update,
//! and push-based streams with the usual trio of signals: `next`, `error`
//! and `complete`.
//!
//! Streams come in three flavors:
//!
//! * [`Observable`], a cold stream. A producer function runs once per
//!   subscription, so every subscriber gets its own private run.
//! * [`Subject`], a hot multicast stream. Values pushed into it fan out to
//!   every current subscriber.
//! * [`Constant`], a subject that remembers its latest value and replays it
//!   synchronously to each new subscriber.
//!
//! Streams are transformed with the functions in [`operators`], composed
//! left to right with `pipe` or the [`pipe!`] macro:
//!
//! ```
//! use coals::operators::{filter, map};
//! use coals::subscribe::Subscriber;
//! use coals::{events, pipe, Subscribeable, Unsubscribeable};
//!
//! let clicks = events::<u32>();
//!
//! let mut tracked = clicks.pipe(pipe!(
//!     filter(|x| x % 2 == 0),
//!     map(|x| x * 10),
//! ));
//!
//! let subscription = tracked.subscribe(Subscriber::new(
//!     |v| println!("value {}", v),
//!     |e| eprintln!("stream failed: {}", e),
//!     || println!("stream finished"),
//! ));
//!
//! clicks.next(1); // filtered out
//! clicks.next(2); // prints "value 20"
//!
//! subscription.unsubscribe(); // prints "stream finished"
//! clicks.next(4); // no longer delivered
//! ```
//!
//! The [`interval`] and [`timeout`] sources emit on the tokio clock and
//! need a runtime; everything else is runtime-free and synchronous.
//!
//! Errors travel as `Arc<dyn Error + Send + Sync>` and stay local to the
//! subscription whose stream produced them: one failed subscriber does not
//! tear down the others.

mod atom;
mod observable;
mod observer;
pub mod operators;
mod subjects;
mod subscription;
mod timers;

pub use atom::{Atom, Unwatch};
pub use observable::{create, Observable};
pub use observer::Observer;
pub use subjects::{constant, events, of, Constant, Subject};
pub use subscription::subscribe;
pub use subscription::subscribe::{Subscribeable, Unsubscribeable};
pub use timers::{interval, timeout};

/// Composes operator functions left to right into a single operator.
///
/// `pipe!(a, b, c)` builds a closure that feeds an observable through `a`,
/// then `b`, then `c`. With no arguments it is the identity, so an empty
/// pipe leaves the stream untouched.
///
/// # Example
///
/// ```
/// use coals::operators::{filter, map};
/// use coals::subscribe::Subscriber;
/// use coals::{events, pipe, Subscribeable};
///
/// let numbers = events::<i32>();
/// let mut positive_squares = numbers.pipe(pipe!(filter(|v| *v > 0), map(|v| v * v)));
///
/// positive_squares.subscribe(Subscriber::on_next(|v| println!("{}", v)));
/// numbers.next(3); // prints "9"
/// numbers.next(-2); // filtered out
/// ```
#[macro_export]
macro_rules! pipe {
    () => {
        |x| x
    };
    ($f:expr $(, $rest:expr)* $(,)?) => {
        move |x| $crate::pipe!($($rest),*)(($f)(x))
    };
}

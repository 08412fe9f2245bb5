//! The `subjects` module provides hot, multicast sources. A subject serves
//! both as an observer and as an observable, allowing multiple observers to
//! subscribe to a single source and receive the values pushed into it.
//!
//! A subject behaves as an `Observer`, enabling `next()`, `error()` and
//! `complete()` calls. This also allows a subject to be passed as a parameter
//! to the `subscribe` method of an `Observable`, chaining a stream into it.
//!
//! It also implements `Subscribeable`, so `subscribe` and `unsubscribe` work
//! on it directly.
//!
//! Two varieties are provided: the basic [`Subject`], which delivers only
//! values pushed after subscription, and [`Constant`], which remembers the
//! latest value and replays it to each new subscriber.

mod constant;
mod subject;

pub use constant::*;
pub use subject::*;

/// Creates an event stream: a plain [`Subject`] with no subscribers yet.
///
/// # Example
///
/// ```
/// use coals::subscribe::Subscriber;
/// use coals::{events, Subscribeable};
///
/// let mut clicks = events::<u32>();
/// clicks.subscribe(Subscriber::on_next(|n| println!("click at {}", n)));
/// clicks.next(17);
/// ```
pub fn events<T: Clone + Send + 'static>() -> Subject<T> {
    Subject::new()
}

/// Creates a [`Constant`] holding `value` until something newer is pushed.
pub fn constant<T: Clone + Send + 'static>(value: T) -> Constant<T> {
    Constant::new(value)
}

/// Creates a [`Constant`] from a single value.
///
/// Alias for [`constant`]. In this library a single-value source is not a
/// distinct completed-after-one-emission stream: it keeps accepting pushes
/// and replaying the latest value, so `of` and `constant` coincide.
pub fn of<T: Clone + Send + 'static>(value: T) -> Constant<T> {
    Constant::new(value)
}

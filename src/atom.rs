//! Mutable value cell with synchronous change notification.
//!
//! `Atom` is the leaf primitive the stream types are built on: it stores a
//! value and an ordered list of watchers, fires them synchronously on
//! `update`, and signals completion by `reset`.

use std::sync::{Arc, Mutex};

type ChangeFn<T> = Box<dyn FnMut(T) + Send>;
type ResetFn = Box<dyn FnMut() + Send>;

struct Watch<T> {
    on_change: ChangeFn<T>,
    on_reset: Option<ResetFn>,
}

struct AtomCore<T> {
    value: T,
    watchers: Vec<(u64, Arc<Mutex<Watch<T>>>)>,
    key_seq: u64,
}

/// A shared mutable cell that notifies registered watchers on every update.
///
/// Watchers are invoked in registration order. During an `update` pass the
/// watcher list is read once at the start, so subscribing or unsubscribing
/// from inside a callback never affects the pass that is already running.
/// The stored value is written after the pass finishes, which means
/// [`Atom::value`] observed from inside a watcher still returns the previous
/// value; the new one is only available through the callback argument.
///
/// Cloning an `Atom` clones the handle, not the cell: all clones share the
/// same value and watcher list.
///
/// # Example
///
/// ```no_run
/// use coals::Atom;
///
/// let cell = Atom::new(1);
/// let watched = cell.add_watch(|v| println!("changed to {}", v));
///
/// cell.update(2); // prints "changed to 2"
/// assert_eq!(cell.value(), 2);
///
/// watched.remove();
/// cell.update(3); // no watcher left, value still stored
/// assert_eq!(cell.value(), 3);
/// ```
pub struct Atom<T> {
    core: Arc<Mutex<AtomCore<T>>>,
}

impl<T> Clone for Atom<T> {
    fn clone(&self) -> Self {
        Atom {
            core: Arc::clone(&self.core),
        }
    }
}

impl<T: Clone + Send + 'static> Atom<T> {
    pub fn new(value: T) -> Atom<T> {
        Atom {
            core: Arc::new(Mutex::new(AtomCore {
                value,
                watchers: Vec::new(),
                key_seq: 0,
            })),
        }
    }

    /// Returns a clone of the currently stored value.
    pub fn value(&self) -> T {
        self.core.lock().unwrap().value.clone()
    }

    /// Registers a change watcher. The returned [`Unwatch`] removes exactly
    /// this watcher when consumed.
    pub fn add_watch(&self, on_change: impl FnMut(T) + Send + 'static) -> Unwatch<T> {
        self.register(Box::new(on_change), None)
    }

    /// Registers a watcher with a reset hook. The hook fires when the cell is
    /// [`reset`](Atom::reset), which is how completion reaches watchers.
    pub fn add_watch_with_reset(
        &self,
        on_change: impl FnMut(T) + Send + 'static,
        on_reset: impl FnMut() + Send + 'static,
    ) -> Unwatch<T> {
        self.register(Box::new(on_change), Some(Box::new(on_reset)))
    }

    fn register(&self, on_change: ChangeFn<T>, on_reset: Option<ResetFn>) -> Unwatch<T> {
        let mut core = self.core.lock().unwrap();
        let key = core.key_seq;
        core.key_seq += 1;
        core.watchers
            .push((key, Arc::new(Mutex::new(Watch { on_change, on_reset }))));
        Unwatch {
            core: Arc::clone(&self.core),
            key,
        }
    }

    /// Stores `value` after invoking every registered `on_change` with a clone
    /// of it, in registration order. Returns the new value.
    pub fn update(&self, value: T) -> T {
        let pass: Vec<Arc<Mutex<Watch<T>>>> = {
            let core = self.core.lock().unwrap();
            core.watchers.iter().map(|(_, w)| Arc::clone(w)).collect()
        };
        for watch in pass {
            (watch.lock().unwrap().on_change)(value.clone());
        }
        self.core.lock().unwrap().value = value.clone();
        value
    }

    /// Clears the watcher list, then invokes every removed watcher's
    /// `on_reset` hook. Watchers registered from inside a hook survive the
    /// reset they were registered during.
    pub fn reset(&self) {
        let pass: Vec<(u64, Arc<Mutex<Watch<T>>>)> = {
            let mut core = self.core.lock().unwrap();
            core.watchers.drain(..).collect()
        };
        for (_, watch) in pass {
            let mut watch = watch.lock().unwrap();
            if let Some(on_reset) = watch.on_reset.as_mut() {
                on_reset();
            }
        }
    }

    /// Number of currently registered watchers.
    pub fn watcher_count(&self) -> usize {
        self.core.lock().unwrap().watchers.len()
    }
}

/// Removal handle returned by [`Atom::add_watch`]. Consuming it removes the
/// watcher it was created for; if the watcher is already gone the call is a
/// no-op.
pub struct Unwatch<T> {
    core: Arc<Mutex<AtomCore<T>>>,
    key: u64,
}

impl<T> Unwatch<T> {
    pub fn remove(self) {
        let key = self.key;
        self.core
            .lock()
            .unwrap()
            .watchers
            .retain(|(k, _)| *k != key);
    }
}

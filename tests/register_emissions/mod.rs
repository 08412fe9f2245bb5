use std::sync::{Arc, Mutex};

use coals::subscribe::Subscriber;

pub type EmissionLog = Arc<Mutex<Vec<i32>>>;
pub type SignalLog = Arc<Mutex<u32>>;

/// Shared logs filled in by the subscribers a test registers: emitted values,
/// complete-call count and error-call count.
pub struct Emissions {
    pub nexts: EmissionLog,
    pub completes: SignalLog,
    pub errors: SignalLog,
}

impl Emissions {
    pub fn new() -> Emissions {
        Emissions {
            nexts: Arc::new(Mutex::new(Vec::new())),
            completes: Arc::new(Mutex::new(0)),
            errors: Arc::new(Mutex::new(0)),
        }
    }

    /// Builds a subscriber recording every signal it receives into the logs.
    pub fn subscriber(&self) -> Subscriber<i32> {
        let nexts = Arc::clone(&self.nexts);
        let completes = Arc::clone(&self.completes);
        let errors = Arc::clone(&self.errors);
        Subscriber::new(
            move |n| nexts.lock().unwrap().push(n),
            move |_| *errors.lock().unwrap() += 1,
            move || *completes.lock().unwrap() += 1,
        )
    }

    pub fn nexts(&self) -> Vec<i32> {
        self.nexts.lock().unwrap().clone()
    }

    pub fn completes(&self) -> u32 {
        *self.completes.lock().unwrap()
    }

    pub fn errors(&self) -> u32 {
        *self.errors.lock().unwrap()
    }
}

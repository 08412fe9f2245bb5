use std::{error::Error, sync::Arc};

/// Capability set of a subscription target: receive a value, a completion
/// signal, or an error.
///
/// Implemented by [`Subscriber`](crate::subscribe::Subscriber) and by the
/// subject types, which is what lets one stream be chained into another as a
/// sink.
pub trait Observer {
    type NextFnType;

    fn next(&mut self, _: Self::NextFnType);
    fn complete(&mut self);
    fn error(&mut self, _: Arc<dyn Error + Send + Sync>);
}

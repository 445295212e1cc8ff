//! Error sink port: where an event bus reports subscriber failures.

use std::sync::Arc;

use spacehub_domain::id::SubscriptionId;

use crate::event_bus::SubscriberError;

/// Receives failures raised by subscribers while an event was delivered.
///
/// A bus holds exactly one sink for its whole life. Implementations must not
/// panic; the bus does not guard calls into the sink.
pub trait ErrorSink: Send + Sync {
    /// Report that `subscription` failed to handle an event.
    fn report(&self, subscription: SubscriptionId, error: &SubscriberError);
}

impl<T: ErrorSink + ?Sized> ErrorSink for Arc<T> {
    fn report(&self, subscription: SubscriptionId, error: &SubscriberError) {
        (**self).report(subscription, error);
    }
}

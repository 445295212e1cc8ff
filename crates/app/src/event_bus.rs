//! In-process, synchronous publish/subscribe bus for a single event type.
//!
//! The bus is split in two capabilities:
//! - [`EventBus`] can emit and complete; it stays private to whoever owns the
//!   stream (a physical space owns its occupancy bus).
//! - [`EventSource`] can only subscribe and unsubscribe; it is what consumers
//!   get.
//!
//! Delivery happens on the emitting thread, in registration order. There is
//! no buffering and no replay: a subscriber sees only events emitted after it
//! subscribed.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{ReentrantMutex, RwLock};
use spacehub_domain::id::SubscriptionId;

use crate::ports::ErrorSink;

/// Failure raised by a subscriber while handling an event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscriberError {
    /// The handler returned an error.
    #[error("subscriber rejected event: {0}")]
    Rejected(String),

    /// The handler panicked; the payload message is kept when it is a string.
    #[error("subscriber panicked: {0}")]
    Panicked(String),
}

impl SubscriberError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }

    fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|msg| (*msg).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::Panicked(message)
    }
}

/// Receives events from a bus.
///
/// Handlers run on the emitting thread, so a slow handler slows the producer.
pub trait Subscriber<T>: Send + Sync {
    /// Handle one event.
    ///
    /// # Errors
    ///
    /// An error is reported to the bus's error sink and then handed back
    /// through [`Subscriber::on_error`]; it never reaches the emitter.
    fn on_next(&self, event: &T) -> Result<(), SubscriberError>;

    /// Called after this subscriber failed to handle an event.
    fn on_error(&self, _error: &SubscriberError) {}

    /// Called once when the bus is torn down.
    fn on_completed(&self) {}
}

impl<T, S: Subscriber<T> + ?Sized> Subscriber<T> for Arc<S> {
    fn on_next(&self, event: &T) -> Result<(), SubscriberError> {
        (**self).on_next(event)
    }

    fn on_error(&self, error: &SubscriberError) {
        (**self).on_error(error);
    }

    fn on_completed(&self) {
        (**self).on_completed();
    }
}

struct FnSubscriber<F>(F);

impl<T, F> Subscriber<T> for FnSubscriber<F>
where
    F: Fn(&T) -> Result<(), SubscriberError> + Send + Sync,
{
    fn on_next(&self, event: &T) -> Result<(), SubscriberError> {
        (self.0)(event)
    }
}

/// Default error sink: logs every failure with `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn report(&self, subscription: SubscriptionId, error: &SubscriberError) {
        tracing::error!(%subscription, %error, "subscriber failed while handling event");
    }
}

struct Entry<T> {
    id: SubscriptionId,
    active: Arc<AtomicBool>,
    /// Held around every callback, so `on_completed` never overlaps or
    /// precedes an `on_next` already in flight on another thread.
    delivery: ReentrantMutex<()>,
    subscriber: Arc<dyn Subscriber<T>>,
}

struct Shared<T> {
    entries: RwLock<Vec<Arc<Entry<T>>>>,
    completed: AtomicBool,
    sink: Arc<dyn ErrorSink>,
}

trait Detach: Send + Sync {
    fn detach(&self, id: SubscriptionId);
}

impl<T> Detach for Shared<T> {
    fn detach(&self, id: SubscriptionId) {
        self.entries.write().retain(|entry| entry.id != id);
    }
}

impl<T: 'static> Shared<T> {
    fn subscribe(self: &Arc<Self>, subscriber: Arc<dyn Subscriber<T>>) -> Subscription {
        let id = SubscriptionId::new();
        let active = Arc::new(AtomicBool::new(false));
        let weak = Arc::downgrade(self);
        let bus: Weak<dyn Detach> = weak;
        let subscription = Subscription {
            id,
            active: Arc::clone(&active),
            bus,
        };

        let registered = {
            let mut entries = self.entries.write();
            if self.completed.load(Ordering::SeqCst) {
                false
            } else {
                active.store(true, Ordering::SeqCst);
                entries.push(Arc::new(Entry {
                    id,
                    active,
                    delivery: ReentrantMutex::new(()),
                    subscriber: Arc::clone(&subscriber),
                }));
                true
            }
        };

        if registered {
            tracing::debug!(subscription = %id, "subscribed");
        } else {
            self.guard(id, "on_completed", || subscriber.on_completed());
        }
        subscription
    }

    fn emit(&self, event: &T) -> usize {
        if self.completed.load(Ordering::SeqCst) {
            return 0;
        }
        let snapshot = self.entries.read().clone();
        let mut delivered = 0;
        for entry in snapshot {
            let _delivery = entry.delivery.lock();
            if !entry.active.load(Ordering::SeqCst) {
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| entry.subscriber.on_next(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(error)) => self.fail(&entry, &error),
                Err(payload) => self.fail(&entry, &SubscriberError::from_panic(&*payload)),
            }
        }
        delivered
    }

    fn fail(&self, entry: &Entry<T>, error: &SubscriberError) {
        self.sink.report(entry.id, error);
        self.guard(entry.id, "on_error", || entry.subscriber.on_error(error));
    }

    /// Run a notification callback, reporting a panic to the sink.
    fn guard(&self, id: SubscriptionId, callback: &'static str, notify: impl FnOnce()) {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(notify)) {
            let error = SubscriberError::from_panic(&*payload);
            tracing::warn!(subscription = %id, callback, %error, "subscriber callback panicked");
            self.sink.report(id, &error);
        }
    }

    fn complete(&self) {
        let drained = {
            let mut entries = self.entries.write();
            if self.completed.swap(true, Ordering::SeqCst) {
                return;
            }
            std::mem::take(&mut *entries)
        };
        for entry in drained {
            if entry.active.swap(false, Ordering::SeqCst) {
                let _delivery = entry.delivery.lock();
                self.guard(entry.id, "on_completed", || entry.subscriber.on_completed());
            }
        }
    }
}

/// Handle to one registration on a bus.
///
/// Dropping the handle does **not** unsubscribe; call
/// [`Subscription::unsubscribe`] for that.
#[derive(Clone)]
pub struct Subscription {
    id: SubscriptionId,
    active: Arc<AtomicBool>,
    bus: Weak<dyn Detach>,
}

impl Subscription {
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Whether the subscriber may still receive events.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop delivery to this subscriber.
    ///
    /// Safe to call while an emit is in flight, including from inside the
    /// subscriber's own handler. Once this returns, no emit that starts
    /// afterwards reaches the subscriber. Calling it again is a no-op.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(bus) = self.bus.upgrade() {
            bus.detach(self.id);
        }
        tracing::debug!(subscription = %self.id, "unsubscribed");
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Subscribe-only view of a bus. Cheap to clone.
pub struct EventSource<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for EventSource<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: 'static> EventSource<T> {
    /// Register a subscriber. Delivery starts with the next emitted event.
    ///
    /// Subscribing to a completed bus calls `on_completed` right away and
    /// returns an inactive subscription.
    pub fn subscribe(&self, subscriber: impl Subscriber<T> + 'static) -> Subscription {
        self.shared.subscribe(Arc::new(subscriber))
    }

    /// Register a closure as a subscriber.
    pub fn subscribe_fn<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) -> Result<(), SubscriberError> + Send + Sync + 'static,
    {
        self.subscribe(FnSubscriber(handler))
    }

    /// Same as [`Subscription::unsubscribe`].
    pub fn unsubscribe(&self, subscription: &Subscription) {
        subscription.unsubscribe();
    }

    /// Number of currently registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.shared.entries.read().len()
    }
}

impl<T> fmt::Debug for EventSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSource")
            .field("subscribers", &self.shared.entries.read().len())
            .field("completed", &self.shared.completed.load(Ordering::SeqCst))
            .finish()
    }
}

/// Owning side of a bus: everything [`EventSource`] can do, plus emit.
pub struct EventBus<T> {
    source: EventSource<T>,
}

impl<T: 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> EventBus<T> {
    /// Create a bus that logs subscriber failures through [`LogErrorSink`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_error_sink(Arc::new(LogErrorSink))
    }

    /// Create a bus reporting subscriber failures to `sink`.
    #[must_use]
    pub fn with_error_sink(sink: Arc<dyn ErrorSink>) -> Self {
        Self {
            source: EventSource {
                shared: Arc::new(Shared {
                    entries: RwLock::new(Vec::new()),
                    completed: AtomicBool::new(false),
                    sink,
                }),
            },
        }
    }

    /// Hand out a subscribe-only capability.
    #[must_use]
    pub fn source(&self) -> EventSource<T> {
        self.source.clone()
    }

    /// See [`EventSource::subscribe`].
    pub fn subscribe(&self, subscriber: impl Subscriber<T> + 'static) -> Subscription {
        self.source.subscribe(subscriber)
    }

    /// See [`EventSource::subscribe_fn`].
    pub fn subscribe_fn<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) -> Result<(), SubscriberError> + Send + Sync + 'static,
    {
        self.source.subscribe_fn(handler)
    }

    /// See [`Subscription::unsubscribe`].
    pub fn unsubscribe(&self, subscription: &Subscription) {
        subscription.unsubscribe();
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.source.subscriber_count()
    }

    /// Deliver `event` to every active subscriber, in registration order, on
    /// the calling thread.
    ///
    /// Returns how many subscribers handled the event without failing.
    /// Failures are reported to the error sink and never propagate.
    pub fn emit(&self, event: &T) -> usize {
        self.source.shared.emit(event)
    }

    /// Tear the bus down: every active subscriber gets `on_completed` and is
    /// released. Later emits are dropped. Idempotent.
    pub fn complete(&self) {
        self.source.shared.complete();
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.source.shared.completed.load(Ordering::SeqCst)
    }
}

impl<T> fmt::Debug for EventBus<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("source", &self.source)
            .finish()
    }
}

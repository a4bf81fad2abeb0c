//! Synchronous publish/subscribe keyed by event name.
//!
//! The bus is in-memory only. Callbacks run on the publishing thread in
//! registration order; publishing to an event nobody listens to is a no-op.

use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, trace};

/// Callback invoked with the event payload.
pub type EventCallback = Arc<dyn Fn(&JsonValue) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<String, Vec<(u64, EventCallback)>>,
}

impl Registry {
    fn is_registered(&self, event: &str, id: u64) -> bool {
        self.listeners
            .get(event)
            .is_some_and(|entries| entries.iter().any(|(entry_id, _)| *entry_id == id))
    }
}

/// Process-wide publish/subscribe registry.
///
/// Cloning is cheap; clones share the same registry.
///
/// # Example
///
/// ```
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
/// use tableau_core::EventBus;
///
/// let bus = EventBus::new();
/// let hits = Arc::new(AtomicUsize::new(0));
/// let counter = hits.clone();
/// let subscription = bus.subscribe("audio_finished", move |_| {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// bus.emit("audio_finished");
/// subscription.unsubscribe();
/// bus.emit("audio_finished");
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// ```
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.lock();
        f.debug_struct("EventBus")
            .field("events", &registry.listeners.len())
            .finish()
    }
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `callback` for `event` and returns its unsubscribe handle.
    pub fn subscribe<F>(&self, event: impl Into<String>, callback: F) -> Subscription
    where
        F: Fn(&JsonValue) + Send + Sync + 'static,
    {
        let event = event.into();
        let mut registry = self.lock();
        registry.next_id += 1;
        let id = registry.next_id;
        registry
            .listeners
            .entry(event.clone())
            .or_default()
            .push((id, Arc::new(callback)));
        trace!(event = %event, id, "Subscribed");
        Subscription {
            registry: Arc::downgrade(&self.registry),
            event,
            id,
        }
    }

    /// Delivers `payload` to every subscriber of `event`.
    ///
    /// Subscribers are snapshotted before dispatch, so callbacks may
    /// subscribe, unsubscribe or publish without deadlocking. A subscriber
    /// removed mid-dispatch is not called afterwards.
    pub fn publish(&self, event: &str, payload: JsonValue) {
        let snapshot: Vec<(u64, EventCallback)> = match self.lock().listeners.get(event) {
            Some(entries) if !entries.is_empty() => entries.clone(),
            _ => return,
        };
        debug!(event, subscribers = snapshot.len(), "Publishing event");
        for (id, callback) in snapshot {
            if !self.lock().is_registered(event, id) {
                continue;
            }
            callback(&payload);
        }
    }

    /// Publishes `event` without a payload.
    pub fn emit(&self, event: &str) {
        self.publish(event, JsonValue::Null);
    }

    /// Number of live subscribers for `event`.
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.lock().listeners.get(event).map_or(0, Vec::len)
    }
}

/// Handle returned by [`EventBus::subscribe`].
///
/// Dropping the handle keeps the subscription alive; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug, Clone)]
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    event: String,
    id: u64,
}

impl Subscription {
    /// Removes the callback. Calling this more than once is harmless.
    pub fn unsubscribe(&self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entries) = registry.listeners.get_mut(&self.event) {
            entries.retain(|(id, _)| *id != self.id);
            if entries.is_empty() {
                registry.listeners.remove(&self.event);
            }
        }
        trace!(event = %self.event, id = self.id, "Unsubscribed");
    }

    /// Event this subscription listens to.
    pub fn event(&self) -> &str {
        &self.event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let bus = EventBus::new();
        bus.publish("nobody", json!(1));
        assert_eq!(bus.subscriber_count("nobody"), 0);
    }

    #[test]
    fn test_subscribers_run_in_registration_order() {
        let bus = EventBus::new();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let seen = seen.clone();
            bus.subscribe("tick", move |payload| {
                seen.lock().unwrap().push(format!("{tag}:{payload}"));
            });
        }
        bus.publish("tick", json!(7));
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["first:7", "second:7", "third:7"]
        );
    }

    #[test]
    fn test_unsubscribe_during_dispatch() {
        let bus = EventBus::new();
        let calls = Arc::new(StdMutex::new(Vec::new()));

        let late_calls = calls.clone();
        let slot: Arc<StdMutex<Option<Subscription>>> = Arc::new(StdMutex::new(None));

        let killer_slot = slot.clone();
        let killer_calls = calls.clone();
        bus.subscribe("go", move |_| {
            killer_calls.lock().unwrap().push("killer");
            if let Some(sub) = killer_slot.lock().unwrap().as_ref() {
                sub.unsubscribe();
            }
        });
        let victim = bus.subscribe("go", move |_| {
            late_calls.lock().unwrap().push("victim");
        });
        *slot.lock().unwrap() = Some(victim);

        bus.emit("go");
        assert_eq!(*calls.lock().unwrap(), vec!["killer"]);
        assert_eq!(bus.subscriber_count("go"), 1);
    }

    #[test]
    fn test_callbacks_may_publish() {
        let bus = EventBus::new();
        let hits = Arc::new(StdMutex::new(0));
        let inner_bus = bus.clone();
        bus.subscribe("outer", move |_| inner_bus.emit("inner"));
        let counter = hits.clone();
        bus.subscribe("inner", move |_| *counter.lock().unwrap() += 1);
        bus.emit("outer");
        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let bus = EventBus::new();
        let sub = bus.subscribe("x", |_| {});
        sub.unsubscribe();
        sub.unsubscribe();
        assert_eq!(bus.subscriber_count("x"), 0);
    }
}

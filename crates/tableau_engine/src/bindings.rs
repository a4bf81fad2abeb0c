//! Declarative `on`/`do` scene event bindings.

use serde_json::Value as JsonValue;
use tableau_core::{ActionList, EventBus, Scene, Subscription};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace};

/// A bound event fired; its actions await execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Triggered {
    /// Event that fired
    pub event: String,
    /// Event payload
    pub payload: JsonValue,
    /// Actions bound to the event
    pub actions: ActionList,
}

/// Live subscriptions for one scene's `events` section.
///
/// Bus callbacks run synchronously, so they only forward a [`Triggered`]
/// into the channel; the owner drains it through the engine. Dropping the
/// bindings unsubscribes them.
#[derive(Debug, Default)]
pub struct SceneEventBindings {
    subscriptions: Vec<Subscription>,
}

impl SceneEventBindings {
    /// Subscribes every binding of `scene` on `bus`.
    pub fn attach(bus: &EventBus, scene: &Scene, sink: UnboundedSender<Triggered>) -> Self {
        let subscriptions = scene
            .events()
            .iter()
            .filter(|binding| !binding.actions().is_empty())
            .map(|binding| {
                let event = binding.on().clone();
                let actions = binding.actions().clone();
                let sink = sink.clone();
                bus.subscribe(event.clone(), move |payload| {
                    trace!(event = %event, "Scene binding fired");
                    // A closed channel means the session is gone.
                    let _ = sink.send(Triggered {
                        event: event.clone(),
                        payload: payload.clone(),
                        actions: actions.clone(),
                    });
                })
            })
            .collect::<Vec<_>>();
        debug!(bindings = subscriptions.len(), "Attached scene events");
        Self { subscriptions }
    }

    /// Number of live bindings.
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// True when nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Unsubscribes everything.
    pub fn detach(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
    }
}

impl Drop for SceneEventBindings {
    fn drop(&mut self) {
        self.detach();
    }
}

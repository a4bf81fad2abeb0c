//! Visibility rules.

use serde_json::{Map, Value as JsonValue};
use tableau_core::{Element, Scene};
use tableau_expression::{Context, evaluate_condition};
use tableau_state::StateStore;
use tracing::{debug, instrument};

/// Re-evaluates every visibility condition on the current slide.
///
/// Elements with both an id and a condition get their result written into
/// `activeElements`; all other entries are left alone. Nested groups are
/// walked depth-first. The store is only written when a flag changed, so
/// applying the rules twice is a no-op the second time.
///
/// Returns true when `activeElements` was updated.
#[instrument(skip_all, fields(slide = store.slide_index()))]
pub fn apply_visibility(store: &StateStore, scene: &Scene) -> bool {
    let context = Context::from_store(store);
    let current = match store.get("activeElements") {
        Some(JsonValue::Object(map)) => map,
        _ => Map::new(),
    };

    let mut next = current.clone();
    for element in scene.elements_at(store.slide_index()) {
        evaluate_element(element, &context, &mut next);
    }

    if next == current {
        return false;
    }
    debug!(elements = next.len(), "Visibility changed");
    store.set("activeElements", JsonValue::Object(next));
    true
}

fn evaluate_element(element: &Element, context: &Context, active: &mut Map<String, JsonValue>) {
    if let (Some(id), Some(condition)) = (element.id(), element.visible_if()) {
        active.insert(
            id.clone(),
            JsonValue::Bool(evaluate_condition(condition, context)),
        );
    }
    for child in element.elements() {
        evaluate_element(child, context, active);
    }
}

//! Evaluation context.

use crate::Value;
use serde_json::{Map, Value as JsonValue};
use tableau_state::StateStore;

/// Names visible to an expression.
///
/// Every runtime state key is a top-level identifier. `state` names the
/// whole state mapping and `custom` the custom-variable view, whose `get`
/// member is an accessor function; both shadow state keys of the same name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    state: Map<String, JsonValue>,
    custom: Map<String, JsonValue>,
}

impl Context {
    /// Context over explicit state and custom maps.
    pub fn new(state: Map<String, JsonValue>, custom: Map<String, JsonValue>) -> Self {
        Self { state, custom }
    }

    /// Snapshot of the store's current state and custom view.
    pub fn from_store(store: &StateStore) -> Self {
        Self::new(store.get_all(), store.custom_view())
    }

    /// Resolve a top-level identifier.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        match name {
            "custom" => Some(Value::Custom),
            "state" => Some(Value::Object(self.state.clone())),
            _ => self.state.get(name).map(Value::from),
        }
    }

    /// Custom variable by key (`undefined` when absent).
    pub fn custom(&self, key: &str) -> Value {
        self.custom.get(key).map_or(Value::Undefined, Value::from)
    }

    /// Runtime state mapping.
    pub fn state(&self) -> &Map<String, JsonValue> {
        &self.state
    }
}

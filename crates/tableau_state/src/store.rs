//! The state store.

use crate::persistence::{
    DEFAULT_STATUS_KEY, DEFAULT_STATUS_VALUE, PERSISTED_KEYS, default_state, persistence_tier,
};
use serde_json::{Map, Value as JsonValue};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tableau_core::value::{number, parse_int_prefix, to_display_string, to_number};
use tableau_core::{EventBus, PersistenceTier};
use tableau_interface::BackingStore;
use tracing::{debug, instrument, warn};

#[derive(Debug, Default)]
struct StoreData {
    state: Map<String, JsonValue>,
    custom: Map<String, JsonValue>,
    custom_local: Map<String, JsonValue>,
    custom_session: Map<String, JsonValue>,
}

impl StoreData {
    fn tier_map(&self, tier: PersistenceTier) -> &Map<String, JsonValue> {
        match tier {
            PersistenceTier::Local => &self.custom_local,
            PersistenceTier::Session => &self.custom_session,
        }
    }

    fn tier_map_mut(&mut self, tier: PersistenceTier) -> &mut Map<String, JsonValue> {
        match tier {
            PersistenceTier::Local => &mut self.custom_local,
            PersistenceTier::Session => &mut self.custom_session,
        }
    }
}

/// Canonical owner of runtime state and custom variables.
///
/// Construct one per session with [`StateStore::load`]. Mutations publish
/// `state:<key>:changed` / `state:changed` (or the `custom:` equivalents)
/// on the bus and then persist best-effort; a failed write is logged and
/// the in-memory value is kept.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use serde_json::json;
/// use tableau_core::EventBus;
/// use tableau_state::{MemoryBackingStore, StateStore};
///
/// let store = StateStore::load(
///     "simulator_state_demo",
///     EventBus::new(),
///     Arc::new(MemoryBackingStore::new("session")),
///     Arc::new(MemoryBackingStore::new("local")),
/// );
/// store.set("score", json!(5));
/// store.set("score", json!("+3"));
/// assert_eq!(store.get("score"), Some(json!(8)));
/// ```
pub struct StateStore {
    data: Mutex<StoreData>,
    bus: EventBus,
    session: Arc<dyn BackingStore>,
    local: Arc<dyn BackingStore>,
    namespace: String,
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("namespace", &self.namespace)
            .field("session", &self.session.label())
            .field("local", &self.local.label())
            .finish()
    }
}

impl StateStore {
    /// Builds a store and hydrates it from the backing stores.
    ///
    /// Missing or corrupt entries fall back to defaults; hydration never fails.
    #[instrument(skip_all, fields(ns = %namespace.as_ref()))]
    pub fn load(
        namespace: impl AsRef<str>,
        bus: EventBus,
        session: Arc<dyn BackingStore>,
        local: Arc<dyn BackingStore>,
    ) -> Self {
        let store = Self {
            data: Mutex::new(StoreData {
                state: default_state(),
                ..Default::default()
            }),
            bus,
            session,
            local,
            namespace: namespace.as_ref().to_string(),
        };
        store.hydrate();
        store
    }

    fn lock(&self) -> MutexGuard<'_, StoreData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn backing(&self, tier: PersistenceTier) -> &dyn BackingStore {
        match tier {
            PersistenceTier::Local => self.local.as_ref(),
            PersistenceTier::Session => self.session.as_ref(),
        }
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    fn custom_storage_key(&self, tier: PersistenceTier) -> String {
        format!("{}:custom_store:{}", self.namespace, tier)
    }

    fn read_json(&self, tier: PersistenceTier, storage_key: &str) -> Option<JsonValue> {
        let raw = self.backing(tier).get(storage_key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = storage_key, tier = %tier, error = %e, "Ignoring corrupt persisted value");
                None
            }
        }
    }

    fn hydrate(&self) {
        let mut data = self.lock();

        for key in PERSISTED_KEYS {
            let Some(tier) = persistence_tier(key) else {
                continue;
            };
            if let Some(value) = self.read_json(tier, &self.storage_key(key)) {
                data.state.insert(key.to_string(), value);
            }
        }

        if !data.state.get("assignments").is_some_and(JsonValue::is_array) {
            data.state
                .insert("assignments".into(), JsonValue::Array(Vec::new()));
        }

        for tier in [PersistenceTier::Local, PersistenceTier::Session] {
            let map = match self.read_json(tier, &self.custom_storage_key(tier)) {
                Some(JsonValue::Object(map)) => map,
                Some(other) if !other.is_null() => {
                    warn!(tier = %tier, "Custom store is not an object, discarding");
                    Map::new()
                }
                _ => Map::new(),
            };
            *data.tier_map_mut(tier) = map;
        }

        let mut unified = data.custom_local.clone();
        unified.extend(data.custom_session.clone());
        data.custom = unified;

        debug!(
            keys = data.state.len(),
            custom = data.custom.len(),
            "Hydrated state store"
        );
    }

    /// Event bus the store publishes on.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Key prefix used in the backing stores.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Value of one state key.
    pub fn get(&self, key: &str) -> Option<JsonValue> {
        self.lock().state.get(key).cloned()
    }

    /// Snapshot of the full state mapping.
    pub fn get_all(&self) -> Map<String, JsonValue> {
        self.lock().state.clone()
    }

    /// `slideIndex` as an index (0 when unset or not a number).
    pub fn slide_index(&self) -> usize {
        self.get("slideIndex")
            .map(|v| to_number(&v))
            .filter(|n| n.is_finite() && *n > 0.0)
            .map_or(0, |n| n as usize)
    }

    /// Sets a state key.
    ///
    /// A string value starting with `+` adds its integer suffix to the
    /// current numeric value (`"+2"`, `"+-1"`); `"true"`/`"false"` become
    /// booleans. Publishes the change, then persists declared keys.
    #[instrument(skip(self, value))]
    pub fn set(&self, key: &str, value: impl Into<JsonValue>) {
        let value = value.into();
        let (resolved, snapshot) = {
            let mut data = self.lock();
            let resolved = resolve_assignment(data.state.get(key), value);
            data.state.insert(key.to_string(), resolved.clone());
            (resolved, data.state.clone())
        };
        debug!(key, value = %resolved, "State updated");

        self.bus
            .publish(&format!("state:{}:changed", key), resolved.clone());
        self.bus.publish("state:changed", JsonValue::Object(snapshot));
        self.persist_key(key, &resolved);
    }

    fn persist_key(&self, key: &str, value: &JsonValue) {
        let Some(tier) = persistence_tier(key) else {
            return;
        };
        let storage_key = self.storage_key(key);
        match serde_json::to_string(value) {
            Ok(json) => {
                if let Err(e) = self.backing(tier).set(&storage_key, &json) {
                    warn!(key, tier = %tier, error = %e, "Failed to persist state key");
                }
            }
            Err(e) => warn!(key, error = %e, "Failed to serialize state key"),
        }
    }

    /// Value of one custom variable from the unified view.
    pub fn get_custom(&self, key: &str) -> Option<JsonValue> {
        self.lock().custom.get(key).cloned()
    }

    /// Snapshot of the unified custom view.
    pub fn custom_view(&self) -> Map<String, JsonValue> {
        self.lock().custom.clone()
    }

    /// Last value written for `key` into one tier's custom store.
    pub fn custom_in_tier(&self, tier: PersistenceTier, key: &str) -> Option<JsonValue> {
        self.lock().tier_map(tier).get(key).cloned()
    }

    /// Sets a custom variable.
    ///
    /// The unified view always takes the value; with a tier the value is
    /// also recorded in that tier's store and the store is persisted.
    #[instrument(skip(self, value))]
    pub fn set_custom(&self, key: &str, value: impl Into<JsonValue>, tier: Option<PersistenceTier>) {
        let value = value.into();
        let (view, tier_snapshot) = {
            let mut data = self.lock();
            data.custom.insert(key.to_string(), value.clone());
            let tier_snapshot = tier.map(|tier| {
                let map = data.tier_map_mut(tier);
                map.insert(key.to_string(), value.clone());
                (tier, map.clone())
            });
            (data.custom.clone(), tier_snapshot)
        };
        debug!(key, value = %value, "Custom variable updated");

        if let Some((tier, map)) = tier_snapshot {
            self.persist_custom_store(tier, &map);
        }

        self.bus
            .publish(&format!("custom:{}:changed", key), value);
        self.bus.publish("custom:changed", JsonValue::Object(view));
    }

    fn persist_custom_store(&self, tier: PersistenceTier, map: &Map<String, JsonValue>) {
        let storage_key = self.custom_storage_key(tier);
        match serde_json::to_string(map) {
            Ok(json) => {
                if let Err(e) = self.backing(tier).set(&storage_key, &json) {
                    warn!(tier = %tier, error = %e, "Failed to persist custom store");
                }
            }
            Err(e) => warn!(tier = %tier, error = %e, "Failed to serialize custom store"),
        }
    }

    /// Current assignment records.
    pub fn assignments(&self) -> Vec<JsonValue> {
        match self.get("assignments") {
            Some(JsonValue::Array(items)) => items,
            _ => Vec::new(),
        }
    }

    /// Replaces the assignment list with externally sourced records.
    pub fn replace_assignments(&self, records: Vec<JsonValue>) {
        self.set("assignments", JsonValue::Array(records));
    }

    /// Marks an assignment as submitted using the default status field.
    pub fn mark_assignment_complete(&self, assignment: &str) {
        self.mark_assignment_complete_with(
            assignment,
            DEFAULT_STATUS_KEY,
            JsonValue::from(DEFAULT_STATUS_VALUE),
        );
    }

    /// Writes `status_key: status_value` on the record whose `name` or `id`
    /// matches `assignment`, appending a minimal record when none does.
    ///
    /// Records are replaced, never edited in place, and the list is
    /// persisted before `state:assignments:changed` is published.
    #[instrument(skip(self, status_value))]
    pub fn mark_assignment_complete_with(
        &self,
        assignment: &str,
        status_key: &str,
        status_value: JsonValue,
    ) {
        let list = {
            let mut data = self.lock();
            let current = match data.state.get("assignments") {
                Some(JsonValue::Array(items)) => items.clone(),
                _ => Vec::new(),
            };

            let position = current.iter().position(|record| {
                ["name", "id"].iter().any(|field| {
                    record
                        .get(field)
                        .filter(|v| !v.is_null())
                        .is_some_and(|v| to_display_string(v) == assignment)
                })
            });

            let list: Vec<JsonValue> = match position {
                Some(index) => current
                    .into_iter()
                    .enumerate()
                    .map(|(i, record)| match (i == index, record) {
                        (true, JsonValue::Object(mut fields)) => {
                            fields.insert(status_key.to_string(), status_value.clone());
                            JsonValue::Object(fields)
                        }
                        (_, record) => record,
                    })
                    .collect(),
                None => {
                    let mut record = Map::new();
                    record.insert("id".into(), JsonValue::from(assignment));
                    record.insert("name".into(), JsonValue::from(assignment));
                    record.insert(status_key.to_string(), status_value.clone());
                    let mut list = current;
                    list.push(JsonValue::Object(record));
                    list
                }
            };

            data.state
                .insert("assignments".into(), JsonValue::Array(list.clone()));
            list
        };
        debug!(
            assignment,
            records = list.len(),
            "Assignment marked complete"
        );

        let list = JsonValue::Array(list);
        self.persist_key("assignments", &list);
        self.bus.publish("state:assignments:changed", list);
    }
}

/// Applies the increment and boolean-string rules to an incoming value.
fn resolve_assignment(current: Option<&JsonValue>, value: JsonValue) -> JsonValue {
    match value {
        JsonValue::String(text) => {
            if let Some(delta) = text.strip_prefix('+') {
                let delta = parse_int_prefix(delta).unwrap_or(0) as f64;
                let base = current
                    .map(to_number)
                    .filter(|n| n.is_finite())
                    .unwrap_or(0.0);
                number(base + delta)
            } else if text == "true" {
                JsonValue::Bool(true)
            } else if text == "false" {
                JsonValue::Bool(false)
            } else {
                JsonValue::String(text)
            }
        }
        other => other,
    }
}

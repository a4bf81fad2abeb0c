//! Reserved keys, their defaults and their persistence tiers.

use serde_json::{Map, Value as JsonValue, json};
use tableau_core::PersistenceTier;

/// Status field written by `mark_assignment_complete` when none is given.
pub const DEFAULT_STATUS_KEY: &str = "submissionstatus";

/// Status value written by `mark_assignment_complete` when none is given.
pub const DEFAULT_STATUS_VALUE: &str = "submitted";

/// Tier a runtime state key persists to, or `None` for in-memory keys.
///
/// ```
/// use tableau_core::PersistenceTier;
/// use tableau_state::persistence_tier;
///
/// assert_eq!(persistence_tier("slideIndex"), Some(PersistenceTier::Session));
/// assert_eq!(persistence_tier("score"), Some(PersistenceTier::Local));
/// assert_eq!(persistence_tier("slideCount"), None);
/// ```
pub fn persistence_tier(key: &str) -> Option<PersistenceTier> {
    match key {
        "slideIndex" | "currentSceneFile" | "activeElements" | "videoId" | "assignments" => {
            Some(PersistenceTier::Session)
        }
        "score" | "current_role" => Some(PersistenceTier::Local),
        _ => None,
    }
}

/// Keys hydrated from storage at load time.
pub(crate) const PERSISTED_KEYS: [&str; 7] = [
    "slideIndex",
    "currentSceneFile",
    "activeElements",
    "videoId",
    "assignments",
    "score",
    "current_role",
];

/// Fresh runtime state.
pub fn default_state() -> Map<String, JsonValue> {
    let mut state = Map::new();
    state.insert("slideIndex".into(), json!(0));
    state.insert("currentSceneFile".into(), JsonValue::Null);
    state.insert("activeElements".into(), json!({}));
    state.insert("videoId".into(), JsonValue::Null);
    state.insert("score".into(), json!(0));
    state.insert("current_role".into(), JsonValue::Null);
    state.insert("assignments".into(), json!([]));
    state
}

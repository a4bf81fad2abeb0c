//! Key/value persistence.

use tableau_error::PersistenceError;

/// A string key/value store backing one persistence tier.
///
/// Values are opaque strings; the state store owns serialization.
pub trait BackingStore: Send + Sync {
    /// Stored value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Short name used in logs (e.g. "session", "local").
    fn label(&self) -> &str {
        "store"
    }
}

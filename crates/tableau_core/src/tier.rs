//! Persistence tiers.

use serde::{Deserialize, Serialize};

/// Which backing store a value is written to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PersistenceTier {
    /// Long-lived store (survives browser/session restarts)
    Local,
    /// Session-scoped store
    Session,
}

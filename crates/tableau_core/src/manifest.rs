//! Module manifest.
//!
//! The manifest is the entry document of a module: display metadata plus the
//! list of scenes, one of which is the start scene.

use crate::looks_like_html;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tableau_error::{ManifestError, ManifestErrorKind};
use tracing::{debug, instrument};

/// Skip condition satisfied when the learner already has progress records.
const SKIP_IF_HAS_PROGRESS: &str = "user_has_any_phase_progress";

/// The manifest `meta` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct ManifestMeta {
    /// Module title
    #[serde(default)]
    name: Option<String>,
    /// Module description
    #[serde(default)]
    description: Option<String>,
    /// Id of the first scene
    #[serde(default)]
    start_scene: Option<String>,
    /// Whether launch parameters are mandatory
    #[serde(default)]
    require_login: bool,
    /// Stylesheet path
    #[serde(default)]
    skin: Option<String>,
    /// Icon path
    #[serde(default, alias = "favicon")]
    icon: Option<String>,
    /// Theme color
    #[serde(default)]
    theme_color: Option<String>,
    /// Other metadata
    #[serde(flatten)]
    extra: Map<String, JsonValue>,
}

/// One entry of the manifest `scenes` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct ManifestScene {
    /// Scene id
    id: String,
    /// Scene document path
    file: String,
    /// Conditions under which this scene is skipped
    #[serde(default)]
    skip_if: Vec<String>,
    /// Scene id to use when skipped
    #[serde(default)]
    next: Option<String>,
}

/// Parsed and validated module manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct Manifest {
    /// Module metadata
    meta: ManifestMeta,
    /// Declared scenes
    scenes: Vec<ManifestScene>,
}

impl Manifest {
    /// Parses and validates a manifest fetched from `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is HTML, is not YAML, is empty, or lacks
    /// the `meta` section or the `scenes` list.
    #[instrument(skip(text), fields(source = %source, len = text.len()))]
    pub fn from_yaml_str(text: &str, source: &str) -> Result<Self, ManifestError> {
        if looks_like_html(text) {
            return Err(ManifestError::new(ManifestErrorKind::WrongContentType(
                source.to_string(),
            )));
        }

        let document: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| {
            ManifestError::new(ManifestErrorKind::Parse {
                url: source.to_string(),
                message: e.to_string(),
            })
        })?;

        let Some(mapping) = document.as_mapping() else {
            return Err(ManifestError::new(ManifestErrorKind::Empty(
                source.to_string(),
            )));
        };
        if mapping.get("meta").is_none_or(serde_yaml::Value::is_null) {
            return Err(ManifestError::new(ManifestErrorKind::MissingMeta(
                source.to_string(),
            )));
        }
        if !mapping.get("scenes").is_some_and(serde_yaml::Value::is_sequence) {
            return Err(ManifestError::new(ManifestErrorKind::MissingScenes(
                source.to_string(),
            )));
        }

        let manifest: Manifest = serde_yaml::from_value(document).map_err(|e| {
            ManifestError::new(ManifestErrorKind::Parse {
                url: source.to_string(),
                message: e.to_string(),
            })
        })?;
        debug!(scenes = manifest.scenes.len(), "Parsed manifest");
        Ok(manifest)
    }

    /// Looks up a scene entry by id.
    pub fn scene(&self, id: &str) -> Option<&ManifestScene> {
        self.scenes.iter().find(|scene| scene.id == id)
    }

    /// Picks the file of the first scene to show.
    ///
    /// The start scene is skipped in favour of its `next` scene when one of
    /// its `skipIf` conditions holds. Unknown conditions never hold.
    ///
    /// # Errors
    ///
    /// Returns an error if the start scene or the `next` scene is not declared.
    pub fn resolve_initial_scene(&self, assignments: &[JsonValue]) -> Result<&str, ManifestError> {
        let start = self.meta.start_scene.clone().unwrap_or_default();
        let scene = self
            .scene(&start)
            .ok_or_else(|| ManifestError::new(ManifestErrorKind::UnknownStartScene(start.clone())))?;

        let should_skip = scene.skip_if.iter().any(|condition| match condition.as_str() {
            SKIP_IF_HAS_PROGRESS => !assignments.is_empty(),
            _ => false,
        });

        if let (true, Some(next_id)) = (should_skip, &scene.next) {
            let next = self.scene(next_id).ok_or_else(|| {
                ManifestError::new(ManifestErrorKind::UnknownNextScene(next_id.clone()))
            })?;
            debug!(from = %scene.id, to = %next.id, "Skipping start scene");
            return Ok(&next.file);
        }

        Ok(&scene.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MANIFEST: &str = r#"
meta:
  name: Electro
  startScene: welcome
  requireLogin: true
scenes:
  - id: welcome
    file: welcome.yaml
    skipIf: [user_has_any_phase_progress]
    next: hub
  - id: hub
    file: hub.yaml
"#;

    #[test]
    fn test_initial_scene_without_progress() {
        let manifest = Manifest::from_yaml_str(MANIFEST, "manifest.yaml").unwrap();
        assert!(*manifest.meta().require_login());
        assert_eq!(manifest.resolve_initial_scene(&[]).unwrap(), "welcome.yaml");
    }

    #[test]
    fn test_initial_scene_skips_with_progress() {
        let manifest = Manifest::from_yaml_str(MANIFEST, "manifest.yaml").unwrap();
        let progress = vec![json!({"id": "t1"})];
        assert_eq!(manifest.resolve_initial_scene(&progress).unwrap(), "hub.yaml");
    }

    #[test]
    fn test_validation_errors() {
        let err = Manifest::from_yaml_str("scenes: []", "m").unwrap_err();
        assert!(matches!(err.kind, ManifestErrorKind::MissingMeta(_)));

        let err = Manifest::from_yaml_str("meta: {name: x}\nscenes: nope", "m").unwrap_err();
        assert!(matches!(err.kind, ManifestErrorKind::MissingScenes(_)));

        let err = Manifest::from_yaml_str("<!DOCTYPE html>", "m").unwrap_err();
        assert!(matches!(err.kind, ManifestErrorKind::WrongContentType(_)));

        let err = Manifest::from_yaml_str("meta: [unclosed", "m").unwrap_err();
        assert!(matches!(err.kind, ManifestErrorKind::Parse { .. }));
    }

    #[test]
    fn test_unknown_start_scene() {
        let manifest =
            Manifest::from_yaml_str("meta: {startScene: ghost}\nscenes: []", "m").unwrap();
        let err = manifest.resolve_initial_scene(&[]).unwrap_err();
        assert!(matches!(err.kind, ManifestErrorKind::UnknownStartScene(ref s) if s == "ghost"));
    }
}

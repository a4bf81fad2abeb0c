//! Scene document parsing.

use tableau_core::{Scene, looks_like_html};
use tableau_error::{SceneError, SceneErrorKind};

/// Parses a fetched scene document.
///
/// The scene payload may sit at the top level or under a `scene` key.
///
/// # Errors
///
/// Rejects HTML pages, invalid YAML, empty documents and payloads that do
/// not match the scene shape.
///
/// ```
/// use tableau_scene::parse_scene_document;
///
/// let scene = parse_scene_document("scene:\n  slides:\n    - id: a\n", "a.yaml").unwrap();
/// assert_eq!(scene.slides().len(), 1);
/// assert_eq!(scene.source_file().as_deref(), Some("a.yaml"));
/// ```
pub fn parse_scene_document(text: &str, source: &str) -> Result<Scene, SceneError> {
    if looks_like_html(text) {
        return Err(SceneError::new(SceneErrorKind::WrongContentType(
            source.to_string(),
        )));
    }

    let parse_error = |e: serde_yaml::Error| {
        SceneError::new(SceneErrorKind::Parse {
            url: source.to_string(),
            message: e.to_string(),
        })
    };

    let document: serde_yaml::Value = serde_yaml::from_str(text).map_err(parse_error)?;
    let payload = match document {
        serde_yaml::Value::Mapping(mut mapping) => match mapping.remove("scene") {
            Some(scene) if scene.is_mapping() => scene,
            _ => serde_yaml::Value::Mapping(mapping),
        },
        _ => {
            return Err(SceneError::new(SceneErrorKind::EmptyDocument(
                source.to_string(),
            )));
        }
    };

    let scene: Scene = serde_yaml::from_value(payload).map_err(parse_error)?;
    Ok(scene.with_source_file(source))
}

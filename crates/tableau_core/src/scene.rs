//! Scene document model.
//!
//! A scene is parsed from YAML: shared `assets`, declarative `events`, and
//! an ordered list of `slides`, each holding a tree of elements.

use crate::ActionList;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeMap, HashMap};

/// Scene-level metadata from the `meta` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters)]
pub struct SceneMeta {
    /// Display title
    #[serde(default)]
    title: Option<String>,
    /// Any other metadata keys
    #[serde(flatten)]
    extra: Map<String, JsonValue>,
}

/// One named asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters)]
pub struct AssetEntry {
    /// Relative or absolute source path
    #[serde(default)]
    src: Option<String>,
    /// Renderer-specific properties (titles, posters, ...)
    #[serde(flatten)]
    props: Map<String, JsonValue>,
}

impl AssetEntry {
    /// Creates an entry with only a source path.
    pub fn from_src(src: impl Into<String>) -> Self {
        Self {
            src: Some(src.into()),
            props: Map::new(),
        }
    }
}

/// The `assets` section, grouped by media type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters)]
pub struct AssetCatalog {
    /// Images by name
    #[serde(default)]
    images: BTreeMap<String, AssetEntry>,
    /// Audio clips by name
    #[serde(default)]
    audios: BTreeMap<String, AssetEntry>,
    /// Videos by name
    #[serde(default)]
    videos: BTreeMap<String, AssetEntry>,
}

impl AssetCatalog {
    /// Builds a catalog from explicit groups.
    pub fn new(
        images: BTreeMap<String, AssetEntry>,
        audios: BTreeMap<String, AssetEntry>,
        videos: BTreeMap<String, AssetEntry>,
    ) -> Self {
        Self {
            images,
            audios,
            videos,
        }
    }

    /// Total number of declared assets.
    pub fn len(&self) -> usize {
        self.images.len() + self.audios.len() + self.videos.len()
    }

    /// True when no assets are declared.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A declarative `on`/`do` binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct EventBinding {
    /// Event name to listen for
    on: String,
    /// Actions to run when it fires
    #[serde(rename = "do", default)]
    actions: ActionList,
}

impl EventBinding {
    /// Creates a binding.
    pub fn new(on: impl Into<String>, actions: ActionList) -> Self {
        Self {
            on: on.into(),
            actions,
        }
    }
}

/// A node in a slide's element tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters)]
pub struct Element {
    /// Element id (target of show/hide and visibility rules)
    #[serde(default)]
    id: Option<String>,
    /// Renderer type (`button`, `card`, `group`, ...)
    #[serde(rename = "type", default)]
    kind: Option<String>,
    /// Static default visibility
    #[serde(default)]
    visible: Option<bool>,
    /// Visibility condition
    #[serde(default, alias = "visibleIf", alias = "visibleIfCondition")]
    visible_if: Option<String>,
    /// Animation name or sequence
    #[serde(default)]
    animate: Option<JsonValue>,
    /// Actions run on interaction
    #[serde(default)]
    action: ActionList,
    /// Actions run when the element is entered
    #[serde(default)]
    on_enter: ActionList,
    /// Nested elements
    #[serde(default)]
    elements: Vec<Element>,
    /// Renderer-specific properties (position, text, src, ...)
    #[serde(flatten)]
    props: Map<String, JsonValue>,
}

impl Element {
    /// Creates an element with an id, optional condition and children.
    pub fn new(
        id: Option<String>,
        visible_if: Option<String>,
        elements: Vec<Element>,
    ) -> Self {
        Self {
            id,
            visible_if,
            elements,
            ..Default::default()
        }
    }

    /// Effective visibility given the active-element overrides.
    ///
    /// An override wins; otherwise the static `visible` flag; otherwise visible.
    pub fn is_visible(&self, active_elements: &Map<String, JsonValue>) -> bool {
        match self.id.as_ref().and_then(|id| active_elements.get(id)) {
            Some(flag) => flag == &JsonValue::Bool(true),
            None => self.visible.unwrap_or(true),
        }
    }
}

/// One screen within a scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters)]
pub struct Slide {
    /// Unique id within the scene
    #[serde(default)]
    id: Option<String>,
    /// Background asset name or URL
    #[serde(default)]
    background: Option<String>,
    /// Transition animation
    #[serde(default)]
    animate: Option<JsonValue>,
    /// Actions run on entry
    #[serde(default)]
    on_enter: ActionList,
    /// Element tree
    #[serde(default)]
    elements: Vec<Element>,
}

impl Slide {
    /// Creates a slide.
    pub fn new(id: impl Into<String>, on_enter: ActionList, elements: Vec<Element>) -> Self {
        Self {
            id: Some(id.into()),
            on_enter,
            elements,
            ..Default::default()
        }
    }
}

/// A loaded scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters)]
pub struct Scene {
    /// Scene metadata
    #[serde(default)]
    meta: SceneMeta,
    /// Declared assets
    #[serde(default)]
    assets: AssetCatalog,
    /// Declarative event bindings
    #[serde(default)]
    events: Vec<EventBinding>,
    /// Ordered slides
    #[serde(default)]
    slides: Vec<Slide>,
    /// Scene-level entry actions
    #[serde(default)]
    on_enter: ActionList,
    /// Scene-level background
    #[serde(default)]
    background: Option<String>,
    /// Elements for slide-less scenes
    #[serde(default)]
    elements: Vec<Element>,
    /// Resolved asset name to URL, attached by the loader
    #[serde(skip)]
    asset_index: HashMap<String, String>,
    /// File this scene was loaded from
    #[serde(skip)]
    source_file: Option<String>,
}

impl Scene {
    /// Creates a scene from slides and assets.
    pub fn new(slides: Vec<Slide>, assets: AssetCatalog) -> Self {
        Self {
            slides,
            assets,
            ..Default::default()
        }
    }

    /// Attach resolved asset URLs.
    pub fn with_asset_index(mut self, index: HashMap<String, String>) -> Self {
        self.asset_index = index;
        self
    }

    /// Record the file the scene came from.
    pub fn with_source_file(mut self, file: impl Into<String>) -> Self {
        self.source_file = Some(file.into());
        self
    }

    /// Attach event bindings.
    pub fn with_events(mut self, events: Vec<EventBinding>) -> Self {
        self.events = events;
        self
    }

    /// Attach scene-level entry actions.
    pub fn with_on_enter(mut self, on_enter: ActionList) -> Self {
        self.on_enter = on_enter;
        self
    }

    /// Index of the slide with `id`.
    pub fn slide_position(&self, id: &str) -> Option<usize> {
        self.slides
            .iter()
            .position(|slide| slide.id.as_deref() == Some(id))
    }

    /// Elements shown at `slide_index` (scene elements for slide-less scenes).
    pub fn elements_at(&self, slide_index: usize) -> &[Element] {
        if self.slides.is_empty() {
            &self.elements
        } else {
            self.slides
                .get(slide_index)
                .map(|slide| slide.elements.as_slice())
                .unwrap_or(&[])
        }
    }

    /// Resolved URL for an asset name, if the loader indexed it.
    pub fn resolve_asset(&self, name: &str) -> Option<&str> {
        self.asset_index.get(name).map(String::as_str)
    }

    /// Slide ids that appear more than once.
    pub fn duplicate_slide_ids(&self) -> Vec<String> {
        let mut seen = HashMap::new();
        for id in self.slides.iter().filter_map(|s| s.id.as_deref()) {
            *seen.entry(id).or_insert(0usize) += 1;
        }
        let mut duplicates: Vec<String> = seen
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(id, _)| id.to_string())
            .collect();
        duplicates.sort();
        duplicates
    }
}

/// True when a fetched document is an HTML page rather than YAML.
///
/// Static hosts commonly answer missing files with an HTML error or SPA
/// fallback page and a 200 status.
pub fn looks_like_html(text: &str) -> bool {
    let trimmed = text.trim_start();
    ["<!DOCTYPE", "<!doctype", "<html", "<HTML"]
        .iter()
        .any(|prefix| trimmed.starts_with(prefix))
}

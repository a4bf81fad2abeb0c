//! Asset extraction.

use std::collections::{BTreeMap, HashMap};
use tableau_core::{AssetEntry, Scene};
use tableau_error::SceneError;
use tableau_interface::PathResolver;

/// A scene's assets resolved to retrievable URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedAssets {
    /// Asset name to resolved URL, across all groups
    pub indexed: HashMap<String, String>,
    /// Image URLs
    pub images: Vec<String>,
    /// Audio URLs
    pub audio: Vec<String>,
    /// Videos as `(authored src, resolved URL)`
    pub videos: Vec<(String, String)>,
}

impl ExtractedAssets {
    /// Number of assets to preload (or skip) before the scene is ready.
    pub fn total(&self) -> usize {
        self.images.len() + self.audio.len() + self.videos.len()
    }
}

/// Resolves every asset of `scene` through `resolver`.
///
/// Entries without a `src` are ignored. When two groups reuse a name, the
/// later group (images, then audios, then videos) wins in the index.
///
/// # Errors
///
/// Returns the first resolution failure.
pub fn extract_assets(
    scene: &Scene,
    resolver: &dyn PathResolver,
) -> Result<ExtractedAssets, SceneError> {
    let mut extracted = ExtractedAssets::default();
    let assets = scene.assets();

    for (name, _, url) in resolve_group(assets.images(), resolver)? {
        extracted.indexed.insert(name, url.clone());
        extracted.images.push(url);
    }
    for (name, _, url) in resolve_group(assets.audios(), resolver)? {
        extracted.indexed.insert(name, url.clone());
        extracted.audio.push(url);
    }
    for (name, src, url) in resolve_group(assets.videos(), resolver)? {
        extracted.indexed.insert(name, url.clone());
        extracted.videos.push((src, url));
    }

    Ok(extracted)
}

fn resolve_group(
    group: &BTreeMap<String, AssetEntry>,
    resolver: &dyn PathResolver,
) -> Result<Vec<(String, String, String)>, SceneError> {
    group
        .iter()
        .filter_map(|(name, entry)| {
            entry
                .src()
                .as_deref()
                .filter(|src| !src.trim().is_empty())
                .map(|src| (name, src))
        })
        .map(|(name, src)| Ok((name.clone(), src.to_string(), resolver.resolve(src)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BaseUrlResolver;
    use tableau_core::AssetCatalog;

    #[test]
    fn test_extract_groups_and_index() {
        let mut images = BTreeMap::new();
        images.insert("board".to_string(), AssetEntry::from_src("img/board.png"));
        images.insert("empty".to_string(), AssetEntry::default());
        let mut audios = BTreeMap::new();
        audios.insert("click".to_string(), AssetEntry::from_src("audio/click.mp3"));
        let mut videos = BTreeMap::new();
        videos.insert(
            "lecture".to_string(),
            AssetEntry::from_src("https://drive.google.com/file/d/x/preview"),
        );
        let scene = Scene::new(vec![], AssetCatalog::new(images, audios, videos));
        let resolver = BaseUrlResolver::new("https://cdn.example.com/m").unwrap();

        let extracted = extract_assets(&scene, &resolver).unwrap();
        assert_eq!(extracted.total(), 3);
        assert_eq!(
            extracted.indexed.get("board").map(String::as_str),
            Some("https://cdn.example.com/m/img/board.png")
        );
        assert_eq!(
            extracted.videos[0].0,
            "https://drive.google.com/file/d/x/preview"
        );
        assert!(!extracted.indexed.contains_key("empty"));
    }
}

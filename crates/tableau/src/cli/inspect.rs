//! Scene inspection command handler.

use super::source::ModuleSource;
use tableau::{
    Element, PathResolver, TableauConfig, TableauResult, extract_assets, parse_scene_document,
};
use tracing::instrument;

/// Prints slides, conditional elements, bindings and assets of one scene.
#[instrument(skip(config))]
pub async fn inspect_scene(
    scene: &str,
    source: Option<&str>,
    config: &TableauConfig,
) -> TableauResult<()> {
    let module = ModuleSource::open(source, config)?;
    let url = module.resolver.resolve(scene)?;
    let text = module.fetcher.fetch_text(&url).await?;
    let parsed = parse_scene_document(&text, scene)?;
    let assets = extract_assets(&parsed, module.resolver.as_ref())?;

    println!("{}", url);
    if let Some(title) = parsed.meta().title() {
        println!("  title: {}", title);
    }
    println!(
        "  assets: {} image(s), {} audio, {} video(s)",
        assets.images.len(),
        assets.audio.len(),
        assets.videos.len()
    );
    if !parsed.on_enter().is_empty() {
        println!("  on_enter: {} action(s)", parsed.on_enter().as_slice().len());
    }
    for binding in parsed.events() {
        println!(
            "  on {} -> {} action(s)",
            binding.on(),
            binding.actions().as_slice().len()
        );
    }

    for (index, slide) in parsed.slides().iter().enumerate() {
        println!(
            "  [{}] {} ({} element(s))",
            index,
            slide.id().as_deref().unwrap_or("-"),
            count_elements(slide.elements())
        );
        print_conditions(slide.elements(), 2);
    }

    for id in parsed.duplicate_slide_ids() {
        println!("  duplicate slide id: {}", id);
    }
    Ok(())
}

fn count_elements(elements: &[Element]) -> usize {
    elements
        .iter()
        .map(|element| 1 + count_elements(element.elements()))
        .sum()
}

fn print_conditions(elements: &[Element], depth: usize) {
    for element in elements {
        if let (Some(id), Some(condition)) = (element.id(), element.visible_if()) {
            println!("{:indent$}{} if {}", "", id, condition, indent = depth * 2);
        }
        print_conditions(element.elements(), depth + 1);
    }
}

//! Interactive module runner.

use super::source::ModuleSource;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;
use tableau::{
    ActionEngine, ConfigError, EventBus, FileBackingStore, MemoryBackingStore, RawAction,
    SceneLoader, Session, StateStore, TableauConfig, TableauResult, UrlPreloader, load_manifest,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, instrument, warn};

/// Runs a module, executing one action per stdin line.
///
/// A line is either action text (`set:score:+1`) or JSON: an action object
/// or a list of actions. After each line the state snapshot is printed.
#[instrument(skip(config))]
pub async fn run_module(
    source: Option<&str>,
    scene: Option<&str>,
    config: &TableauConfig,
) -> TableauResult<()> {
    let module = ModuleSource::open(source, config)?;

    let session_tier = Arc::new(MemoryBackingStore::new("session"));
    let local_tier = Arc::new(FileBackingStore::open(config.storage_dir(), "local")?);
    let store = Arc::new(StateStore::load(
        config.storage_namespace(),
        EventBus::new(),
        session_tier,
        local_tier,
    ));

    let loader = SceneLoader::from_config(
        module.fetcher.clone(),
        module.resolver.clone(),
        Arc::new(UrlPreloader::new()),
        store.bus().clone(),
        config,
    );
    let engine = Arc::new(
        ActionEngine::new(store.clone())
            .with_resolver(module.resolver.clone())
            .with_default_wait(Duration::from_millis(*config.default_wait_ms())),
    );

    let _progress = store.bus().subscribe("scene:progress", |payload| {
        info!(progress = %payload["progress"], "Loading");
    });
    let _errors = store.bus().subscribe("scene:error", |payload| {
        warn!(message = %payload["message"], "Scene failed to load");
    });

    let session = Session::start(store.clone(), loader, engine)?;
    match scene {
        Some(file) => session.open_scene(file),
        None => {
            let manifest = load_manifest(module.fetcher.as_ref(), &module.manifest_url).await?;
            let initial = manifest.resolve_initial_scene(&store.assignments())?;
            info!(scene = %initial, "Opening initial scene");
            session.open_scene(initial);
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| ConfigError::new(format!("Failed to read stdin: {}", e)))?
    {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        session.execute(&parse_line(line)).await;
        let snapshot = JsonValue::Object(store.get_all());
        println!("{}", snapshot);
    }

    info!("Input closed");
    Ok(())
}

fn parse_line(line: &str) -> Vec<RawAction> {
    if line.starts_with('{') || line.starts_with('[') {
        match serde_json::from_str::<JsonValue>(line) {
            Ok(JsonValue::Array(items)) => {
                return items
                    .into_iter()
                    .filter_map(|item| serde_json::from_value(item).ok())
                    .collect();
            }
            Ok(value) => {
                if let Ok(action) = serde_json::from_value(value) {
                    return vec![action];
                }
            }
            Err(e) => warn!(error = %e, "Input is not JSON; running it as action text"),
        }
    }
    vec![RawAction::from(line)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_forms() {
        assert_eq!(parse_line("next_slide"), vec![RawAction::from("next_slide")]);

        let list = parse_line(r#"["show:a", {"type": "hide", "arg": "b"}]"#);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0], RawAction::from("show:a"));
        assert!(matches!(list[1], RawAction::Structured(_)));

        assert_eq!(parse_line("{oops"), vec![RawAction::from("{oops")]);
    }
}

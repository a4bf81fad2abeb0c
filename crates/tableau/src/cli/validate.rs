//! Module validation command handler.

use super::source::ModuleSource;
use tableau::{
    PathResolver, TableauConfig, TableauResult, extract_assets, load_manifest,
    parse_scene_document,
};
use tracing::{info, instrument, warn};

/// Outcome of validating a module.
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Scenes that parsed
    pub passed: Vec<String>,
    /// Scenes that failed, with the reason
    pub failed: Vec<(String, String)>,
    /// Non-fatal findings
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// True when every scene parsed.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Fetches the manifest and parses every declared scene.
///
/// Manifest failures are errors; scene failures are collected in the report.
#[instrument(skip(config))]
pub async fn validate_module(
    source: Option<&str>,
    config: &TableauConfig,
) -> TableauResult<ValidationReport> {
    let module = ModuleSource::open(source, config)?;
    let manifest = load_manifest(module.fetcher.as_ref(), &module.manifest_url).await?;

    let mut report = ValidationReport::default();
    if let Err(e) = manifest.resolve_initial_scene(&[]) {
        report.warnings.push(e.kind.to_string());
    }

    for entry in manifest.scenes() {
        let file = entry.file();
        match check_scene(&module, file).await {
            Ok(mut warnings) => {
                report.passed.push(file.clone());
                report.warnings.append(&mut warnings);
            }
            Err(message) => report.failed.push((file.clone(), message)),
        }
    }

    println!(
        "{}: {} scene(s), {} passed, {} failed",
        module.manifest_url,
        manifest.scenes().len(),
        report.passed.len(),
        report.failed.len()
    );
    for (file, message) in &report.failed {
        println!("  FAIL {}: {}", file, message);
    }
    for warning in &report.warnings {
        println!("  warn {}", warning);
    }

    info!(
        passed = report.passed.len(),
        failed = report.failed.len(),
        "Validation finished"
    );
    Ok(report)
}

async fn check_scene(module: &ModuleSource, file: &str) -> Result<Vec<String>, String> {
    let url = module.resolver.resolve(file).map_err(|e| e.message())?;
    let text = module
        .fetcher
        .fetch_text(&url)
        .await
        .map_err(|e| e.message())?;
    let scene = parse_scene_document(&text, file).map_err(|e| e.message())?;
    extract_assets(&scene, module.resolver.as_ref()).map_err(|e| e.message())?;

    let mut warnings = Vec::new();
    for id in scene.duplicate_slide_ids() {
        warn!(file, id = %id, "Duplicate slide id");
        warnings.push(format!("{}: duplicate slide id '{}'", file, id));
    }
    if scene.slides().is_empty() {
        warnings.push(format!("{}: no slides", file));
    }
    Ok(warnings)
}

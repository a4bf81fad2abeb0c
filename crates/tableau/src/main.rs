//! Tableau CLI binary.
//!
//! This binary provides command-line access to Tableau's functionality:
//! - Validate a module manifest and every scene it declares
//! - Inspect a single scene document
//! - Run a module interactively, feeding actions from stdin

use clap::Parser;
use tableau::{TableauConfig, init_tracing};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, inspect_scene, run_module, validate_module};

    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    init_tracing(cli.verbose).map_err(|e| e as Box<dyn std::error::Error>)?;

    let config = match &cli.config {
        Some(path) => TableauConfig::load_from(path)?,
        None => TableauConfig::load()?,
    };

    // Execute the requested command
    match cli.command {
        Commands::Validate { source } => {
            let report = validate_module(source.as_deref(), &config).await?;
            if !report.is_clean() {
                std::process::exit(1);
            }
        }

        Commands::Inspect { scene, source } => {
            inspect_scene(&scene, source.as_deref(), &config).await?;
        }

        Commands::Run { source, scene } => {
            run_module(source.as_deref(), scene.as_deref(), &config).await?;
        }
    }

    Ok(())
}

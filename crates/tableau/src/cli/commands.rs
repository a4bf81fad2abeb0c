//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tableau - interactive scene and slide presentation runtime
#[derive(Parser, Debug)]
#[command(name = "tableau")]
#[command(about = "Interactive scene and slide presentation runtime", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file overlaid on the bundled defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a module manifest and every scene it declares
    Validate {
        /// Manifest URL, manifest file or module directory
        /// (defaults to the configured module)
        source: Option<String>,
    },

    /// Print the structure of one scene document
    Inspect {
        /// Scene path relative to the module
        scene: String,

        /// Manifest URL, manifest file or module directory
        #[arg(long)]
        source: Option<String>,
    },

    /// Run a module, reading one action per line from stdin
    Run {
        /// Manifest URL, manifest file or module directory
        source: Option<String>,

        /// Open this scene instead of the manifest's start scene
        #[arg(long)]
        scene: Option<String>,
    },
}

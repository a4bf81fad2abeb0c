//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the tableau binary.

mod commands;
mod inspect;
mod run;
mod source;
mod validate;

pub use commands::{Cli, Commands};
pub use inspect::inspect_scene;
pub use run::run_module;
pub use validate::validate_module;

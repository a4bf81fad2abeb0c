//! Action execution engine for the Tableau presentation runtime.
//!
//! [`ActionEngine`] interprets the action language against a
//! [`StateStore`](tableau_state::StateStore): visibility overrides,
//! navigation, media, timers, remote submission, state and custom-variable
//! mutation, command calls and conditionals.
//!
//! Supporting pieces:
//!
//! - [`CommandTable`]: named targets for `call:<name>:<arg>`
//! - [`ResourceRegistry`]: timers and playbacks released on navigation
//! - [`apply_visibility`]: re-evaluates `visible_if` rules for the current slide
//! - [`SceneEventBindings`]: forwards a scene's `on`/`do` bindings into a channel

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod audio;
mod bindings;
mod commands;
mod engine;
mod resources;
mod visibility;

pub use audio::SilentAudioOutput;
pub use bindings::{SceneEventBindings, Triggered};
pub use commands::{Command, CommandTable, EngineCommand, StoreCommand};
pub use engine::ActionEngine;
pub use resources::ResourceRegistry;
pub use visibility::apply_visibility;

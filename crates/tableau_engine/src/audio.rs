//! Headless audio output.

use tableau_error::SceneError;
use tableau_interface::{AudioOutput, Playback};
use tracing::debug;

/// Audio output that plays nothing.
///
/// Used by the headless runner and as the engine default; playbacks are
/// still tracked so navigation cleanup behaves the same.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentAudioOutput;

#[derive(Debug)]
struct SilentPlayback {
    src: String,
}

impl Playback for SilentPlayback {
    fn stop(&self) {
        debug!(src = %self.src, "Stopped silent playback");
    }
}

impl AudioOutput for SilentAudioOutput {
    fn play(&self, src: &str) -> Result<Box<dyn Playback>, SceneError> {
        debug!(src, "Playing silently");
        Ok(Box::new(SilentPlayback {
            src: src.to_string(),
        }))
    }
}

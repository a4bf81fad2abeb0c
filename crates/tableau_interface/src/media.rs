//! Media preloading and audio playback.

use async_trait::async_trait;
use tableau_error::SceneError;

/// Warms media so it is ready before a scene is shown.
///
/// Each method resolves once the asset is usable. Timeouts are applied by
/// the caller.
#[async_trait]
pub trait MediaPreloader: Send + Sync {
    /// Fetch and decode an image.
    async fn preload_image(&self, url: &str) -> Result<(), SceneError>;

    /// Buffer an audio clip until it can play through.
    async fn preload_audio(&self, url: &str) -> Result<(), SceneError>;

    /// Buffer a video until it can play through.
    async fn preload_video(&self, url: &str) -> Result<(), SceneError>;
}

/// A playing sound.
pub trait Playback: Send + Sync {
    /// Stop playback. Calling this on a finished sound is harmless.
    fn stop(&self);
}

/// Starts sounds.
pub trait AudioOutput: Send + Sync {
    /// Begin playing `src` and return its handle.
    fn play(&self, src: &str) -> Result<Box<dyn Playback>, SceneError>;
}

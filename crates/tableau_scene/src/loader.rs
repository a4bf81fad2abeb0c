//! Scene load state machine.

use crate::{ExtractedAssets, extract_assets, parse_scene_document};
use derive_getters::Getters;
use futures::future::try_join_all;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tableau_core::{EventBus, Scene, Subscription, TableauConfig};
use tableau_error::{SceneError, SceneErrorKind};
use tableau_interface::{DocumentFetcher, MediaPreloader, PathResolver};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Stage of the current load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum LoadPhase {
    /// Nothing requested yet
    #[default]
    Idle,
    /// Waiting for the document
    Fetching,
    /// Parsing the document
    Parsing,
    /// Warming assets
    Preloading,
    /// Scene available
    Ready,
    /// Load failed
    Error,
}

/// Observable state of the loader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
pub struct LoadStatus {
    /// Scene file being loaded or shown
    file: Option<String>,
    /// Current stage
    phase: LoadPhase,
    /// Percentage, monotonic within one load
    progress: u8,
    /// True until the settle delay after readiness has passed
    loading: bool,
    /// Readable failure message
    error: Option<String>,
}

/// Preload and settle timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreloadTimeouts {
    /// Image limit; a timed-out image fails the load. `None` waits forever.
    pub image: Option<Duration>,
    /// Audio limit; a timed-out clip counts as loaded
    pub audio: Duration,
    /// Video limit; a timed-out video counts as loaded
    pub video: Duration,
    /// Delay between readiness and `loading = false`
    pub settle: Duration,
}

impl Default for PreloadTimeouts {
    fn default() -> Self {
        Self {
            image: None,
            audio: Duration::from_secs(10),
            video: Duration::from_secs(15),
            settle: Duration::from_millis(200),
        }
    }
}

impl PreloadTimeouts {
    /// Timings from configuration.
    pub fn from_config(config: &TableauConfig) -> Self {
        Self {
            image: config.image_timeout(),
            audio: config.audio_timeout(),
            video: config.video_timeout(),
            settle: config.settle_delay(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Job<'a> {
    Image(&'a str),
    Audio(&'a str),
    Video { src: &'a str, url: &'a str },
}

struct Inner {
    fetcher: Arc<dyn DocumentFetcher>,
    resolver: Arc<dyn PathResolver>,
    preloader: Arc<dyn MediaPreloader>,
    bus: EventBus,
    timeouts: PreloadTimeouts,
    remote_video_patterns: Vec<String>,
    generation: AtomicU64,
    status: watch::Sender<LoadStatus>,
    scene: watch::Sender<Option<Arc<Scene>>>,
}

/// Loads scenes one at a time, newest request wins.
///
/// Each [`load`](Self::load) bumps a generation counter; every stage checks
/// it after suspending and abandons the load with
/// [`SceneErrorKind::Cancelled`] once a newer request exists. Only a
/// current load may change the status or the published scene.
///
/// Publishes `scene:progress`, `scene:ready` and `scene:error` on the bus.
/// Cloning is cheap; clones share state.
#[derive(Clone)]
pub struct SceneLoader {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SceneLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneLoader")
            .field("generation", &self.inner.generation.load(Ordering::SeqCst))
            .field("status", &*self.inner.status.borrow())
            .finish()
    }
}

impl SceneLoader {
    /// Creates an idle loader.
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        resolver: Arc<dyn PathResolver>,
        preloader: Arc<dyn MediaPreloader>,
        bus: EventBus,
        timeouts: PreloadTimeouts,
        remote_video_patterns: Vec<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                resolver,
                preloader,
                bus,
                timeouts,
                remote_video_patterns,
                generation: AtomicU64::new(0),
                status: watch::Sender::new(LoadStatus::default()),
                scene: watch::Sender::new(None),
            }),
        }
    }

    /// Creates an idle loader with configured timings and video patterns.
    pub fn from_config(
        fetcher: Arc<dyn DocumentFetcher>,
        resolver: Arc<dyn PathResolver>,
        preloader: Arc<dyn MediaPreloader>,
        bus: EventBus,
        config: &TableauConfig,
    ) -> Self {
        Self::new(
            fetcher,
            resolver,
            preloader,
            bus,
            PreloadTimeouts::from_config(config),
            config.remote_video_patterns().clone(),
        )
    }

    /// Current status.
    pub fn status(&self) -> LoadStatus {
        self.inner.status.borrow().clone()
    }

    /// Receiver notified on every status change.
    pub fn subscribe_status(&self) -> watch::Receiver<LoadStatus> {
        self.inner.status.subscribe()
    }

    /// Last scene that became ready.
    pub fn scene(&self) -> Option<Arc<Scene>> {
        self.inner.scene.borrow().clone()
    }

    /// Receiver notified whenever a scene becomes ready.
    pub fn subscribe_scene(&self) -> watch::Receiver<Option<Arc<Scene>>> {
        self.inner.scene.subscribe()
    }

    /// Loads `file`, superseding any load in flight.
    ///
    /// # Errors
    ///
    /// Returns the transport, parse or asset failure, or `Cancelled` when a
    /// newer load started before this one finished.
    pub async fn load(&self, file: &str) -> Result<Arc<Scene>, SceneError> {
        let generation = self.begin(file);
        self.drive(generation, file).await
    }

    /// Loads whatever `currentSceneFile` changes to on `bus`.
    ///
    /// Loads run on the current tokio runtime. The generation is claimed
    /// inside the callback, so the order of changes decides which load wins.
    ///
    /// # Errors
    ///
    /// Returns an error when called outside a tokio runtime.
    pub fn follow(&self, bus: &EventBus) -> Result<Subscription, SceneError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| SceneError::new(SceneErrorKind::Other(e.to_string())))?;
        let loader = self.clone();
        Ok(bus.subscribe("state:currentSceneFile:changed", move |payload| {
            let Some(file) = payload.as_str().filter(|f| !f.is_empty()) else {
                return;
            };
            let file = file.to_string();
            let generation = loader.begin(&file);
            let loader = loader.clone();
            handle.spawn(async move {
                // Failures are already logged and published.
                let _ = loader.drive(generation, &file).await;
            });
        }))
    }

    fn begin(&self, file: &str) -> u64 {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.status.send_replace(LoadStatus {
            file: Some(file.to_string()),
            phase: LoadPhase::Fetching,
            progress: 0,
            loading: true,
            error: None,
        });
        debug!(file, generation, "Scene load requested");
        generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.inner.generation.load(Ordering::SeqCst) == generation
    }

    fn ensure_current(&self, generation: u64, file: &str) -> Result<(), SceneError> {
        if self.is_current(generation) {
            Ok(())
        } else {
            Err(SceneError::new(SceneErrorKind::Cancelled(file.to_string())))
        }
    }

    fn update(&self, generation: u64, modify: impl FnOnce(&mut LoadStatus)) {
        if self.is_current(generation) {
            self.inner.status.send_modify(modify);
        }
    }

    #[instrument(skip(self))]
    async fn drive(&self, generation: u64, file: &str) -> Result<Arc<Scene>, SceneError> {
        info!("Loading scene");
        match self.run(generation, file).await {
            Ok(scene) => Ok(scene),
            Err(e) if !self.is_current(generation) => {
                debug!(error = %e.kind, "Superseded load discarded");
                Err(SceneError::new(SceneErrorKind::Cancelled(file.to_string())))
            }
            Err(e) => {
                let message = e.message();
                warn!(error = %message, "Scene load failed");
                self.update(generation, |status| {
                    status.phase = LoadPhase::Error;
                    status.loading = false;
                    status.error = Some(message.clone());
                });
                self.inner
                    .bus
                    .publish("scene:error", json!({ "file": file, "message": message }));
                Err(e)
            }
        }
    }

    async fn run(&self, generation: u64, file: &str) -> Result<Arc<Scene>, SceneError> {
        let url = self.inner.resolver.resolve(file)?;
        let text = self.inner.fetcher.fetch_text(&url).await?;
        self.ensure_current(generation, file)?;

        self.update(generation, |status| status.phase = LoadPhase::Parsing);
        let scene = parse_scene_document(&text, file)?;
        let assets = extract_assets(&scene, self.inner.resolver.as_ref())?;
        self.update(generation, |status| {
            status.phase = LoadPhase::Preloading;
            status.progress = 10;
        });

        let total = assets.total();
        if total > 0 {
            self.preload_all(generation, file, &assets).await?;
        }
        self.ensure_current(generation, file)?;

        let scene = Arc::new(scene.with_asset_index(assets.indexed));
        self.inner.scene.send_replace(Some(scene.clone()));
        self.update(generation, |status| {
            status.phase = LoadPhase::Ready;
            status.progress = 100;
            status.loading = total > 0;
        });
        info!(slides = scene.slides().len(), assets = total, "Scene ready");
        self.inner.bus.publish("scene:ready", json!({ "file": file }));

        if total > 0 {
            self.schedule_settle(generation);
        }
        Ok(scene)
    }

    async fn preload_all(
        &self,
        generation: u64,
        file: &str,
        assets: &ExtractedAssets,
    ) -> Result<(), SceneError> {
        let total = assets.total();
        let loaded = AtomicUsize::new(0);
        let tick = || {
            let done = loaded.fetch_add(1, Ordering::SeqCst) + 1;
            let progress = (10.0 + done as f64 / total as f64 * 90.0).round() as u8;
            if !self.is_current(generation) {
                return;
            }
            self.update(generation, |status| {
                status.progress = status.progress.max(progress);
            });
            self.inner.bus.publish(
                "scene:progress",
                json!({ "file": file, "progress": progress }),
            );
        };
        let tick = &tick;

        let jobs = assets
            .images
            .iter()
            .map(|url| Job::Image(url))
            .chain(assets.audio.iter().map(|url| Job::Audio(url)))
            .chain(
                assets
                    .videos
                    .iter()
                    .map(|(src, url)| Job::Video { src, url }),
            );

        try_join_all(jobs.map(|job| async move {
            let result = self.preload(job).await;
            tick();
            result
        }))
        .await?;
        Ok(())
    }

    async fn preload(&self, job: Job<'_>) -> Result<(), SceneError> {
        let preloader = &self.inner.preloader;
        let timeouts = &self.inner.timeouts;
        match job {
            Job::Image(url) => match timeouts.image {
                Some(limit) => tokio::time::timeout(limit, preloader.preload_image(url))
                    .await
                    .map_err(|_| {
                        SceneError::new(SceneErrorKind::Asset {
                            src: url.to_string(),
                            message: format!("timed out after {:?}", limit),
                        })
                    })?,
                None => preloader.preload_image(url).await,
            },
            Job::Audio(url) => {
                tolerate(url, timeouts.audio, preloader.preload_audio(url)).await;
                Ok(())
            }
            Job::Video { src, url } => {
                if self
                    .inner
                    .remote_video_patterns
                    .iter()
                    .any(|pattern| src.contains(pattern.as_str()))
                {
                    debug!(src, "Remote video, skipping preload");
                } else {
                    tolerate(url, timeouts.video, preloader.preload_video(url)).await;
                }
                Ok(())
            }
        }
    }

    fn schedule_settle(&self, generation: u64) {
        let loader = self.clone();
        let delay = self.inner.timeouts.settle;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            loader.update(generation, |status| status.loading = false);
        });
    }
}

/// Awaits a media preload, logging instead of failing on error or timeout.
async fn tolerate(
    url: &str,
    limit: Duration,
    preload: impl std::future::Future<Output = Result<(), SceneError>>,
) {
    match tokio::time::timeout(limit, preload).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(url, error = %e.kind, "Media preload failed, continuing"),
        Err(_) => warn!(url, ?limit, "Media preload timed out, continuing"),
    }
}

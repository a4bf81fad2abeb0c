//! Presentation session.
//!
//! A [`Session`] connects the pieces the way a presentation shell does:
//! changes to `currentSceneFile` load the scene, a ready scene is entered
//! (slide count, visibility, entry actions, event bindings), bound scene
//! events run through the engine, and custom-variable changes re-apply
//! visibility. All of that happens on one driver task, in arrival order.

use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use tableau_core::{Action, RawAction, Scene, Subscription};
use tableau_engine::{ActionEngine, SceneEventBindings, Triggered};
use tableau_error::SceneError;
use tableau_scene::{LoadStatus, SceneLoader};
use tableau_state::StateStore;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

#[derive(Debug)]
enum Signal {
    SceneReady(String),
    CustomChanged,
}

/// A running presentation over one store, loader and engine.
///
/// Dropping the session stops its driver task and removes its subscriptions.
#[derive(Debug)]
pub struct Session {
    store: Arc<StateStore>,
    loader: SceneLoader,
    engine: Arc<ActionEngine>,
    subscriptions: Vec<Subscription>,
    driver: JoinHandle<()>,
}

impl Session {
    /// Wires the components together and starts the driver task.
    ///
    /// # Errors
    ///
    /// Returns an error when called outside a tokio runtime.
    #[instrument(skip_all, fields(ns = store.namespace()))]
    pub fn start(
        store: Arc<StateStore>,
        loader: SceneLoader,
        engine: Arc<ActionEngine>,
    ) -> Result<Self, SceneError> {
        let bus = store.bus().clone();
        let (signal_tx, signal_rx) = unbounded_channel();
        let (bound_tx, bound_rx) = unbounded_channel();

        let ready_tx = signal_tx.clone();
        let mut subscriptions = vec![
            bus.subscribe("scene:ready", move |payload| {
                let file = payload
                    .get("file")
                    .and_then(JsonValue::as_str)
                    .unwrap_or_default()
                    .to_string();
                let _ = ready_tx.send(Signal::SceneReady(file));
            }),
            bus.subscribe("custom:changed", move |_| {
                let _ = signal_tx.send(Signal::CustomChanged);
            }),
        ];
        subscriptions.push(loader.follow(&bus)?);

        let driver = Driver {
            store: store.clone(),
            loader: loader.clone(),
            engine: engine.clone(),
            bound_tx,
            bindings: SceneEventBindings::default(),
            scene: None,
        };
        let driver = tokio::spawn(driver.run(signal_rx, bound_rx));
        info!("Session started");

        Ok(Self {
            store,
            loader,
            engine,
            subscriptions,
            driver,
        })
    }

    /// Requests `file` by writing it to `currentSceneFile`.
    pub fn open_scene(&self, file: &str) {
        self.store.set("currentSceneFile", file);
    }

    /// Reloads the scene recorded in the store, if any.
    pub fn resume(&self) -> Option<String> {
        let file = self
            .store
            .get("currentSceneFile")
            .and_then(|value| value.as_str().map(str::to_string))
            .filter(|file| !file.is_empty())?;
        debug!(file = %file, "Resuming scene");
        self.open_scene(&file);
        Some(file)
    }

    /// Runs actions against the current scene.
    pub async fn execute(&self, actions: &[RawAction]) {
        let scene = self.loader.scene();
        self.engine.execute(actions, scene.as_deref()).await;
    }

    /// Runs decoded actions against the current scene.
    pub async fn execute_decoded(&self, actions: Vec<Action>) {
        let scene = self.loader.scene();
        self.engine.execute_decoded(actions, scene.as_deref()).await;
    }

    /// The last scene that became ready.
    pub fn scene(&self) -> Option<Arc<Scene>> {
        self.loader.scene()
    }

    /// Current loader status.
    pub fn status(&self) -> LoadStatus {
        self.loader.status()
    }

    /// The state store.
    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// The scene loader.
    pub fn loader(&self) -> &SceneLoader {
        &self.loader
    }

    /// The action engine.
    pub fn engine(&self) -> &Arc<ActionEngine> {
        &self.engine
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        for subscription in &self.subscriptions {
            subscription.unsubscribe();
        }
        self.driver.abort();
        self.engine.resources().clear();
    }
}

struct Driver {
    store: Arc<StateStore>,
    loader: SceneLoader,
    engine: Arc<ActionEngine>,
    bound_tx: UnboundedSender<Triggered>,
    bindings: SceneEventBindings,
    scene: Option<Arc<Scene>>,
}

impl Driver {
    async fn run(
        mut self,
        mut signals: UnboundedReceiver<Signal>,
        mut bound: UnboundedReceiver<Triggered>,
    ) {
        loop {
            tokio::select! {
                Some(signal) = signals.recv() => match signal {
                    Signal::SceneReady(file) => self.enter_scene(&file).await,
                    Signal::CustomChanged => {
                        if let Some(scene) = &self.scene {
                            self.engine.reapply_visibility(scene).await;
                        }
                    }
                },
                Some(triggered) = bound.recv() => {
                    debug!(event = %triggered.event, "Running bound actions");
                    self.engine
                        .execute(triggered.actions.as_slice(), self.scene.as_deref())
                        .await;
                }
                else => break,
            }
        }
    }

    #[instrument(skip(self))]
    async fn enter_scene(&mut self, file: &str) {
        let Some(scene) = self.loader.scene() else {
            return;
        };
        if scene.source_file().as_deref() != Some(file) {
            debug!("Ready signal for a scene that is no longer current");
            return;
        }

        info!(slides = scene.slides().len(), "Entering scene");
        self.store.set("slideCount", scene.slides().len());
        self.bindings.detach();
        self.bindings =
            SceneEventBindings::attach(self.store.bus(), &scene, self.bound_tx.clone());
        self.scene = Some(scene.clone());

        self.engine.reapply_visibility(&scene).await;
        self.engine
            .execute(scene.on_enter().as_slice(), Some(&scene))
            .await;
        if let Some(slide) = scene.slides().get(self.store.slide_index()) {
            self.engine
                .execute(slide.on_enter().as_slice(), Some(&scene))
                .await;
        }

        self.store
            .bus()
            .publish("scene:entered", json!({ "file": file }));
    }
}

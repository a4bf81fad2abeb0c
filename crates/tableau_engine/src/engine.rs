//! Action interpreter.

use crate::{Command, CommandTable, ResourceRegistry, SilentAudioOutput, apply_visibility};
use futures::future::BoxFuture;
use serde_json::{Map, Value as JsonValue};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tableau_core::value::{number, to_number};
use tableau_core::{
    Action, EventBus, PersistenceTier, RawAction, Scene, SubmissionFile, UploadRequest,
};
use tableau_error::{ActionError, ActionErrorKind};
use tableau_expression::{Context, evaluate_condition};
use tableau_interface::{AssignmentSubmitter, AudioOutput, PathResolver};
use tableau_state::{DEFAULT_STATUS_KEY, DEFAULT_STATUS_VALUE, StateStore};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, instrument, warn};

/// Interprets action lists against a [`StateStore`].
///
/// Actions within one [`execute`](Self::execute) call run strictly in order,
/// each awaited before the next. Concurrent `execute` calls are serialized:
/// a batch never interleaves with another. Malformed or unknown actions are
/// logged and skipped; they never abort the batch.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tableau_core::{EventBus, RawAction};
/// use tableau_engine::ActionEngine;
/// use tableau_state::{MemoryBackingStore, StateStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = Arc::new(StateStore::load(
///     "simulator_state_demo",
///     EventBus::new(),
///     Arc::new(MemoryBackingStore::new("session")),
///     Arc::new(MemoryBackingStore::new("local")),
/// ));
/// let engine = ActionEngine::new(store.clone());
///
/// engine
///     .execute(&[RawAction::from("set:score:5"), RawAction::from("inc:score:2")], None)
///     .await;
/// assert_eq!(store.get("score"), Some(serde_json::json!(7)));
/// # }
/// ```
pub struct ActionEngine {
    store: Arc<StateStore>,
    commands: CommandTable,
    resources: Arc<ResourceRegistry>,
    audio: Arc<dyn AudioOutput>,
    resolver: Option<Arc<dyn PathResolver>>,
    submitter: Option<Arc<dyn AssignmentSubmitter>>,
    default_wait: Duration,
    gate: AsyncMutex<()>,
}

impl std::fmt::Debug for ActionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionEngine")
            .field("namespace", &self.store.namespace())
            .field("commands", &self.commands)
            .field("resources", &self.resources)
            .field("submitter", &self.submitter.is_some())
            .field("default_wait", &self.default_wait)
            .finish()
    }
}

impl ActionEngine {
    /// Engine with built-in commands, silent audio and no submitter.
    pub fn new(store: Arc<StateStore>) -> Self {
        Self {
            store,
            commands: CommandTable::with_builtins(),
            resources: Arc::new(ResourceRegistry::new()),
            audio: Arc::new(SilentAudioOutput),
            resolver: None,
            submitter: None,
            default_wait: Duration::from_millis(1000),
            gate: AsyncMutex::new(()),
        }
    }

    /// Replace the command table.
    pub fn with_commands(mut self, commands: CommandTable) -> Self {
        self.commands = commands;
        self
    }

    /// Set the audio output used by `play_sound`.
    pub fn with_audio(mut self, audio: Arc<dyn AudioOutput>) -> Self {
        self.audio = audio;
        self
    }

    /// Set the resolver for literal sound paths.
    pub fn with_resolver(mut self, resolver: Arc<dyn PathResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Set the submission collaborator used by `upload_file`.
    pub fn with_submitter(mut self, submitter: Arc<dyn AssignmentSubmitter>) -> Self {
        self.submitter = Some(submitter);
        self
    }

    /// Delay for `wait` actions without a usable duration.
    pub fn with_default_wait(mut self, wait: Duration) -> Self {
        self.default_wait = wait;
        self
    }

    /// The store this engine mutates.
    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Live timers and playbacks.
    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    /// Mutable access to the command table for registering extra commands.
    pub fn commands_mut(&mut self) -> &mut CommandTable {
        &mut self.commands
    }

    fn bus(&self) -> &EventBus {
        self.store.bus()
    }

    /// Runs `actions` in order, then re-applies visibility rules for `scene`.
    #[instrument(skip_all, fields(count = actions.len()))]
    pub async fn execute(&self, actions: &[RawAction], scene: Option<&Scene>) {
        let _guard = self.gate.lock().await;
        self.run_raw(actions, scene).await;
        if let Some(scene) = scene {
            apply_visibility(&self.store, scene);
        }
    }

    /// Like [`execute`](Self::execute) for already decoded actions.
    ///
    /// Presentation layers use this to hand over `upload_file` actions with
    /// the selected file attached.
    #[instrument(skip_all, fields(count = actions.len()))]
    pub async fn execute_decoded(&self, actions: Vec<Action>, scene: Option<&Scene>) {
        let _guard = self.gate.lock().await;
        for action in actions {
            self.run_logged(action, scene).await;
        }
        if let Some(scene) = scene {
            apply_visibility(&self.store, scene);
        }
    }

    /// Re-evaluates visibility rules for the current slide of `scene`.
    ///
    /// Waits for any in-flight batch so overrides it writes are not lost.
    pub async fn reapply_visibility(&self, scene: &Scene) -> bool {
        let _guard = self.gate.lock().await;
        apply_visibility(&self.store, scene)
    }

    fn run_raw<'a>(
        &'a self,
        actions: &'a [RawAction],
        scene: Option<&'a Scene>,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            for raw in actions {
                match Action::decode(raw) {
                    Ok(action) => self.run_logged(action, scene).await,
                    Err(e) => warn!(action = %raw, error = %e.kind, "Skipping action"),
                }
            }
        })
    }

    fn run_logged<'a>(&'a self, action: Action, scene: Option<&'a Scene>) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let kind = action.kind();
            if let Err(e) = self.dispatch(action, scene).await {
                warn!(action = kind, error = %e.kind, "Action failed");
            }
        })
    }

    async fn dispatch(&self, action: Action, scene: Option<&Scene>) -> Result<(), ActionError> {
        debug!(action = action.kind(), "Dispatching");
        match action {
            Action::Show(id) => self.set_element(&id, true),
            Action::Hide(id) => self.set_element(&id, false),
            Action::PreviousSlide => {
                let last = self.slide_count(scene).saturating_sub(1);
                self.move_to_slide(self.store.slide_index().saturating_sub(1).min(last));
            }
            Action::NextSlide => {
                let count = self.slide_count(scene);
                if count == 0 {
                    warn!("next_slide with no slides");
                } else {
                    self.move_to_slide(self.store.slide_index().saturating_add(1).min(count - 1));
                }
            }
            Action::GotoId(id) => self.goto_id(&id, scene).await,
            Action::GotoScene(name) => self.goto_scene(&name, scene).await,
            Action::PlayVideo(id) => self.store.set("videoId", id),
            Action::PlaySound { id, transitional } => self.play_sound(&id, transitional, scene),
            Action::AudioFinished => self.bus().emit("audio_finished"),
            Action::Wait { millis } => self.schedule_wait(millis),
            Action::UploadFile(request) => {
                // Failures are reported through events.
                let _ = self.upload_file(&request).await;
            }
            Action::MarkComplete(id) => {
                self.store.mark_assignment_complete(&id);
                self.bus().emit(&format!("success:{}", id));
            }
            Action::End(arg) => self.bus().emit(&format!("end:{}", arg)),
            Action::Emit(event) => self.bus().emit(&event),
            Action::Set { key, value } => self.store.set(&key, value),
            Action::Inc { key, by } => self.store.set(&key, format!("+{}", by)),
            Action::Dec { key, by } => self.store.set(&key, format!("+{}", -by)),
            Action::Call { command, arg } => self.call(&command, arg.as_deref(), scene).await?,
            Action::CustomSet { key, tier, value } => {
                self.store.set_custom(&key, value, Some(tier))
            }
            Action::CustomInc { key, tier, by } => self.adjust_custom(&key, tier, by),
            Action::CustomDec { key, tier, by } => self.adjust_custom(&key, tier, -by),
            Action::If { condition, actions } => {
                let context = Context::from_store(&self.store);
                if evaluate_condition(&condition, &context) {
                    self.run_raw(&actions, scene).await;
                } else {
                    debug!(condition = %condition, "Condition false, skipping nested actions");
                }
            }
        }
        Ok(())
    }

    fn set_element(&self, id: &str, visible: bool) {
        let mut active = match self.store.get("activeElements") {
            Some(JsonValue::Object(map)) => map,
            _ => Map::new(),
        };
        active.insert(id.to_string(), JsonValue::Bool(visible));
        self.store.set("activeElements", JsonValue::Object(active));
    }

    fn slide_count(&self, scene: Option<&Scene>) -> usize {
        self.store
            .get("slideCount")
            .and_then(|count| count.as_u64())
            .map(|count| count as usize)
            .unwrap_or_else(|| scene.map_or(0, |scene| scene.slides().len()))
    }

    fn move_to_slide(&self, index: usize) {
        let current = self.store.slide_index();
        if index != current {
            self.resources.purge();
        }
        self.store.set("slideIndex", index);
    }

    async fn goto_id(&self, id: &str, scene: Option<&Scene>) {
        let Some(scene) = scene else {
            warn!(slide = %id, "goto_id without a scene");
            return;
        };
        let Some(index) = scene.slide_position(id) else {
            warn!(slide = %id, "No slide with that id");
            return;
        };
        self.move_to_slide(index);
        apply_visibility(&self.store, scene);
        if let Some(slide) = scene.slides().get(index) {
            self.run_raw(slide.on_enter().as_slice(), Some(scene)).await;
        }
    }

    async fn goto_scene(&self, name: &str, scene: Option<&Scene>) {
        let file = format!("{}.yaml", name);
        info!(scene = %file, "Switching scene");
        self.resources.purge();
        self.store.set("currentSceneFile", file.as_str());
        self.store.set("slideIndex", 0);

        if let Some(target) = scene.filter(|s| s.source_file().as_deref() == Some(file.as_str())) {
            apply_visibility(&self.store, target);
            self.run_raw(target.on_enter().as_slice(), Some(target)).await;
            if let Some(first) = target.slides().first() {
                self.run_raw(first.on_enter().as_slice(), Some(target)).await;
            }
        }

        self.bus().publish("scene:request", JsonValue::from(file));
    }

    fn play_sound(&self, id: &str, transitional: bool, scene: Option<&Scene>) {
        let authored = scene
            .and_then(|s| s.assets().audios().get(id))
            .and_then(|entry| entry.src().clone());
        let indexed = scene
            .filter(|_| authored.is_some())
            .and_then(|s| s.resolve_asset(id))
            .map(str::to_string);
        let path = authored.unwrap_or_else(|| id.to_string());
        let src = indexed.unwrap_or_else(|| self.resolve_path(&path));

        match self.audio.play(&src) {
            Ok(playback) => {
                self.resources.track_audio(playback, transitional);
                debug!(src = %src, transitional, "Playing sound");
            }
            Err(e) => warn!(src = %src, error = %e.kind, "Could not play sound"),
        }
    }

    fn resolve_path(&self, path: &str) -> String {
        match &self.resolver {
            Some(resolver) => resolver.resolve(path).unwrap_or_else(|e| {
                warn!(path, error = %e.kind, "Could not resolve path, using it verbatim");
                path.to_string()
            }),
            None => path.to_string(),
        }
    }

    fn schedule_wait(&self, millis: Option<u64>) {
        let millis = millis.unwrap_or(self.default_wait.as_millis() as u64);
        let bus = self.bus().clone();
        let resources = self.resources.clone();
        let id = resources.reserve();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(millis)).await;
            resources.forget(id);
            bus.emit(&format!("wait:end:{}", millis));
        });
        self.resources.track_timer(id, timer.abort_handle(), false);
        debug!(millis, "Timer scheduled");
    }

    async fn call(
        &self,
        name: &str,
        arg: Option<&str>,
        scene: Option<&Scene>,
    ) -> Result<(), ActionError> {
        match self.commands.resolve(name) {
            Some(Command::Store(handler)) => handler(&self.store, arg),
            Some(Command::Engine(handler)) => {
                let action = handler(arg)?;
                self.dispatch_boxed(action, scene).await
            }
            None => {
                warn!(command = %name, "Unknown command");
                Ok(())
            }
        }
    }

    fn dispatch_boxed<'a>(
        &'a self,
        action: Action,
        scene: Option<&'a Scene>,
    ) -> BoxFuture<'a, Result<(), ActionError>> {
        Box::pin(self.dispatch(action, scene))
    }

    fn adjust_custom(&self, key: &str, tier: PersistenceTier, by: f64) {
        let current = self
            .store
            .get_custom(key)
            .map(|value| to_number(&value))
            .filter(|n| !n.is_nan())
            .unwrap_or(0.0);
        self.store.set_custom(key, number(current + by), Some(tier));
    }

    /// Submits a file and records the outcome.
    ///
    /// Emits `upload_file_<id>` first, then `success:upload_file_<id>` after
    /// the assignment is marked submitted, or `error:upload_file_<id>` on any
    /// failure. Assignment state is untouched on failure.
    ///
    /// # Errors
    ///
    /// Returns an error when no submitter is configured, no file is attached
    /// or readable, or the submitter fails.
    #[instrument(skip(self, request), fields(id = %request.id, assignment = %request.assignment_id))]
    pub async fn upload_file(&self, request: &UploadRequest) -> Result<JsonValue, ActionError> {
        self.bus().emit(&format!("upload_file_{}", request.id));
        match self.submit(request).await {
            Ok(result) => {
                self.store.mark_assignment_complete_with(
                    &request.assignment_id,
                    DEFAULT_STATUS_KEY,
                    JsonValue::from(DEFAULT_STATUS_VALUE),
                );
                info!("File submitted");
                self.bus()
                    .publish(&format!("success:upload_file_{}", request.id), result.clone());
                Ok(result)
            }
            Err(e) => {
                error!(error = %e.kind, "File submission failed");
                self.bus().publish(
                    &format!("error:upload_file_{}", request.id),
                    JsonValue::from(e.kind.to_string()),
                );
                Err(e)
            }
        }
    }

    async fn submit(&self, request: &UploadRequest) -> Result<JsonValue, ActionError> {
        let submitter = self.submitter.as_ref().ok_or_else(|| {
            ActionError::new(ActionErrorKind::SubmissionNotConfigured(
                request.assignment_id.clone(),
            ))
        })?;
        let file = match (&request.file, &request.file_path) {
            (Some(file), _) => file.clone(),
            (None, Some(path)) => read_submission(path).await?,
            (None, None) => {
                return Err(ActionError::new(ActionErrorKind::MissingFile(
                    request.id.clone(),
                )));
            }
        };
        submitter
            .submit(&request.assignment_id, &file)
            .await
            .map_err(|e| ActionError::new(ActionErrorKind::SubmissionFailed(e.message)))
    }
}

async fn read_submission(path: &str) -> Result<SubmissionFile, ActionError> {
    let content = tokio::fs::read(path)
        .await
        .map_err(|e| ActionError::new(ActionErrorKind::MissingFile(format!("{}: {}", path, e))))?;
    let name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    Ok(SubmissionFile {
        name,
        content,
        mime: None,
    })
}

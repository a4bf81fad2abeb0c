//! Named commands reachable through `call:<name>:<arg>`.

use std::collections::HashMap;
use std::sync::Arc;
use tableau_core::Action;
use tableau_core::value::parse_int_prefix;
use tableau_error::{ActionError, ActionErrorKind};
use tableau_state::StateStore;
use tracing::{debug, warn};

/// Handler run directly against the state store.
pub type StoreCommand =
    Arc<dyn Fn(&StateStore, Option<&str>) -> Result<(), ActionError> + Send + Sync>;

/// Handler that turns its argument into an instruction for the engine.
pub type EngineCommand = Arc<dyn Fn(Option<&str>) -> Result<Action, ActionError> + Send + Sync>;

/// A resolved command.
#[derive(Clone)]
pub enum Command {
    /// Runs against the state store
    Store(StoreCommand),
    /// Re-dispatches as an instruction
    Engine(EngineCommand),
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Store(_) => f.write_str("Command::Store"),
            Command::Engine(_) => f.write_str("Command::Engine"),
        }
    }
}

/// Registry of `call` targets.
///
/// Store commands are consulted before engine commands, so a store command
/// shadows an engine command of the same name.
#[derive(Clone)]
pub struct CommandTable {
    store: HashMap<String, StoreCommand>,
    engine: HashMap<String, EngineCommand>,
}

impl std::fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names = self.names();
        names.sort();
        f.debug_struct("CommandTable").field("names", &names).finish()
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl CommandTable {
    /// Empty table.
    pub fn empty() -> Self {
        Self {
            store: HashMap::new(),
            engine: HashMap::new(),
        }
    }

    /// Table holding the built-in store and engine commands.
    pub fn with_builtins() -> Self {
        let mut table = Self::empty();

        table.register_store("markAssignmentComplete", |store, arg| {
            store.mark_assignment_complete(required("markAssignmentComplete", arg)?);
            Ok(())
        });
        table.register_store("set_slide_count", |store, arg| {
            let count = arg
                .and_then(parse_int_prefix)
                .filter(|n| *n >= 0)
                .ok_or_else(|| missing("set_slide_count", "a slide count"))?;
            store.set("slideCount", count);
            Ok(())
        });

        table.register_engine("showElement", |arg| {
            Ok(Action::Show(required("showElement", arg)?.to_string()))
        });
        table.register_engine("hideElement", |arg| {
            Ok(Action::Hide(required("hideElement", arg)?.to_string()))
        });
        table.register_engine("nextSlide", |_| Ok(Action::NextSlide));
        table.register_engine("previousSlide", |_| Ok(Action::PreviousSlide));
        table.register_engine("gotoId", |arg| {
            Ok(Action::GotoId(required("gotoId", arg)?.to_string()))
        });
        table.register_engine("gotoScene", |arg| {
            Ok(Action::GotoScene(required("gotoScene", arg)?.to_string()))
        });
        table.register_engine("playSound", |arg| {
            Ok(Action::PlaySound {
                id: required("playSound", arg)?.to_string(),
                transitional: false,
            })
        });
        table.register_engine("playVideo", |arg| {
            Ok(Action::PlayVideo(required("playVideo", arg)?.to_string()))
        });
        table.register_engine("audioFinished", |_| Ok(Action::AudioFinished));
        table.register_engine("wait", |arg| {
            Ok(Action::Wait {
                millis: arg
                    .and_then(parse_int_prefix)
                    .filter(|ms| *ms > 0)
                    .map(|ms| ms as u64),
            })
        });
        table.register_engine("markComplete", |arg| {
            Ok(Action::MarkComplete(required("markComplete", arg)?.to_string()))
        });

        table
    }

    /// Registers a store command, replacing any previous one of that name.
    pub fn register_store<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&StateStore, Option<&str>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.store.contains_key(&name) {
            warn!(command = %name, "Store command already registered, overwriting");
        } else {
            debug!(command = %name, "Registering store command");
        }
        self.store.insert(name, Arc::new(handler));
    }

    /// Registers an engine command, replacing any previous one of that name.
    pub fn register_engine<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(Option<&str>) -> Result<Action, ActionError> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.engine.contains_key(&name) {
            warn!(command = %name, "Engine command already registered, overwriting");
        } else {
            debug!(command = %name, "Registering engine command");
        }
        self.engine.insert(name, Arc::new(handler));
    }

    /// Looks up `name`, store commands first.
    pub fn resolve(&self, name: &str) -> Option<Command> {
        self.store
            .get(name)
            .cloned()
            .map(Command::Store)
            .or_else(|| self.engine.get(name).cloned().map(Command::Engine))
    }

    /// Every registered name.
    pub fn names(&self) -> Vec<&str> {
        self.store
            .keys()
            .chain(self.engine.keys())
            .map(String::as_str)
            .collect()
    }
}

fn required<'a>(command: &str, arg: Option<&'a str>) -> Result<&'a str, ActionError> {
    arg.filter(|a| !a.trim().is_empty())
        .ok_or_else(|| missing(command, "an argument"))
}

#[track_caller]
fn missing(command: &str, expected: &str) -> ActionError {
    ActionError::new(ActionErrorKind::MissingArgument {
        action: format!("call:{}", command),
        expected: expected.to_string(),
    })
}

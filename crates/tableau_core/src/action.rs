//! Action instructions.
//!
//! Documents spell actions either as colon-delimited strings
//! (`"goto_id:summary"`) or as objects with a `type` and an `arg`/`value`.
//! [`RawAction`] keeps that authored form; [`Action::decode`] is the single
//! place where the textual grammar is turned into a typed instruction.

use crate::PersistenceTier;
use crate::value::{coerce_scalar, parse_int_prefix, parse_number};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::str::FromStr;
use tableau_error::{ActionError, ActionErrorKind};

/// An action exactly as authored in a scene document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAction {
    /// `"type:argument"` form
    Text(String),
    /// `{ type, arg | value, actions?, ... }` form
    Structured(Map<String, JsonValue>),
}

impl From<&str> for RawAction {
    fn from(text: &str) -> Self {
        RawAction::Text(text.to_string())
    }
}

impl From<String> for RawAction {
    fn from(text: String) -> Self {
        RawAction::Text(text)
    }
}

impl std::fmt::Display for RawAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawAction::Text(text) => write!(f, "{}", text),
            RawAction::Structured(map) => write!(f, "{}", JsonValue::Object(map.clone())),
        }
    }
}

/// One action or a list of actions.
///
/// Element `action`, `on_enter` and event `do` fields accept both shapes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ActionList(pub Vec<RawAction>);

impl<'de> Deserialize<'de> for ActionList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            Many(Vec<RawAction>),
            One(RawAction),
        }

        Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
            Some(OneOrMany::Many(actions)) => ActionList(actions),
            Some(OneOrMany::One(action)) => ActionList(vec![action]),
            None => ActionList::default(),
        })
    }
}

impl ActionList {
    /// True when there is nothing to run.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the actions.
    pub fn as_slice(&self) -> &[RawAction] {
        &self.0
    }
}

impl From<Vec<RawAction>> for ActionList {
    fn from(actions: Vec<RawAction>) -> Self {
        ActionList(actions)
    }
}

/// A file handed to the submission collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionFile {
    /// Original file name
    pub name: String,
    /// File contents
    pub content: Vec<u8>,
    /// MIME type if known
    pub mime: Option<String>,
}

/// Payload of an `upload_file` action.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    /// Element id used to build the `upload_file_<id>` events
    pub id: String,
    /// Assignment the file is submitted to
    pub assignment_id: String,
    /// File attached by the presentation layer
    pub file: Option<SubmissionFile>,
    /// Local path to read when no file is attached
    pub file_path: Option<String>,
}

/// A decoded instruction.
#[derive(Debug, Clone, PartialEq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    /// Force an element visible
    Show(String),
    /// Force an element hidden
    Hide(String),
    /// Step back one slide (clamped at 0)
    PreviousSlide,
    /// Step forward one slide (clamped at the last slide)
    NextSlide,
    /// Jump to the slide with this id in the current scene
    GotoId(String),
    /// Switch to `<name>.yaml`
    GotoScene(String),
    /// Open a video by asset id
    PlayVideo(String),
    /// Play a sound by asset id or literal path
    PlaySound {
        /// Asset id or path
        id: String,
        /// Survive one slide transition
        transitional: bool,
    },
    /// Announce that narration audio finished
    AudioFinished,
    /// One-shot timer emitting `wait:end:<ms>`
    Wait {
        /// Delay; `None` falls back to the configured default
        millis: Option<u64>,
    },
    /// Submit a file to the remote collaborator
    UploadFile(UploadRequest),
    /// Mark an assignment complete
    MarkComplete(String),
    /// Emit `end:<arg>`
    End(String),
    /// Emit an arbitrary event
    Emit(String),
    /// Assign a runtime state key
    Set {
        /// State key
        key: String,
        /// Coerced value
        value: JsonValue,
    },
    /// Add to a numeric state key
    Inc {
        /// State key
        key: String,
        /// Amount
        by: i64,
    },
    /// Subtract from a numeric state key
    Dec {
        /// State key
        key: String,
        /// Amount
        by: i64,
    },
    /// Invoke a registered command
    Call {
        /// Command name
        command: String,
        /// Single argument
        arg: Option<String>,
    },
    /// Assign a custom variable
    CustomSet {
        /// Variable name
        key: String,
        /// Persistence tier
        tier: PersistenceTier,
        /// Parsed value
        value: JsonValue,
    },
    /// Add to a custom variable
    CustomInc {
        /// Variable name
        key: String,
        /// Persistence tier
        tier: PersistenceTier,
        /// Amount
        by: f64,
    },
    /// Subtract from a custom variable
    CustomDec {
        /// Variable name
        key: String,
        /// Persistence tier
        tier: PersistenceTier,
        /// Amount
        by: f64,
    },
    /// Run `actions` only when `condition` holds
    If {
        /// Condition expression
        condition: String,
        /// Nested actions
        actions: Vec<RawAction>,
    },
}

impl Action {
    /// Snake-case instruction name, for logging.
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    /// Decodes an authored action into a typed instruction.
    ///
    /// # Errors
    ///
    /// Returns an error if the value has no type, the type is unknown, or a
    /// required argument is missing.
    pub fn decode(raw: &RawAction) -> Result<Self, ActionError> {
        let (kind, arg, fields) = normalize(raw)?;
        let arg = arg.unwrap_or_default();
        let action = match kind.as_str() {
            "show" => Action::Show(require(&kind, arg, "an element id")?),
            "hide" => Action::Hide(require(&kind, arg, "an element id")?),
            "previous_slide" => Action::PreviousSlide,
            "next_slide" => Action::NextSlide,
            "goto_id" => Action::GotoId(require(&kind, arg, "a slide id")?),
            "goto_scene" => Action::GotoScene(require(&kind, arg, "a scene name")?),
            "play_video" => Action::PlayVideo(require(&kind, arg, "a video id")?),
            "play_sound" => {
                let flagged = fields
                    .and_then(|f| f.get("transitional"))
                    .and_then(JsonValue::as_bool)
                    .unwrap_or(false);
                let (id, transitional) = match arg.strip_suffix(":transitional") {
                    Some(id) => (id.to_string(), true),
                    None => (arg.clone(), flagged),
                };
                Action::PlaySound {
                    id: require(&kind, id, "a sound id")?,
                    transitional,
                }
            }
            "audio_finished" => Action::AudioFinished,
            "wait" => Action::Wait {
                millis: parse_int_prefix(&arg)
                    .filter(|ms| *ms > 0)
                    .map(|ms| ms as u64),
            },
            "upload_file" => Action::UploadFile(decode_upload(&kind, fields)?),
            "mark_complete" => Action::MarkComplete(require(&kind, arg, "an assignment id")?),
            "end" => Action::End(arg),
            "emit" => Action::Emit(require(&kind, arg, "an event name")?),
            "set" => {
                let parts = split_argument(&arg);
                if parts.len() < 2 {
                    return Err(missing(&kind, "'key:value'"));
                }
                Action::Set {
                    key: parts[0].clone(),
                    value: coerce_scalar(&parts[1..].join(":")),
                }
            }
            "inc" | "dec" => {
                let parts = split_argument(&arg);
                let key = parts
                    .first()
                    .filter(|k| !k.is_empty())
                    .cloned()
                    .ok_or_else(|| missing(&kind, "a state key"))?;
                let by = parts
                    .get(1)
                    .and_then(|n| parse_int_prefix(n))
                    .filter(|n| *n != 0)
                    .unwrap_or(1);
                if kind == "inc" {
                    Action::Inc { key, by }
                } else {
                    Action::Dec { key, by }
                }
            }
            "call" => {
                let parts = split_argument(&arg);
                let command = parts
                    .first()
                    .filter(|c| !c.is_empty())
                    .cloned()
                    .ok_or_else(|| missing(&kind, "a command name"))?;
                Action::Call {
                    command,
                    arg: parts.get(1).cloned(),
                }
            }
            "custom_set" => {
                let parts = split_argument(&arg);
                if parts.len() < 2 {
                    return Err(missing(&kind, "at least 'key:value'"));
                }
                let (tier, rest) = split_tier(&parts[1..]);
                let raw_value = rest.join(":");
                let value = serde_json::from_str(&raw_value)
                    .unwrap_or_else(|_| coerce_scalar(&raw_value));
                Action::CustomSet {
                    key: parts[0].clone(),
                    tier,
                    value,
                }
            }
            "custom_inc" | "custom_dec" => {
                let parts = split_argument(&arg);
                let key = parts
                    .first()
                    .filter(|k| !k.is_empty())
                    .cloned()
                    .ok_or_else(|| missing(&kind, "a variable name"))?;
                let (tier, rest) = split_tier(&parts[1..]);
                let by = rest
                    .first()
                    .and_then(|n| parse_number(n))
                    .filter(|n| *n != 0.0 && !n.is_nan())
                    .unwrap_or(1.0);
                if kind == "custom_inc" {
                    Action::CustomInc { key, tier, by }
                } else {
                    Action::CustomDec { key, tier, by }
                }
            }
            "if" => {
                let nested = fields
                    .and_then(|f| f.get("actions"))
                    .cloned()
                    .map(serde_json::from_value::<ActionList>)
                    .transpose()
                    .map_err(|e| {
                        ActionError::new(ActionErrorKind::Malformed(format!(
                            "if actions: {}",
                            e
                        )))
                    })?
                    .unwrap_or_default();
                Action::If {
                    condition: arg,
                    actions: nested.0,
                }
            }
            _ => return Err(ActionError::new(ActionErrorKind::UnknownType(kind))),
        };
        Ok(action)
    }
}

impl FromStr for Action {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::decode(&RawAction::from(s))
    }
}

type Normalized<'a> = (String, Option<String>, Option<&'a Map<String, JsonValue>>);

/// Splits an authored action into `(type, argument, structured fields)`.
fn normalize(raw: &RawAction) -> Result<Normalized<'_>, ActionError> {
    match raw {
        RawAction::Text(text) => {
            let (kind, arg) = match text.split_once(':') {
                Some((kind, arg)) => (kind, Some(arg.to_string())),
                None => (text.as_str(), None),
            };
            if kind.trim().is_empty() {
                return Err(ActionError::new(ActionErrorKind::Malformed(text.clone())));
            }
            Ok((kind.trim().to_string(), arg, None))
        }
        RawAction::Structured(fields) => {
            let kind = match fields.get("type") {
                Some(JsonValue::String(kind)) => kind.trim_start_matches(':').to_string(),
                Some(other) if !other.is_null() => other.to_string(),
                _ => {
                    return Err(ActionError::new(ActionErrorKind::Malformed(
                        JsonValue::Object(fields.clone()).to_string(),
                    )));
                }
            };
            let arg = fields
                .get("arg")
                .filter(|v| !v.is_null())
                .or_else(|| fields.get("value"))
                .and_then(argument_text);
            Ok((kind, arg, Some(fields)))
        }
    }
}

fn argument_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(crate::value::to_display_string(other)),
    }
}

/// Splits an argument on `:` or `,`, trimming each part.
fn split_argument(arg: &str) -> Vec<String> {
    if arg.is_empty() {
        return Vec::new();
    }
    arg.split([':', ','])
        .map(|part| part.trim().to_string())
        .collect()
}

/// Peels an optional leading `local`/`session` marker (default `local`).
fn split_tier(parts: &[String]) -> (PersistenceTier, &[String]) {
    match parts.first().map(|p| p.parse::<PersistenceTier>()) {
        Some(Ok(tier)) => (tier, &parts[1..]),
        _ => (PersistenceTier::Local, parts),
    }
}

fn decode_upload(
    kind: &str,
    fields: Option<&Map<String, JsonValue>>,
) -> Result<UploadRequest, ActionError> {
    let fields = fields.ok_or_else(|| missing(kind, "an object with 'id' and 'assignmentId'"))?;
    let text = |names: &[&str]| {
        names
            .iter()
            .find_map(|name| fields.get(*name).and_then(argument_text))
    };
    let id = text(&["id"]).ok_or_else(|| missing(kind, "an 'id'"))?;
    let assignment_id =
        text(&["assignmentId", "assignment_id"]).ok_or_else(|| missing(kind, "an 'assignmentId'"))?;
    Ok(UploadRequest {
        id,
        assignment_id,
        file: None,
        file_path: text(&["file", "path"]),
    })
}

fn require(kind: &str, arg: String, expected: &str) -> Result<String, ActionError> {
    if arg.trim().is_empty() {
        Err(missing(kind, expected))
    } else {
        Ok(arg)
    }
}

#[track_caller]
fn missing(kind: &str, expected: &str) -> ActionError {
    ActionError::new(ActionErrorKind::MissingArgument {
        action: kind.to_string(),
        expected: expected.to_string(),
    })
}

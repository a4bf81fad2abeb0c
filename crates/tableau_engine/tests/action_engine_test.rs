//! Integration tests for the action engine.

use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tableau_core::{
    Action, AssetCatalog, AssetEntry, Element, EventBus, PersistenceTier, RawAction, Scene, Slide,
    SubmissionFile, UploadRequest,
};
use tableau_engine::ActionEngine;
use tableau_error::{ActionErrorKind, SceneError, SubmissionError};
use tableau_interface::{AssignmentSubmitter, AudioOutput, Playback};
use tableau_state::{MemoryBackingStore, StateStore};

fn store() -> Arc<StateStore> {
    Arc::new(StateStore::load(
        "simulator_state_test",
        EventBus::new(),
        Arc::new(MemoryBackingStore::new("session")),
        Arc::new(MemoryBackingStore::new("local")),
    ))
}

fn actions(items: &[&str]) -> Vec<RawAction> {
    items.iter().map(|a| RawAction::from(*a)).collect()
}

fn structured(value: JsonValue) -> RawAction {
    serde_json::from_value(value).unwrap()
}

fn record(bus: &EventBus, event: &str) -> Arc<Mutex<Vec<JsonValue>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    bus.subscribe(event, move |payload| sink.lock().unwrap().push(payload.clone()));
    seen
}

fn three_slides() -> Scene {
    Scene::new(
        vec![
            Slide::new("intro", Default::default(), vec![]),
            Slide::new("middle", vec![RawAction::from("set:visited:true")].into(), vec![]),
            Slide::new("outro", Default::default(), vec![]),
        ],
        AssetCatalog::default(),
    )
}

#[derive(Default)]
struct RecordingAudio {
    played: Mutex<Vec<String>>,
    stopped: Arc<AtomicUsize>,
}

struct RecordingPlayback(Arc<AtomicUsize>);

impl Playback for RecordingPlayback {
    fn stop(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

impl AudioOutput for RecordingAudio {
    fn play(&self, src: &str) -> Result<Box<dyn Playback>, SceneError> {
        self.played.lock().unwrap().push(src.to_string());
        Ok(Box::new(RecordingPlayback(self.stopped.clone())))
    }
}

/// Holds each submission until `release` is notified.
struct HeldSubmitter {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl AssignmentSubmitter for HeldSubmitter {
    async fn submit(
        &self,
        _assignment_id: &str,
        _file: &SubmissionFile,
    ) -> Result<JsonValue, SubmissionError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(json!({ "status": "ok" }))
    }
}

struct ScriptedSubmitter {
    fail: bool,
    received: Mutex<Vec<(String, String)>>,
}

impl ScriptedSubmitter {
    fn new(fail: bool) -> Self {
        Self {
            fail,
            received: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AssignmentSubmitter for ScriptedSubmitter {
    async fn submit(
        &self,
        assignment_id: &str,
        file: &SubmissionFile,
    ) -> Result<JsonValue, SubmissionError> {
        self.received
            .lock()
            .unwrap()
            .push((assignment_id.to_string(), file.name.clone()));
        if self.fail {
            Err(SubmissionError::new(assignment_id, "gateway unavailable"))
        } else {
            Ok(json!({ "status": "ok" }))
        }
    }
}

#[tokio::test]
async fn test_navigation_is_clamped() {
    let store = store();
    let engine = ActionEngine::new(store.clone());
    let scene = three_slides();
    store.set("slideCount", 3);

    engine.execute(&actions(&["previous_slide"]), Some(&scene)).await;
    assert_eq!(store.slide_index(), 0);

    engine
        .execute(&actions(&["next_slide", "next_slide", "next_slide"]), Some(&scene))
        .await;
    assert_eq!(store.slide_index(), 2);
}

#[tokio::test]
async fn test_next_slide_clamps_out_of_range_index() {
    let store = store();
    let engine = ActionEngine::new(store.clone());
    let scene = three_slides();
    store.set("slideCount", 3);

    engine
        .execute(&actions(&["set:slideIndex:1e20", "next_slide"]), Some(&scene))
        .await;
    assert_eq!(store.slide_index(), 2);

    engine
        .execute(&actions(&["set:slideIndex:1e20", "previous_slide"]), Some(&scene))
        .await;
    assert_eq!(store.slide_index(), 2);
}

#[tokio::test]
async fn test_next_slide_falls_back_to_scene_length() {
    let store = store();
    let engine = ActionEngine::new(store.clone());
    let scene = three_slides();

    engine
        .execute(&actions(&["next_slide", "next_slide", "next_slide"]), Some(&scene))
        .await;
    assert_eq!(store.slide_index(), 2);
}

#[tokio::test]
async fn test_goto_id_runs_on_enter_and_ignores_missing() {
    let store = store();
    let engine = ActionEngine::new(store.clone());
    let scene = three_slides();

    engine.execute(&actions(&["goto_id:nowhere"]), Some(&scene)).await;
    assert_eq!(store.slide_index(), 0);

    engine.execute(&actions(&["goto_id:middle"]), Some(&scene)).await;
    assert_eq!(store.slide_index(), 1);
    assert_eq!(store.get("visited"), Some(json!(true)));
}

#[tokio::test]
async fn test_goto_id_through_call() {
    let store = store();
    let engine = ActionEngine::new(store.clone());
    let scene = three_slides();

    engine.execute(&actions(&["call:gotoId:middle"]), Some(&scene)).await;
    assert_eq!(store.slide_index(), 1);
    assert_eq!(store.get("visited"), Some(json!(true)));
}

#[tokio::test]
async fn test_goto_scene_sets_file_and_requests_load() {
    let store = store();
    let requests = record(store.bus(), "scene:request");
    let engine = ActionEngine::new(store.clone());
    store.set("slideIndex", 2);

    engine.execute(&actions(&["goto_scene:lab"]), None).await;
    assert_eq!(store.get("currentSceneFile"), Some(json!("lab.yaml")));
    assert_eq!(store.slide_index(), 0);
    assert_eq!(*requests.lock().unwrap(), vec![json!("lab.yaml")]);
}

#[tokio::test]
async fn test_goto_scene_runs_target_entry_actions() {
    let store = store();
    let engine = ActionEngine::new(store.clone());
    let target = three_slides()
        .with_on_enter(vec![RawAction::from("set:entered:1")].into())
        .with_source_file("lab.yaml");

    engine.execute(&actions(&["goto_scene:lab"]), Some(&target)).await;
    assert_eq!(store.get("entered"), Some(json!(1)));
}

#[tokio::test]
async fn test_increment_protocol() {
    let store = store();
    let engine = ActionEngine::new(store.clone());
    store.set("key", 5);

    engine.execute(&actions(&["inc:key:3", "dec:key:1"]), None).await;
    assert_eq!(store.get("key"), Some(json!(7)));

    engine.execute(&actions(&["inc:fresh"]), None).await;
    assert_eq!(store.get("fresh"), Some(json!(1)));
}

#[tokio::test]
async fn test_conditional_gating() {
    let gated = || {
        vec![structured(json!({
            "type": "if",
            "arg": "score > 3",
            "actions": ["set:passed:true"]
        }))]
    };

    let high = store();
    high.set("score", 5);
    ActionEngine::new(high.clone()).execute(&gated(), None).await;
    assert_eq!(high.get("passed"), Some(json!(true)));

    let low = store();
    low.set("score", 1);
    ActionEngine::new(low.clone()).execute(&gated(), None).await;
    assert_eq!(low.get("passed"), None);
}

#[tokio::test]
async fn test_set_then_if_sees_update() {
    let store = store();
    let engine = ActionEngine::new(store.clone());
    let batch = vec![
        RawAction::from("set:ready:true"),
        structured(json!({ "type": "if", "arg": "ready", "actions": "emit:go" })),
    ];
    let go = record(store.bus(), "go");

    engine.execute(&batch, None).await;
    assert_eq!(go.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_actions_are_skipped() {
    let store = store();
    let engine = ActionEngine::new(store.clone());
    let batch = vec![
        RawAction::from("teleport:moon"),
        structured(json!({ "arg": "no type" })),
        RawAction::from("show:"),
        RawAction::from("set:after:1"),
    ];

    engine.execute(&batch, None).await;
    assert_eq!(store.get("after"), Some(json!(1)));
}

#[tokio::test]
async fn test_show_hide_and_visibility_rules() {
    let store = store();
    let engine = ActionEngine::new(store.clone());
    let scene = Scene::new(
        vec![Slide::new(
            "only",
            Default::default(),
            vec![
                Element::new(Some("badge".into()), Some("score >= 10".into()), vec![]),
                Element::new(
                    None,
                    None,
                    vec![Element::new(
                        Some("nested".into()),
                        Some("custom.get('lang') == 'es'".into()),
                        vec![],
                    )],
                ),
                Element::new(Some("manual".into()), None, vec![]),
            ],
        )],
        AssetCatalog::default(),
    );

    engine
        .execute(&actions(&["show:manual", "set:score:12", "custom_set:lang:es"]), Some(&scene))
        .await;
    let first = store.get("activeElements").unwrap();
    assert_eq!(
        first,
        json!({ "manual": true, "badge": true, "nested": true })
    );

    assert!(!engine.reapply_visibility(&scene).await);
    assert_eq!(store.get("activeElements").unwrap(), first);

    engine.execute(&actions(&["hide:manual", "set:score:3"]), Some(&scene)).await;
    assert_eq!(
        store.get("activeElements").unwrap(),
        json!({ "manual": false, "badge": false, "nested": true })
    );
}

#[tokio::test]
async fn test_custom_variables() {
    let store = store();
    let engine = ActionEngine::new(store.clone());

    engine
        .execute(
            &actions(&[
                "custom_set:visits:session:2",
                "custom_inc:visits:session:3",
                "custom_dec:coins",
                "custom_set:flag:true",
            ]),
            None,
        )
        .await;

    assert_eq!(store.get_custom("visits"), Some(json!(5)));
    assert_eq!(
        store.custom_in_tier(PersistenceTier::Session, "visits"),
        Some(json!(5))
    );
    assert_eq!(store.get_custom("coins"), Some(json!(-1)));
    assert_eq!(
        store.custom_in_tier(PersistenceTier::Local, "flag"),
        Some(json!(true))
    );
}

#[tokio::test]
async fn test_call_dispatches_through_command_table() {
    let store = store();
    let engine = ActionEngine::new(store.clone());
    let scene = three_slides();

    engine
        .execute(
            &actions(&[
                "call:set_slide_count:3",
                "call:showElement:hint",
                "call:nextSlide",
                "call:markAssignmentComplete:task1",
                "call:selfDestruct:now",
            ]),
            Some(&scene),
        )
        .await;

    assert_eq!(store.get("slideCount"), Some(json!(3)));
    assert_eq!(store.get("activeElements"), Some(json!({ "hint": true })));
    assert_eq!(store.slide_index(), 1);
    assert_eq!(store.assignments().len(), 1);
}

#[tokio::test]
async fn test_mark_complete_emits_success() {
    let store = store();
    let success = record(store.bus(), "success:task1");
    let engine = ActionEngine::new(store.clone());

    engine.execute(&actions(&["mark_complete:task1"]), None).await;
    assert_eq!(success.lock().unwrap().len(), 1);
    assert_eq!(
        store.assignments(),
        vec![json!({"id": "task1", "name": "task1", "submissionstatus": "submitted"})]
    );
}

#[tokio::test]
async fn test_end_and_emit_publish_events() {
    let store = store();
    let end = record(store.bus(), "end:intro");
    let closed = record(store.bus(), "end:video7");
    let engine = ActionEngine::new(store.clone());

    engine
        .execute(&actions(&["end:intro", "emit:end:video7", "audio_finished"]), None)
        .await;
    assert_eq!(end.lock().unwrap().len(), 1);
    assert_eq!(closed.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_upload_success_marks_submitted() {
    let store = store();
    store.replace_assignments(vec![json!({ "id": "42", "name": "Lab report" })]);
    let started = record(store.bus(), "upload_file_report");
    let success = record(store.bus(), "success:upload_file_report");
    let submitter = Arc::new(ScriptedSubmitter::new(false));
    let engine = ActionEngine::new(store.clone()).with_submitter(submitter.clone());

    let upload = Action::UploadFile(UploadRequest {
        id: "report".into(),
        assignment_id: "42".into(),
        file: Some(SubmissionFile {
            name: "report.pdf".into(),
            content: b"%PDF".to_vec(),
            mime: Some("application/pdf".into()),
        }),
        file_path: None,
    });
    engine.execute_decoded(vec![upload], None).await;

    assert_eq!(started.lock().unwrap().len(), 1);
    assert_eq!(*success.lock().unwrap(), vec![json!({ "status": "ok" })]);
    assert_eq!(
        *submitter.received.lock().unwrap(),
        vec![("42".to_string(), "report.pdf".to_string())]
    );
    assert_eq!(store.assignments()[0]["submissionstatus"], json!("submitted"));
    assert_eq!(store.assignments().len(), 1);
}

#[tokio::test]
async fn test_upload_reads_file_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("answer.txt");
    std::fs::write(&path, "42").unwrap();

    let store = store();
    let submitter = Arc::new(ScriptedSubmitter::new(false));
    let engine = ActionEngine::new(store.clone()).with_submitter(submitter.clone());
    let upload = structured(json!({
        "type": "upload_file",
        "id": "answer",
        "assignmentId": "7",
        "file": path.to_string_lossy(),
    }));

    engine.execute(&[upload], None).await;
    assert_eq!(
        *submitter.received.lock().unwrap(),
        vec![("7".to_string(), "answer.txt".to_string())]
    );
}

#[tokio::test]
async fn test_upload_failure_emits_error_and_keeps_state() {
    let store = store();
    store.replace_assignments(vec![json!({ "id": "42" })]);
    let failed = record(store.bus(), "error:upload_file_report");
    let success = record(store.bus(), "success:upload_file_report");
    let engine =
        ActionEngine::new(store.clone()).with_submitter(Arc::new(ScriptedSubmitter::new(true)));

    let request = UploadRequest {
        id: "report".into(),
        assignment_id: "42".into(),
        file: Some(SubmissionFile {
            name: "report.pdf".into(),
            content: vec![1, 2, 3],
            mime: None,
        }),
        file_path: None,
    };
    let err = engine.upload_file(&request).await.unwrap_err();
    assert!(matches!(err.kind, ActionErrorKind::SubmissionFailed(_)));
    assert_eq!(failed.lock().unwrap().len(), 1);
    assert!(success.lock().unwrap().is_empty());
    assert_eq!(store.assignments(), vec![json!({ "id": "42" })]);
}

#[tokio::test]
async fn test_upload_without_file_or_submitter_fails() {
    let store = store();
    let failed = record(store.bus(), "error:upload_file_x");
    let request = UploadRequest {
        id: "x".into(),
        assignment_id: "1".into(),
        file: None,
        file_path: None,
    };

    let err = ActionEngine::new(store.clone())
        .upload_file(&request)
        .await
        .unwrap_err();
    assert!(matches!(err.kind, ActionErrorKind::SubmissionNotConfigured(_)));

    let err = ActionEngine::new(store.clone())
        .with_submitter(Arc::new(ScriptedSubmitter::new(false)))
        .upload_file(&request)
        .await
        .unwrap_err();
    assert!(matches!(err.kind, ActionErrorKind::MissingFile(_)));
    assert_eq!(failed.lock().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_wait_emits_after_delay() {
    let store = store();
    let ended = record(store.bus(), "wait:end:500");
    let engine = ActionEngine::new(store.clone());

    engine.execute(&actions(&["wait:500"]), None).await;
    assert_eq!(engine.resources().len(), 1);
    assert!(ended.lock().unwrap().is_empty());

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(ended.lock().unwrap().len(), 1);
    assert!(engine.resources().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_wait_uses_default_delay() {
    let store = store();
    let ended = record(store.bus(), "wait:end:250");
    let engine = ActionEngine::new(store.clone()).with_default_wait(Duration::from_millis(250));

    engine.execute(&actions(&["wait"]), None).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(ended.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_navigation_cancels_pending_timers() {
    let store = store();
    let ended = record(store.bus(), "wait:end:500");
    let engine = ActionEngine::new(store.clone());
    let scene = three_slides();

    engine
        .execute(&actions(&["wait:500", "next_slide"]), Some(&scene))
        .await;
    assert!(engine.resources().is_empty());

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(ended.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_sounds_are_released_on_navigation_unless_transitional() {
    let store = store();
    let audio = Arc::new(RecordingAudio::default());
    let stopped = audio.stopped.clone();
    let engine = ActionEngine::new(store.clone()).with_audio(audio.clone());

    let mut audios = std::collections::BTreeMap::new();
    audios.insert("bridge".to_string(), AssetEntry::from_src("audio/bridge.mp3"));
    let catalog = AssetCatalog::new(Default::default(), audios, Default::default());
    let scene = Scene::new(three_slides().slides().clone(), catalog).with_asset_index(
        [("bridge".to_string(), "https://cdn.test/audio/bridge.mp3".to_string())]
            .into_iter()
            .collect(),
    );

    engine
        .execute(
            &actions(&["play_sound:click.mp3", "play_sound:bridge:transitional"]),
            Some(&scene),
        )
        .await;
    assert_eq!(
        *audio.played.lock().unwrap(),
        vec!["click.mp3", "https://cdn.test/audio/bridge.mp3"]
    );
    assert_eq!(engine.resources().len(), 2);

    engine.execute(&actions(&["next_slide"]), Some(&scene)).await;
    assert_eq!(stopped.load(Ordering::SeqCst), 1);
    assert_eq!(engine.resources().len(), 1);

    engine.execute(&actions(&["next_slide"]), Some(&scene)).await;
    assert_eq!(stopped.load(Ordering::SeqCst), 2);
    assert!(engine.resources().is_empty());
}

#[tokio::test]
async fn test_concurrent_batches_do_not_interleave() {
    let store = store();
    let engine = Arc::new(ActionEngine::new(store.clone()));
    let order = Arc::new(Mutex::new(Vec::new()));
    for tag in ["a", "b"] {
        let order = order.clone();
        store
            .bus()
            .subscribe(format!("step:{tag}"), move |_| order.lock().unwrap().push(tag));
    }

    let first = {
        let engine = engine.clone();
        tokio::spawn(async move {
            engine
                .execute(&actions(&["emit:step:a", "emit:step:a"]), None)
                .await
        })
    };
    let second = {
        let engine = engine.clone();
        tokio::spawn(async move {
            engine
                .execute(&actions(&["emit:step:b", "emit:step:b"]), None)
                .await
        })
    };
    first.await.unwrap();
    second.await.unwrap();

    let order = order.lock().unwrap().clone();
    assert!(order == ["a", "a", "b", "b"] || order == ["b", "b", "a", "a"]);
}

#[tokio::test]
async fn test_visibility_reapply_waits_for_running_batch() {
    let store = store();
    store.replace_assignments(vec![json!({ "id": "42" })]);
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let engine = Arc::new(ActionEngine::new(store.clone()).with_submitter(Arc::new(
        HeldSubmitter {
            entered: entered.clone(),
            release: release.clone(),
        },
    )));
    let scene = Arc::new(Scene::new(
        vec![Slide::new(
            "only",
            Default::default(),
            vec![
                Element::new(Some("badge".into()), Some("score >= 10".into()), vec![]),
                Element::new(Some("manual".into()), None, vec![]),
            ],
        )],
        AssetCatalog::default(),
    ));

    let batch = {
        let engine = engine.clone();
        let scene = scene.clone();
        tokio::spawn(async move {
            let upload = Action::UploadFile(UploadRequest {
                id: "report".into(),
                assignment_id: "42".into(),
                file: Some(SubmissionFile {
                    name: "report.pdf".into(),
                    content: b"%PDF".to_vec(),
                    mime: None,
                }),
                file_path: None,
            });
            engine
                .execute_decoded(
                    vec![upload, Action::Show("manual".into())],
                    Some(scene.as_ref()),
                )
                .await
        })
    };
    entered.notified().await;

    let reapply = {
        let engine = engine.clone();
        let scene = scene.clone();
        tokio::spawn(async move { engine.reapply_visibility(&scene).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!reapply.is_finished());

    release.notify_one();
    batch.await.unwrap();
    reapply.await.unwrap();
    assert_eq!(
        store.get("activeElements").unwrap(),
        json!({ "manual": true, "badge": false })
    );
}

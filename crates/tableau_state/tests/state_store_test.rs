//! Integration tests for the state store.

use serde_json::{Value as JsonValue, json};
use std::sync::{Arc, Mutex};
use tableau_core::{EventBus, PersistenceTier};
use tableau_interface::BackingStore;
use tableau_state::{FileBackingStore, MemoryBackingStore, StateStore};

const NS: &str = "simulator_state_test";

fn fresh(session: &MemoryBackingStore, local: &MemoryBackingStore) -> StateStore {
    StateStore::load(
        NS,
        EventBus::new(),
        Arc::new(session.clone()),
        Arc::new(local.clone()),
    )
}

fn stores() -> (MemoryBackingStore, MemoryBackingStore) {
    (
        MemoryBackingStore::new("session"),
        MemoryBackingStore::new("local"),
    )
}

#[test]
fn test_defaults_on_empty_storage() {
    let (session, local) = stores();
    let store = fresh(&session, &local);
    assert_eq!(store.get("slideIndex"), Some(json!(0)));
    assert_eq!(store.get("currentSceneFile"), Some(JsonValue::Null));
    assert_eq!(store.get("activeElements"), Some(json!({})));
    assert_eq!(store.get("score"), Some(json!(0)));
    assert_eq!(store.assignments(), Vec::<JsonValue>::new());
    assert!(store.custom_view().is_empty());
}

#[test]
fn test_increment_then_decrement() {
    let (session, local) = stores();
    let store = fresh(&session, &local);
    store.set("key", json!(5));
    store.set("key", json!("+3"));
    store.set("key", json!("+-1"));
    assert_eq!(store.get("key"), Some(json!(7)));
}

#[test]
fn test_persistence_round_trip() {
    let (session, local) = stores();
    {
        let store = fresh(&session, &local);
        store.set("slideIndex", json!(3));
        store.set("score", json!(42));
        store.set("scratch", json!("not persisted"));
    }

    let reloaded = fresh(&session, &local);
    assert_eq!(reloaded.get("slideIndex"), Some(json!(3)));
    assert_eq!(reloaded.get("score"), Some(json!(42)));
    assert_eq!(reloaded.get("scratch"), None);

    assert_eq!(
        session.get("simulator_state_test:slideIndex").as_deref(),
        Some("3")
    );
    assert_eq!(local.get("simulator_state_test:score").as_deref(), Some("42"));
    assert!(session.get("simulator_state_test:score").is_none());
}

#[test]
fn test_corrupt_values_fall_back_to_defaults() {
    let (session, local) = stores();
    session
        .set("simulator_state_test:slideIndex", "{broken")
        .unwrap();
    session
        .set("simulator_state_test:assignments", "{\"not\":\"a list\"}")
        .unwrap();
    local
        .set("simulator_state_test:custom_store:local", "[1,2")
        .unwrap();

    let store = fresh(&session, &local);
    assert_eq!(store.get("slideIndex"), Some(json!(0)));
    assert_eq!(store.get("assignments"), Some(json!([])));
    assert!(store.custom_view().is_empty());
}

#[test]
fn test_custom_tiers_are_independent() {
    let (session, local) = stores();
    let store = fresh(&session, &local);

    store.set_custom("a", json!(1), Some(PersistenceTier::Session));
    store.set_custom("a", json!(2), Some(PersistenceTier::Local));

    assert_eq!(store.get_custom("a"), Some(json!(2)));
    assert_eq!(
        store.custom_in_tier(PersistenceTier::Session, "a"),
        Some(json!(1))
    );
    assert_eq!(
        session
            .get("simulator_state_test:custom_store:session")
            .as_deref(),
        Some("{\"a\":1}")
    );
    assert_eq!(
        local.get("simulator_state_test:custom_store:local").as_deref(),
        Some("{\"a\":2}")
    );
}

#[test]
fn test_custom_hydration_prefers_session() {
    let (session, local) = stores();
    {
        let store = fresh(&session, &local);
        store.set_custom("a", json!("long"), Some(PersistenceTier::Local));
        store.set_custom("a", json!("short"), Some(PersistenceTier::Session));
        store.set_custom("b", json!(true), Some(PersistenceTier::Local));
        store.set_custom("volatile", json!(1), None);
    }

    let reloaded = fresh(&session, &local);
    assert_eq!(reloaded.get_custom("a"), Some(json!("short")));
    assert_eq!(reloaded.get_custom("b"), Some(json!(true)));
    assert_eq!(reloaded.get_custom("volatile"), None);
}

#[test]
fn test_mark_assignment_complete_appends_then_updates() {
    let (session, local) = stores();
    let store = fresh(&session, &local);

    store.mark_assignment_complete("task1");
    assert_eq!(
        store.assignments(),
        vec![json!({"id": "task1", "name": "task1", "submissionstatus": "submitted"})]
    );

    store.mark_assignment_complete_with("task1", "submissionstatus", json!("graded"));
    let records = store.assignments();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["submissionstatus"], json!("graded"));
}

#[test]
fn test_mark_assignment_matches_existing_by_id() {
    let (session, local) = stores();
    let store = fresh(&session, &local);
    store.replace_assignments(vec![
        json!({"id": 17, "name": "Lab report"}),
        json!({"id": 18, "name": "Quiz"}),
    ]);

    store.mark_assignment_complete("17");
    let records = store.assignments();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["submissionstatus"], json!("submitted"));
    assert!(records[1].get("submissionstatus").is_none());
    assert!(session.get("simulator_state_test:assignments").is_some());
}

#[test]
fn test_set_publishes_key_then_full_state() {
    let (session, local) = stores();
    let bus = EventBus::new();
    let store = StateStore::load(NS, bus.clone(), Arc::new(session), Arc::new(local));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let key_seen = seen.clone();
    bus.subscribe("state:score:changed", move |payload| {
        key_seen.lock().unwrap().push(format!("key:{payload}"));
    });
    let all_seen = seen.clone();
    bus.subscribe("state:changed", move |payload| {
        all_seen
            .lock()
            .unwrap()
            .push(format!("all:{}", payload["score"]));
    });

    store.set("score", json!("+2"));
    assert_eq!(*seen.lock().unwrap(), vec!["key:2", "all:2"]);
}

#[test]
fn test_set_custom_publishes_view() {
    let (session, local) = stores();
    let bus = EventBus::new();
    let store = StateStore::load(NS, bus.clone(), Arc::new(session), Arc::new(local));

    let views = Arc::new(Mutex::new(Vec::new()));
    let sink = views.clone();
    bus.subscribe("custom:changed", move |payload| {
        sink.lock().unwrap().push(payload.clone());
    });

    store.set_custom("lang", json!("es"), None);
    assert_eq!(*views.lock().unwrap(), vec![json!({"lang": "es"})]);
}

#[test]
fn test_file_backed_reload() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = StateStore::load(
            NS,
            EventBus::new(),
            Arc::new(FileBackingStore::open(dir.path(), "session").unwrap()),
            Arc::new(FileBackingStore::open(dir.path(), "local").unwrap()),
        );
        store.set("currentSceneFile", json!("lab.yaml"));
        store.set_custom("name", json!("Ada"), Some(PersistenceTier::Local));
    }

    let store = StateStore::load(
        NS,
        EventBus::new(),
        Arc::new(FileBackingStore::open(dir.path(), "session").unwrap()),
        Arc::new(FileBackingStore::open(dir.path(), "local").unwrap()),
    );
    assert_eq!(store.get("currentSceneFile"), Some(json!("lab.yaml")));
    assert_eq!(store.get_custom("name"), Some(json!("Ada")));
}

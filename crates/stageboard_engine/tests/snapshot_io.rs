use std::fs;
use std::sync::Once;

use pretty_assertions::assert_eq;
use serde_json::json;
use stageboard_engine::{
    create_progress_snapshot, load_progress_snapshot, write_progress_snapshot,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(board_logging::initialize_for_tests);
}

#[test]
fn missing_snapshot_loads_as_none() {
    init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(load_progress_snapshot(&dir.path().join("missing.json")).is_none());
}

#[test]
fn unparseable_snapshot_loads_as_none() {
    init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("progress.json");
    fs::write(&path, "{not json").expect("write");
    assert!(load_progress_snapshot(&path).is_none());

    fs::write(&path, "[1, 2, 3]").expect("write");
    assert!(load_progress_snapshot(&path).is_none());
}

#[test]
fn round_trip_preserves_stage_order() {
    init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("progress.json");

    let snapshot = create_progress_snapshot([("alpha", "Alpha"), ("beta", "Beta"), ("gamma", "")]);
    write_progress_snapshot(&path, &snapshot).expect("write snapshot");

    let loaded = load_progress_snapshot(&path).expect("load snapshot");
    let ids: Vec<&str> = loaded
        .stages
        .iter()
        .map(|stage| stage.stage_id.as_str())
        .collect();
    assert_eq!(ids, vec!["alpha", "beta", "gamma"]);
    assert_eq!(loaded.stages[0].title, "Alpha");
    assert!(loaded
        .stages
        .iter()
        .all(|stage| stage.status == "pending" && stage.messages.is_empty()));
}

#[test]
fn stage_id_field_wins_over_map_key() {
    init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("progress.json");
    let doc = json!({
        "stages": {
            "key-a": {"stage_id": "real-a", "title": "A", "status": "running"},
            "key-b": {"title": "B"},
        }
    });
    fs::write(&path, doc.to_string()).expect("write");

    let loaded = load_progress_snapshot(&path).expect("load snapshot");
    assert_eq!(loaded.stages[0].stage_id, "real-a");
    // An absent id field falls back to the map key.
    assert_eq!(loaded.stages[1].stage_id, "key-b");
}

#[test]
fn malformed_stage_fields_degrade_to_defaults() {
    init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("progress.json");
    let doc = json!({
        "stages": {
            "odd": {"status": 7, "messages": "not-a-list", "metadata": []},
        }
    });
    fs::write(&path, doc.to_string()).expect("write");

    let loaded = load_progress_snapshot(&path).expect("load snapshot");
    let stage = &loaded.stages[0];
    assert_eq!(stage.stage_id, "odd");
    assert_eq!(stage.status, "");
    assert_eq!(stage.messages, vec!["not-a-list".to_string()]);
    assert!(stage.metadata.is_empty());
}

#[test]
fn write_replaces_an_existing_snapshot() {
    init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("progress.json");

    write_progress_snapshot(&path, &create_progress_snapshot([("alpha", "Alpha")]))
        .expect("first write");
    write_progress_snapshot(&path, &create_progress_snapshot([("beta", "Beta")]))
        .expect("second write");

    let loaded = load_progress_snapshot(&path).expect("load snapshot");
    assert_eq!(loaded.stages.len(), 1);
    assert_eq!(loaded.stages[0].stage_id, "beta");
}

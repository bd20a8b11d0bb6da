use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::persist::{write_atomic, PersistError};

/// One stage as recorded in the snapshot file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StageRecord {
    pub stage_id: String,
    pub title: String,
    pub status: String,
    pub messages: Vec<String>,
    pub metadata: Map<String, Value>,
}

/// The orchestrator's current view of stage progress, in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressSnapshot {
    pub stages: Vec<StageRecord>,
}

/// Load a snapshot from `path`. Returns `None` when the file is missing or
/// not valid JSON; a readable document degrades field-by-field rather than
/// failing wholesale.
pub fn load_progress_snapshot(path: &Path) -> Option<ProgressSnapshot> {
    let text = fs::read_to_string(path).ok()?;
    let doc: Value = serde_json::from_str(&text).ok()?;
    let doc = doc.as_object()?;

    let stages = doc
        .get("stages")
        .and_then(Value::as_object)
        .map(|stages| {
            stages
                .iter()
                .map(|(key, value)| stage_from_value(key, value))
                .collect()
        })
        .unwrap_or_default();

    Some(ProgressSnapshot { stages })
}

/// Build an all-pending snapshot from `(id, title)` pairs.
pub fn create_progress_snapshot<'a>(
    stages: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> ProgressSnapshot {
    ProgressSnapshot {
        stages: stages
            .into_iter()
            .map(|(stage_id, title)| StageRecord {
                stage_id: stage_id.to_string(),
                title: title.to_string(),
                status: "pending".to_string(),
                messages: Vec::new(),
                metadata: Map::new(),
            })
            .collect(),
    }
}

/// Atomically write `snapshot` to `path` as pretty-printed JSON.
pub fn write_progress_snapshot(
    path: &Path,
    snapshot: &ProgressSnapshot,
) -> Result<(), PersistError> {
    let doc = snapshot_to_value(snapshot);
    let content = serde_json::to_string_pretty(&doc).map_err(|e| {
        PersistError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })?;
    write_atomic(path, &content)
}

/// Snapshot document layout: `{ "stages": { <id>: stage-object } }`, with
/// the map keeping stage order.
pub fn snapshot_to_value(snapshot: &ProgressSnapshot) -> Value {
    let mut stages = Map::new();
    for record in &snapshot.stages {
        let mut stage = Map::new();
        stage.insert("stage_id".into(), Value::String(record.stage_id.clone()));
        stage.insert("title".into(), Value::String(record.title.clone()));
        stage.insert("status".into(), Value::String(record.status.clone()));
        stage.insert(
            "messages".into(),
            Value::Array(record.messages.iter().cloned().map(Value::String).collect()),
        );
        stage.insert("metadata".into(), Value::Object(record.metadata.clone()));
        stages.insert(record.stage_id.clone(), Value::Object(stage));
    }

    let mut doc = Map::new();
    doc.insert("stages".into(), Value::Object(stages));
    Value::Object(doc)
}

fn stage_from_value(key: &str, value: &Value) -> StageRecord {
    let stage = value.as_object();
    let field = |name: &str| {
        stage
            .and_then(|stage| stage.get(name))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };

    // The record's own id wins over the map key; an empty field falls back.
    let stage_id = {
        let id = field("stage_id");
        if id.is_empty() {
            key.to_string()
        } else {
            id
        }
    };

    StageRecord {
        stage_id,
        title: field("title"),
        status: field("status"),
        messages: stage
            .and_then(|stage| stage.get("messages"))
            .map(string_list)
            .unwrap_or_default(),
        metadata: stage
            .and_then(|stage| stage.get("metadata"))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
    }
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Value::String(text) => vec![text.clone()],
        _ => Vec::new(),
    }
}

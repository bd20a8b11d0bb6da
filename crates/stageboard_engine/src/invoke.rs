use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;

use board_logging::{board_info, board_warn};
use serde_json::{json, Map, Value};

use crate::contract::{
    CommandPayload, StageDefinition, StageDefinitionParam, COMMAND_NAME, FALLBACK_STAGE_ID,
    FALLBACK_STAGE_TITLE, RUN_SCHEMA_VERSION,
};
use crate::error::BoardError;
use crate::snapshot::load_progress_snapshot;

/// Everything a display backend needs to put the board on screen.
pub struct LaunchSpec {
    pub snapshot_path: PathBuf,
    pub stage_definitions: Vec<StageDefinition>,
    /// Set by the attached worker when the tracked process finishes; the
    /// board polls it and auto-closes shortly after.
    pub done_flag: Arc<AtomicBool>,
}

/// Display backend invoked for `launch: true`. Injected so the invocation
/// contract is testable without a terminal.
pub type BoardRunner = dyn Fn(LaunchSpec) -> Result<(), BoardError> + Send + Sync;

/// Worker attached to a launch; runs on its own thread and receives the
/// shared done flag.
pub type BoardWorker = Box<dyn FnOnce(Arc<AtomicBool>) + Send + 'static>;

/// Stage definitions as resolved at invocation time, plus how they were
/// obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStages {
    pub definitions: Vec<StageDefinition>,
    pub snapshot_exists: bool,
    pub fallback_applied: bool,
}

/// The invocation entry: resolves stage definitions against the snapshot
/// file and optionally launches the display runner.
pub struct ProgressBoard {
    snapshot_path: PathBuf,
    stage_definitions: Vec<StageDefinition>,
    fallback_stage: StageDefinition,
    runner: Option<Box<BoardRunner>>,
}

impl ProgressBoard {
    pub fn new(snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_path: snapshot_path.into(),
            stage_definitions: Vec::new(),
            fallback_stage: StageDefinition::new(FALLBACK_STAGE_ID, FALLBACK_STAGE_TITLE),
            runner: None,
        }
    }

    pub fn with_stage_definitions(mut self, definitions: Vec<StageDefinition>) -> Self {
        self.stage_definitions = definitions;
        self
    }

    pub fn with_fallback_stage(mut self, fallback: StageDefinition) -> Self {
        self.fallback_stage = fallback;
        self
    }

    pub fn with_runner(mut self, runner: Box<BoardRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Definition precedence: explicit caller definitions, then the
    /// snapshot's stages in file order, then the single fallback stage.
    pub fn resolve_stage_definitions(&self) -> ResolvedStages {
        let snapshot = load_progress_snapshot(&self.snapshot_path);
        let snapshot_exists = snapshot.is_some();

        if !self.stage_definitions.is_empty() {
            return ResolvedStages {
                definitions: self.stage_definitions.clone(),
                snapshot_exists,
                fallback_applied: false,
            };
        }

        let from_snapshot: Vec<StageDefinition> = snapshot
            .map(|snapshot| {
                snapshot
                    .stages
                    .into_iter()
                    .map(|record| StageDefinition::new(record.stage_id, record.title))
                    .collect()
            })
            .unwrap_or_default();

        if from_snapshot.is_empty() {
            ResolvedStages {
                definitions: vec![self.fallback_stage.clone()],
                snapshot_exists,
                fallback_applied: true,
            }
        } else {
            ResolvedStages {
                definitions: from_snapshot,
                snapshot_exists,
                fallback_applied: false,
            }
        }
    }

    /// Run the display backend, with an optional worker thread attached.
    /// Returns the invocation metadata for the success report.
    pub fn launch(&self, worker: Option<BoardWorker>) -> Result<Map<String, Value>, BoardError> {
        let resolved = self.resolve_stage_definitions();
        let runner = self
            .runner
            .as_ref()
            .ok_or_else(|| BoardError::Toolkit("no display runner attached".into()))?;

        let done_flag = Arc::new(AtomicBool::new(false));
        let worker_attached = worker.is_some();
        let worker_handle = worker.map(|worker| {
            let flag = Arc::clone(&done_flag);
            thread::spawn(move || worker(flag))
        });

        board_info!(
            "Launching progress board for {:?} with {} stage(s)",
            self.snapshot_path,
            resolved.definitions.len()
        );
        runner(LaunchSpec {
            snapshot_path: self.snapshot_path.clone(),
            stage_definitions: resolved.definitions.clone(),
            done_flag,
        })?;

        let mut metadata = invocation_metadata(&resolved, true);
        metadata.insert("worker_attached".into(), json!(worker_attached));
        if let Some(handle) = worker_handle {
            if handle.join().is_err() {
                board_warn!("Progress board worker thread panicked");
                metadata.insert("worker_error".into(), json!("worker thread panicked"));
            }
        }
        Ok(metadata)
    }
}

/// Validate a JSON command payload and run it, optionally with a display
/// runner for `launch: true`. Always returns a report value; validation and
/// toolkit errors become failure reports instead of panics.
pub fn main_json(payload: &Value, runner: Option<Box<BoardRunner>>) -> Value {
    match run_payload(payload, runner) {
        Ok(report) => report,
        Err(err) => failure_report(&err.to_string(), None),
    }
}

fn run_payload(payload: &Value, runner: Option<Box<BoardRunner>>) -> Result<Value, BoardError> {
    let payload: CommandPayload = serde_json::from_value(payload.clone())
        .map_err(|err| BoardError::InvalidPayload(err.to_string()))?;
    if payload.command != COMMAND_NAME {
        return Err(BoardError::InvalidPayload(format!(
            "unexpected command {:?}",
            payload.command
        )));
    }

    let parameters = payload.parameters;
    let snapshot_path = parameters
        .snapshot_path
        .ok_or_else(|| BoardError::InvalidPayload("parameters.snapshot_path is required".into()))?;
    let definitions = validated_definitions(parameters.stage_definitions)?;

    let mut board = ProgressBoard::new(&snapshot_path).with_stage_definitions(definitions);
    if let Some(fallback) = parameters.fallback_stage {
        if fallback.id.is_empty() {
            return Err(BoardError::InvalidPayload(
                "fallback_stage.id must be non-empty".into(),
            ));
        }
        board = board.with_fallback_stage(fallback.into());
    }
    if let Some(runner) = runner {
        board = board.with_runner(runner);
    }

    let resolved = board.resolve_stage_definitions();
    let metadata = if parameters.launch {
        // The CLI attaches no worker; the flag stays down until an external
        // orchestrator wires one in through `ProgressBoard::launch`.
        board.launch(None)?
    } else {
        invocation_metadata(&resolved, false)
    };

    let message = if parameters.launch {
        "progress board session finished"
    } else {
        "progress board stage definitions resolved"
    };
    Ok(success_report(
        message,
        &snapshot_path,
        &resolved.definitions,
        metadata,
    ))
}

fn validated_definitions(
    params: Vec<StageDefinitionParam>,
) -> Result<Vec<StageDefinition>, BoardError> {
    params
        .into_iter()
        .map(|param| {
            if param.id.is_empty() {
                Err(BoardError::InvalidPayload(
                    "stage_definitions[].id must be non-empty".into(),
                ))
            } else {
                Ok(param.into())
            }
        })
        .collect()
}

fn invocation_metadata(resolved: &ResolvedStages, launched: bool) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("snapshot_exists".into(), json!(resolved.snapshot_exists));
    metadata.insert("fallback_applied".into(), json!(resolved.fallback_applied));
    metadata.insert("launched".into(), json!(launched));
    metadata.insert("stage_count".into(), json!(resolved.definitions.len()));
    metadata
}

fn success_report(
    message: &str,
    snapshot_path: &Path,
    definitions: &[StageDefinition],
    metadata: Map<String, Value>,
) -> Value {
    json!({
        "status": "success",
        "schema_version": RUN_SCHEMA_VERSION,
        "message": message,
        "snapshot_path": snapshot_path.display().to_string(),
        "stage_definitions": definitions,
        "metadata": metadata,
    })
}

/// Build a failure report; `details` is attached when present.
pub fn failure_report(message: &str, details: Option<Map<String, Value>>) -> Value {
    let mut report = Map::new();
    report.insert("status".into(), json!("failure"));
    report.insert("message".into(), json!(message));
    if let Some(details) = details {
        report.insert("details".into(), Value::Object(details));
    }
    Value::Object(report)
}

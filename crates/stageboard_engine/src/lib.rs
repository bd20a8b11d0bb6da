//! Stageboard engine: snapshot IO, the repo index cache, and the invocation
//! contract.
mod contract;
mod error;
mod invoke;
mod persist;
mod repo_index;
mod snapshot;

pub use contract::{
    CommandParameters, CommandPayload, StageDefinition, StageDefinitionParam, COMMAND_NAME,
    FALLBACK_STAGE_ID, FALLBACK_STAGE_TITLE, RUN_SCHEMA_VERSION,
};
pub use error::BoardError;
pub use invoke::{
    failure_report, main_json, BoardRunner, BoardWorker, LaunchSpec, ProgressBoard, ResolvedStages,
};
pub use persist::{write_atomic, PersistError};
pub use repo_index::{RepoIndexCache, RepoIndexEntry, REPO_INDEX_METADATA_KEY};
pub use snapshot::{
    create_progress_snapshot, load_progress_snapshot, snapshot_to_value, write_progress_snapshot,
    ProgressSnapshot, StageRecord,
};

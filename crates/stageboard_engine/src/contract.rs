use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Command name accepted by the invocation entry point.
pub const COMMAND_NAME: &str = "progress_board";

/// Schema tag stamped on every success report.
pub const RUN_SCHEMA_VERSION: &str = "progress_board.run/1.0";

/// Stage shown when nothing else yields a definition.
pub const FALLBACK_STAGE_ID: &str = "environment";
pub const FALLBACK_STAGE_TITLE: &str = "Environment";

/// Top-level command payload. Unknown fields are rejected so a mistyped
/// payload fails validation instead of being half-applied.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandPayload {
    pub command: String,
    #[serde(default)]
    pub parameters: CommandParameters,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandParameters {
    pub snapshot_path: Option<PathBuf>,
    #[serde(default)]
    pub stage_definitions: Vec<StageDefinitionParam>,
    pub fallback_stage: Option<StageDefinitionParam>,
    #[serde(default)]
    pub launch: bool,
}

/// Caller-supplied stage definition; the title may be omitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageDefinitionParam {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

/// Resolved stage definition as reported back to the caller: both fields
/// non-empty, the title defaulting to the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageDefinition {
    pub id: String,
    pub title: String,
}

impl StageDefinition {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let id = id.into();
        let title = title.into();
        let title = if title.is_empty() { id.clone() } else { title };
        Self { id, title }
    }
}

impl From<StageDefinitionParam> for StageDefinition {
    fn from(param: StageDefinitionParam) -> Self {
        StageDefinition::new(param.id, param.title)
    }
}

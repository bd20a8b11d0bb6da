use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use board_logging::{board_debug, board_warn};
use serde_json::{Map, Value};

/// Snapshot metadata key pointing at a stage's repo-progress index file.
pub const REPO_INDEX_METADATA_KEY: &str = "repo_progress_index_path";

const REPO_PLACEHOLDER: &str = "<repo>";

/// One normalized entry from a repo-progress index file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RepoIndexEntry {
    pub repo_id: String,
    pub display_name: String,
    pub status: String,
    pub updated_at: String,
    pub messages: Vec<String>,
    pub detail_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
struct CacheSlot {
    path: PathBuf,
    mtime: SystemTime,
    entries: Vec<RepoIndexEntry>,
}

/// Memoized per-stage repo index rows, keyed by stage id and invalidated by
/// modification-time comparison. No filesystem watching.
#[derive(Debug, Default)]
pub struct RepoIndexCache {
    slots: HashMap<String, CacheSlot>,
}

impl RepoIndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh one stage's slot from its snapshot metadata.
    ///
    /// Every failed read attempt clears the slot: the board shows no data
    /// rather than stale rows.
    pub fn refresh_stage(&mut self, stage_id: &str, metadata: &Map<String, Value>) {
        let index_path = metadata
            .get(REPO_INDEX_METADATA_KEY)
            .and_then(Value::as_str)
            .filter(|path| !path.is_empty());
        let Some(index_path) = index_path else {
            self.slots.remove(stage_id);
            return;
        };
        let index_path = PathBuf::from(index_path);

        // Stat failure counts as "no data", same as a missing metadata key.
        let mtime = match fs::metadata(&index_path).and_then(|meta| meta.modified()) {
            Ok(mtime) => mtime,
            Err(_) => {
                self.slots.remove(stage_id);
                return;
            }
        };

        if let Some(slot) = self.slots.get(stage_id) {
            if slot.path == index_path && slot.mtime == mtime {
                return;
            }
        }

        match read_index_entries(&index_path) {
            Some(entries) => {
                board_debug!(
                    "Repo index for stage {} reloaded from {:?} ({} entries)",
                    stage_id,
                    index_path,
                    entries.len()
                );
                self.slots.insert(
                    stage_id.to_string(),
                    CacheSlot {
                        path: index_path,
                        mtime,
                        entries,
                    },
                );
            }
            None => {
                board_warn!(
                    "Unreadable repo index {:?} for stage {}; dropping rows",
                    index_path,
                    stage_id
                );
                self.slots.remove(stage_id);
            }
        }
    }

    pub fn rows(&self, stage_id: &str) -> Option<&[RepoIndexEntry]> {
        self.slots.get(stage_id).map(|slot| slot.entries.as_slice())
    }

    /// Evict slots for stages the latest snapshot no longer mentions.
    pub fn prune<'a>(&mut self, observed: impl IntoIterator<Item = &'a str>) {
        let observed: HashSet<&str> = observed.into_iter().collect();
        self.slots
            .retain(|stage_id, _| observed.contains(stage_id.as_str()));
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

fn read_index_entries(path: &Path) -> Option<Vec<RepoIndexEntry>> {
    let text = fs::read_to_string(path).ok()?;
    let doc: Value = serde_json::from_str(&text).ok()?;
    let doc = doc.as_object()?;

    // Relative detail paths resolve against the declared entries_dir, which
    // itself defaults to the index file's own directory.
    let entries_dir = doc
        .get("entries_dir")
        .and_then(Value::as_str)
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| path.parent().map(Path::to_path_buf))
        .unwrap_or_default();

    let entries = doc
        .get("entries")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| normalize_entry(item, &entries_dir))
                .collect()
        })
        .unwrap_or_default();

    Some(entries)
}

fn normalize_entry(value: &Value, entries_dir: &Path) -> Option<RepoIndexEntry> {
    let entry = value.as_object()?;
    let field = |name: &str| {
        entry
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };

    let repo_id = field("repo_id");
    let display_name = {
        let name = field("display_name");
        if !name.is_empty() {
            name
        } else if !repo_id.is_empty() {
            repo_id.clone()
        } else {
            REPO_PLACEHOLDER.to_string()
        }
    };
    let status = {
        let status = field("status");
        if status.is_empty() {
            "pending".to_string()
        } else {
            status
        }
    };

    Some(RepoIndexEntry {
        repo_id,
        display_name,
        status,
        updated_at: field("updated_at"),
        messages: entry
            .get("message_preview")
            .map(message_list)
            .unwrap_or_default(),
        detail_path: entry
            .get("detail_path")
            .and_then(Value::as_str)
            .filter(|path| !path.is_empty())
            .map(|path| entries_dir.join(path)),
    })
}

/// Accepts a list of strings or a single string; blanks are dropped either
/// way.
fn message_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(str::to_string)
            .collect(),
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                Vec::new()
            } else {
                vec![text.to_string()]
            }
        }
        _ => Vec::new(),
    }
}

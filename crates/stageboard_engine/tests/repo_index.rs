use std::fs;
use std::path::Path;
use std::sync::Once;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};
use stageboard_engine::{RepoIndexCache, REPO_INDEX_METADATA_KEY};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(board_logging::initialize_for_tests);
}

fn index_metadata(path: &Path) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert(
        REPO_INDEX_METADATA_KEY.into(),
        json!(path.display().to_string()),
    );
    metadata
}

fn write_index(path: &Path, doc: &Value) {
    fs::write(path, doc.to_string()).expect("write index");
}

#[test]
fn entries_normalize_with_fallbacks() {
    init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("index.json");
    write_index(
        &path,
        &json!({
            "entries": [
                {},
                {"repo_id": "repo-a", "message_preview": "  cloned  "},
                {
                    "repo_id": "repo-b",
                    "display_name": "Repo B",
                    "status": "running",
                    "updated_at": "2026-08-06T09:00:00Z",
                    "message_preview": ["fetching", "   ", "merging"],
                    "detail_path": "details/repo_b.json",
                },
                "not-an-object",
            ]
        }),
    );

    let mut cache = RepoIndexCache::new();
    cache.refresh_stage("alpha", &index_metadata(&path));
    let rows = cache.rows("alpha").expect("rows");

    assert_eq!(rows.len(), 3);

    assert_eq!(rows[0].display_name, "<repo>");
    assert_eq!(rows[0].status, "pending");
    assert_eq!(rows[0].updated_at, "");
    assert!(rows[0].messages.is_empty());
    assert!(rows[0].detail_path.is_none());

    assert_eq!(rows[1].display_name, "repo-a");
    assert_eq!(rows[1].messages, vec!["cloned".to_string()]);

    assert_eq!(rows[2].display_name, "Repo B");
    assert_eq!(
        rows[2].messages,
        vec!["fetching".to_string(), "merging".to_string()]
    );
    // No entries_dir declared: paths resolve against the index directory.
    assert_eq!(
        rows[2].detail_path.as_deref(),
        Some(dir.path().join("details/repo_b.json").as_path())
    );
}

#[test]
fn declared_entries_dir_anchors_detail_paths() {
    init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("index.json");
    let entries_dir = dir.path().join("payloads");
    write_index(
        &path,
        &json!({
            "entries_dir": entries_dir.display().to_string(),
            "entries": [
                {"repo_id": "repo-a", "detail_path": "repo_a.json"},
            ]
        }),
    );

    let mut cache = RepoIndexCache::new();
    cache.refresh_stage("alpha", &index_metadata(&path));
    let rows = cache.rows("alpha").expect("rows");
    assert_eq!(
        rows[0].detail_path.as_deref(),
        Some(entries_dir.join("repo_a.json").as_path())
    );
}

#[test]
fn unchanged_mtime_serves_cached_rows() {
    init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("index.json");
    write_index(&path, &json!({"entries": [{"repo_id": "first"}]}));
    let original_mtime = fs::metadata(&path)
        .and_then(|meta| meta.modified())
        .expect("mtime");

    let mut cache = RepoIndexCache::new();
    let metadata = index_metadata(&path);
    cache.refresh_stage("alpha", &metadata);
    assert_eq!(cache.rows("alpha").expect("rows")[0].repo_id, "first");

    // Rewrite the file but pin the mtime back: the cache must not re-parse.
    write_index(&path, &json!({"entries": [{"repo_id": "second"}]}));
    let file = fs::OpenOptions::new()
        .write(true)
        .open(&path)
        .expect("open index");
    file.set_modified(original_mtime).expect("set mtime");
    drop(file);

    cache.refresh_stage("alpha", &metadata);
    assert_eq!(cache.rows("alpha").expect("rows")[0].repo_id, "first");

    // Bumping the mtime forces the re-read.
    let file = fs::OpenOptions::new()
        .write(true)
        .open(&path)
        .expect("open index");
    file.set_modified(original_mtime + Duration::from_secs(5))
        .expect("set mtime");
    drop(file);

    cache.refresh_stage("alpha", &metadata);
    assert_eq!(cache.rows("alpha").expect("rows")[0].repo_id, "second");
}

#[test]
fn missing_metadata_key_clears_rows() {
    init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("index.json");
    write_index(&path, &json!({"entries": [{"repo_id": "repo-a"}]}));

    let mut cache = RepoIndexCache::new();
    cache.refresh_stage("alpha", &index_metadata(&path));
    assert!(cache.rows("alpha").is_some());

    cache.refresh_stage("alpha", &Map::new());
    assert!(cache.rows("alpha").is_none());
}

#[test]
fn stat_failure_clears_rows() {
    init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("index.json");
    write_index(&path, &json!({"entries": [{"repo_id": "repo-a"}]}));

    let mut cache = RepoIndexCache::new();
    let metadata = index_metadata(&path);
    cache.refresh_stage("alpha", &metadata);
    assert!(cache.rows("alpha").is_some());

    fs::remove_file(&path).expect("remove index");
    cache.refresh_stage("alpha", &metadata);
    assert!(cache.rows("alpha").is_none());
}

#[test]
fn broken_index_file_clears_rows() {
    init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("index.json");
    write_index(&path, &json!({"entries": [{"repo_id": "repo-a"}]}));

    let mut cache = RepoIndexCache::new();
    let metadata = index_metadata(&path);
    cache.refresh_stage("alpha", &metadata);
    assert!(cache.rows("alpha").is_some());

    // A decode failure drops the rows instead of serving the stale ones.
    fs::write(&path, "{broken").expect("write garbage");
    let file = fs::OpenOptions::new()
        .write(true)
        .open(&path)
        .expect("open index");
    file.set_modified(std::time::SystemTime::now() + Duration::from_secs(5))
        .expect("set mtime");
    drop(file);

    cache.refresh_stage("alpha", &metadata);
    assert!(cache.rows("alpha").is_none());
}

#[test]
fn unobserved_stages_are_pruned() {
    init_logging();
    let dir = tempfile::tempdir().expect("tempdir");
    let alpha_path = dir.path().join("alpha.json");
    let beta_path = dir.path().join("beta.json");
    write_index(&alpha_path, &json!({"entries": [{"repo_id": "a"}]}));
    write_index(&beta_path, &json!({"entries": [{"repo_id": "b"}]}));

    let mut cache = RepoIndexCache::new();
    cache.refresh_stage("alpha", &index_metadata(&alpha_path));
    cache.refresh_stage("beta", &index_metadata(&beta_path));
    assert_eq!(cache.len(), 2);

    cache.prune(["alpha"]);
    assert!(cache.rows("alpha").is_some());
    assert!(cache.rows("beta").is_none());
}

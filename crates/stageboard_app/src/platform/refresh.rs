use stageboard_core::{RepoRow, StageObservation};
use stageboard_engine::{ProgressSnapshot, RepoIndexCache, RepoIndexEntry};

/// Turn a freshly loaded snapshot into per-stage observations, routing each
/// stage's metadata through the repo index cache and pruning slots for
/// stages the snapshot no longer mentions.
pub(crate) fn collect_observations(
    snapshot: &ProgressSnapshot,
    cache: &mut RepoIndexCache,
) -> Vec<StageObservation> {
    for record in &snapshot.stages {
        cache.refresh_stage(&record.stage_id, &record.metadata);
    }
    cache.prune(
        snapshot
            .stages
            .iter()
            .map(|record| record.stage_id.as_str()),
    );

    snapshot
        .stages
        .iter()
        .map(|record| StageObservation {
            stage_id: record.stage_id.clone(),
            title: record.title.clone(),
            status: record.status.clone(),
            messages: record.messages.clone(),
            repo_rows: cache
                .rows(&record.stage_id)
                .map(|entries| entries.iter().map(to_repo_row).collect()),
        })
        .collect()
}

fn to_repo_row(entry: &RepoIndexEntry) -> RepoRow {
    RepoRow {
        repo_id: entry.repo_id.clone(),
        display_name: entry.display_name.clone(),
        status: entry.status.clone(),
        updated_at: entry.updated_at.clone(),
        messages: entry.messages.clone(),
        detail_path: entry
            .detail_path
            .as_ref()
            .map(|path| path.display().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use stageboard_engine::{create_progress_snapshot, RepoIndexCache, REPO_INDEX_METADATA_KEY};

    use super::collect_observations;

    #[test]
    fn observations_carry_cached_repo_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let index_path = dir.path().join("alpha_index.json");
        fs::write(
            &index_path,
            json!({
                "entries": [
                    {"repo_id": "repo-a", "status": "running"},
                ]
            })
            .to_string(),
        )
        .expect("write index");

        let mut snapshot = create_progress_snapshot([("alpha", "Alpha"), ("beta", "Beta")]);
        snapshot.stages[0].metadata.insert(
            REPO_INDEX_METADATA_KEY.into(),
            json!(index_path.display().to_string()),
        );

        let mut cache = RepoIndexCache::new();
        let observations = collect_observations(&snapshot, &mut cache);

        assert_eq!(observations.len(), 2);
        let alpha_rows = observations[0].repo_rows.as_deref().expect("alpha rows");
        assert_eq!(alpha_rows.len(), 1);
        assert_eq!(alpha_rows[0].display_name, "repo-a");
        assert_eq!(alpha_rows[0].status, "running");
        assert!(observations[1].repo_rows.is_none());
    }
}

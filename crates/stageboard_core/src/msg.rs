#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// A poll found the snapshot file and produced per-stage observations.
    SnapshotLoaded(Vec<crate::StageObservation>),
    /// A poll found no readable snapshot file.
    SnapshotMissing,
    /// The external worker-done flag was observed set.
    WorkerFinished,
    /// User moved the checklist selection up.
    MoveSelectionUp,
    /// User moved the checklist selection down.
    MoveSelectionDown,
    /// The window is going away (user key or elapsed auto-close delay).
    CloseRequested,
}

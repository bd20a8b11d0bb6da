use crate::{CheckMark, RepoRow};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoardViewModel {
    pub banner: String,
    pub all_done: bool,
    pub closing: bool,
    pub stages: Vec<StageRowView>,
    pub selected: Option<usize>,
    /// Repo rows for the selected stage; empty when nothing is selected or
    /// the stage has no cached index data.
    pub repo_rows: Vec<RepoRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRowView {
    pub stage_id: String,
    pub text: String,
    pub mark: CheckMark,
}

use std::collections::HashMap;

use crate::view_model::{BoardViewModel, StageRowView};

/// Stage statuses that count as finished for the aggregate "all done" check.
const DONE_STATUSES: [&str; 3] = ["completed", "attention", "blocked"];

const REPO_PLACEHOLDER: &str = "<repo>";

/// One stage the board tracks: identifier plus display title.
#[derive(Debug, Clone, PartialEq, Eq)]
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

/// Completion marker rendered next to each checklist row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMark {
    NotStarted,
    InProgress,
    Done,
    /// Status string the board does not recognize.
    Indeterminate,
}

impl CheckMark {
    pub fn from_status(status: &str) -> Self {
        let normalized = status.trim().to_ascii_lowercase();
        if DONE_STATUSES.contains(&normalized.as_str()) {
            CheckMark::Done
        } else if normalized == "running" {
            CheckMark::InProgress
        } else if normalized == "pending" {
            CheckMark::NotStarted
        } else {
            CheckMark::Indeterminate
        }
    }

    pub fn is_done(self) -> bool {
        matches!(self, CheckMark::Done)
    }
}

/// One checklist row. Rows are appended as stages are discovered and never
/// removed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistEntry {
    pub stage_id: String,
    pub title: String,
    pub text: String,
    pub mark: CheckMark,
}

/// Normalized per-repository row for one stage's detail table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RepoRow {
    pub repo_id: String,
    pub display_name: String,
    pub status: String,
    pub updated_at: String,
    pub messages: Vec<String>,
    pub detail_path: Option<String>,
}

impl RepoRow {
    /// Display name falls back to the repo id, then a placeholder, so a row
    /// is never rendered without a label.
    pub fn display_label(&self) -> &str {
        if !self.display_name.is_empty() {
            &self.display_name
        } else if !self.repo_id.is_empty() {
            &self.repo_id
        } else {
            REPO_PLACEHOLDER
        }
    }
}

/// One stage as seen in the latest snapshot poll.
///
/// `repo_rows` is `None` when the stage publishes no repo index data; the
/// platform resolves the rows through its cache before building the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageObservation {
    pub stage_id: String,
    pub title: String,
    pub status: String,
    pub messages: Vec<String>,
    pub repo_rows: Option<Vec<RepoRow>>,
}

/// Poll-loop lifecycle. `Completing` is entered exactly once, when the
/// worker-done flag is first observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoardPhase {
    #[default]
    Polling,
    Completing,
    Closed,
}

/// User-facing status line above the checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Banner {
    #[default]
    Initializing,
    WaitingForSnapshot,
    Tracking,
    AllStagesReported,
    ShuttingDown,
}

impl Banner {
    pub fn label(self) -> &'static str {
        match self {
            Banner::Initializing => "Initializing orchestration tooling...",
            Banner::WaitingForSnapshot => "Waiting for progress snapshot feed...",
            Banner::Tracking => "Tracking orchestration stages...",
            Banner::AllStagesReported => "All stages reported. Waiting for tooling shutdown...",
            Banner::ShuttingDown => "Tooling finished. Closing progress board...",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoardState {
    entries: Vec<ChecklistEntry>,
    index: HashMap<String, usize>,
    repo_rows: HashMap<String, Vec<RepoRow>>,
    selected: Option<usize>,
    banner: Banner,
    phase: BoardPhase,
    all_done: bool,
}

impl BoardState {
    pub fn new(definitions: Vec<StageDefinition>) -> Self {
        let mut state = Self::default();
        for definition in definitions {
            state.track_stage(definition);
        }
        if !state.entries.is_empty() {
            state.selected = Some(0);
        }
        state
    }

    pub fn view(&self) -> BoardViewModel {
        let repo_rows = self
            .selected_stage_id()
            .and_then(|stage_id| self.repo_rows.get(stage_id))
            .cloned()
            .unwrap_or_default();

        BoardViewModel {
            banner: self.banner.label().to_string(),
            all_done: self.all_done,
            closing: self.phase != BoardPhase::Polling,
            stages: self
                .entries
                .iter()
                .map(|entry| StageRowView {
                    stage_id: entry.stage_id.clone(),
                    text: entry.text.clone(),
                    mark: entry.mark,
                })
                .collect(),
            selected: self.selected,
            repo_rows,
        }
    }

    pub fn phase(&self) -> BoardPhase {
        self.phase
    }

    pub fn selected_stage_id(&self) -> Option<&str> {
        self.selected
            .and_then(|idx| self.entries.get(idx))
            .map(|entry| entry.stage_id.as_str())
    }

    /// Merge the latest poll into the checklist: discover unseen stages,
    /// refresh every tracked row, and replace the per-stage repo rows.
    pub(crate) fn apply_observations(&mut self, observations: Vec<StageObservation>) {
        for observation in &observations {
            if self.index.contains_key(&observation.stage_id) {
                continue;
            }
            self.track_stage(StageDefinition::new(
                observation.stage_id.clone(),
                observation.title.clone(),
            ));
        }

        let mut all_done = true;
        {
            let by_id: HashMap<&str, &StageObservation> = observations
                .iter()
                .map(|observation| (observation.stage_id.as_str(), observation))
                .collect();
            for entry in &mut self.entries {
                let observation = by_id.get(entry.stage_id.as_str());
                let status = observation
                    .map(|observation| observation.status.as_str())
                    .filter(|status| !status.is_empty())
                    .unwrap_or("pending");
                let messages: &[String] = observation
                    .map(|observation| observation.messages.as_slice())
                    .unwrap_or(&[]);

                entry.text = display_text(&entry.title, status, messages);
                entry.mark = CheckMark::from_status(status);
                all_done &= entry.mark.is_done();
            }
        }
        self.all_done = all_done;

        let observed_any = !observations.is_empty();

        // Wholesale replacement doubles as cache pruning: rows for stages
        // absent from this poll are dropped.
        let mut repo_rows = HashMap::new();
        for observation in observations {
            if let Some(rows) = observation.repo_rows {
                repo_rows.insert(observation.stage_id, rows);
            }
        }
        self.repo_rows = repo_rows;

        if observed_any && self.phase == BoardPhase::Polling {
            self.banner = if self.all_done {
                Banner::AllStagesReported
            } else {
                Banner::Tracking
            };
        }
    }

    pub(crate) fn note_snapshot_missing(&mut self) {
        if self.phase == BoardPhase::Polling {
            self.banner = Banner::WaitingForSnapshot;
        }
    }

    /// Returns `true` the first time completion is triggered; later calls
    /// are no-ops.
    pub(crate) fn begin_completion(&mut self) -> bool {
        if self.phase != BoardPhase::Polling {
            return false;
        }
        self.phase = BoardPhase::Completing;
        self.banner = Banner::ShuttingDown;
        true
    }

    pub(crate) fn close(&mut self) {
        self.phase = BoardPhase::Closed;
    }

    pub(crate) fn move_selection_up(&mut self) {
        match self.selected {
            Some(idx) => self.selected = Some(idx.saturating_sub(1)),
            None if !self.entries.is_empty() => self.selected = Some(0),
            None => {}
        }
    }

    pub(crate) fn move_selection_down(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let max = self.entries.len() - 1;
        self.selected = Some(match self.selected {
            Some(idx) => (idx + 1).min(max),
            None => 0,
        });
    }

    fn track_stage(&mut self, definition: StageDefinition) {
        let text = display_text(&definition.title, "pending", &[]);
        self.index
            .insert(definition.id.clone(), self.entries.len());
        self.entries.push(ChecklistEntry {
            stage_id: definition.id,
            title: definition.title,
            text,
            mark: CheckMark::NotStarted,
        });
    }
}

/// Checklist row text: `"{title} - {status}"` plus the most recent non-empty
/// message in parentheses, when there is one.
pub(crate) fn display_text(title: &str, status: &str, messages: &[String]) -> String {
    let status = if status.is_empty() { "pending" } else { status };
    match latest_message(messages) {
        Some(message) => format!("{title} - {status} ({message})"),
        None => format!("{title} - {status}"),
    }
}

fn latest_message(messages: &[String]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .map(|message| message.trim())
        .find(|message| !message.is_empty())
}

//! Stageboard core: pure state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{
    BoardPhase, BoardState, Banner, CheckMark, ChecklistEntry, RepoRow, StageDefinition,
    StageObservation,
};
pub use update::update;
pub use view_model::{BoardViewModel, StageRowView};

use crate::{BoardState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: BoardState, msg: Msg) -> (BoardState, Vec<Effect>) {
    let effects = match msg {
        Msg::SnapshotLoaded(observations) => {
            state.apply_observations(observations);
            Vec::new()
        }
        Msg::SnapshotMissing => {
            state.note_snapshot_missing();
            Vec::new()
        }
        Msg::WorkerFinished => {
            if state.begin_completion() {
                vec![Effect::StopPolling, Effect::AnnounceCompletion]
            } else {
                Vec::new()
            }
        }
        Msg::MoveSelectionUp => {
            state.move_selection_up();
            Vec::new()
        }
        Msg::MoveSelectionDown => {
            state.move_selection_down();
            Vec::new()
        }
        Msg::CloseRequested => {
            state.close();
            vec![Effect::StopPolling, Effect::Quit]
        }
    };

    (state, effects)
}

use std::io::{self, IsTerminal};
use std::mem;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use board_logging::board_info;
use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use stageboard_core::{update, BoardState, Effect, Msg, StageDefinition};
use stageboard_engine::{load_progress_snapshot, BoardError, LaunchSpec, RepoIndexCache};

use super::refresh;
use super::ui::constants::{AUTO_CLOSE_DELAY, INPUT_POLL_INTERVAL, POLL_INTERVAL};
use super::ui::render;

/// Display backend for `ProgressBoard::launch`: owns the terminal until the
/// board closes.
pub fn run_board(spec: LaunchSpec) -> Result<(), BoardError> {
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        return Err(BoardError::Toolkit(
            "an interactive terminal (TTY) is required".into(),
        ));
    }

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear().ok();

    let mut session = Session::new(spec);
    let result = run_loop(&mut terminal, &mut session);

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    result
}

struct Session {
    state: BoardState,
    cache: RepoIndexCache,
    snapshot_path: PathBuf,
    done_flag: Arc<AtomicBool>,
    polling: bool,
    last_poll: Option<Instant>,
    close_at: Option<Instant>,
    quit: bool,
}

impl Session {
    fn new(spec: LaunchSpec) -> Self {
        let definitions = spec
            .stage_definitions
            .into_iter()
            .map(|definition| StageDefinition::new(definition.id, definition.title))
            .collect();
        Self {
            state: BoardState::new(definitions),
            cache: RepoIndexCache::new(),
            snapshot_path: spec.snapshot_path,
            done_flag: spec.done_flag,
            polling: true,
            last_poll: None,
            close_at: None,
            quit: false,
        }
    }

    fn poll_due(&self) -> bool {
        self.polling
            && self
                .last_poll
                .is_none_or(|last| last.elapsed() >= POLL_INTERVAL)
    }

    fn poll_tick(&mut self) {
        self.last_poll = Some(Instant::now());
        match load_progress_snapshot(&self.snapshot_path) {
            None => self.dispatch(Msg::SnapshotMissing),
            Some(snapshot) => {
                let observations = refresh::collect_observations(&snapshot, &mut self.cache);
                self.dispatch(Msg::SnapshotLoaded(observations));
                // The done flag is only consulted once the snapshot feed
                // exists; an absent snapshot short-circuits the tick.
                if self.done_flag.load(Ordering::Relaxed) {
                    self.dispatch(Msg::WorkerFinished);
                }
            }
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;

        for effect in effects {
            match effect {
                Effect::StopPolling => self.polling = false,
                Effect::AnnounceCompletion => {
                    board_info!(
                        "Worker completion observed; closing board in {:?}",
                        AUTO_CLOSE_DELAY
                    );
                    self.close_at = Some(Instant::now() + AUTO_CLOSE_DELAY);
                }
                Effect::Quit => self.quit = true,
            }
        }
    }
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut Session,
) -> Result<(), BoardError> {
    loop {
        if session.poll_due() {
            session.poll_tick();
        }
        if let Some(close_at) = session.close_at {
            if Instant::now() >= close_at {
                session.close_at = None;
                session.dispatch(Msg::CloseRequested);
            }
        }

        let view = session.state.view();
        terminal.draw(|frame| render::draw(frame, &view, Local::now()))?;
        if session.quit {
            return Ok(());
        }

        if event::poll(INPUT_POLL_INTERVAL)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(session, key),
                _ => {}
            }
        }
    }
}

fn handle_key(session: &mut Session, key: KeyEvent) {
    match key.code {
        KeyCode::Up => session.dispatch(Msg::MoveSelectionUp),
        KeyCode::Down => session.dispatch(Msg::MoveSelectionDown),
        KeyCode::Char('q') | KeyCode::Esc => session.dispatch(Msg::CloseRequested),
        _ => {}
    }
}

//! App: terminal init, main loop, key and mouse routing, board event plumbing.

use crate::board::{BoardConfig, BoardController, PickOutcome};
use crate::cascade::{DropEvent, SpawnEvent};
use crate::colors::RandomColors;
use crate::grid::Position;
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::Args;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};
use tachyonfx::Effect;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    NewBoard,
    Exit,
}

impl QuitOption {
    fn next(self) -> Self {
        match self {
            Self::Resume => Self::NewBoard,
            Self::NewBoard => Self::Exit,
            Self::Exit => Self::Resume,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Resume => Self::Exit,
            Self::NewBoard => Self::Resume,
            Self::Exit => Self::NewBoard,
        }
    }
}

/// Counters shown in the sidebar. Reset with the board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub committed: u32,
    pub reverted: u32,
    /// Most passes any single committed swap needed.
    pub longest_cascade: usize,
}

/// A board change forwarded from the controller's listeners to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoardMotion {
    Drop(DropEvent),
    Spawn(SpawnEvent),
}

impl BoardMotion {
    /// Cell the bean ended up in.
    fn target(self) -> Position {
        match self {
            Self::Drop(d) => Position::new(d.target_row, d.col),
            Self::Spawn(s) => Position::new(s.row, s.col),
        }
    }
}

pub struct App {
    args: Args,
    theme: Theme,
    board: BoardController,
    motion_rx: Receiver<BoardMotion>,
    screen: Screen,
    quit_selected: QuitOption,
    cursor: Position,
    stats: SessionStats,
    status: String,
    /// Last frame area; mouse clicks are hit-tested against it.
    last_area: Rect,
    /// Cells that received a dropped or spawned bean in the last committed swap.
    motion: Vec<Position>,
    motion_effect: Option<Effect>,
    motion_effect_process_time: Option<Instant>,
}

impl App {
    pub fn new(args: Args, config: BoardConfig, theme: Theme) -> Result<Self> {
        let mut board = BoardController::new(config, Box::new(RandomColors::from_seed(args.seed)))?;
        let (tx, motion_rx) = mpsc::channel();
        let drop_tx = tx.clone();
        board.on_drop_event(move |e| {
            let _ = drop_tx.send(BoardMotion::Drop(*e));
        });
        board.on_spawn_event(move |e| {
            let _ = tx.send(BoardMotion::Spawn(*e));
        });
        info!(
            rows = config.rows,
            cols = config.cols,
            palette = config.palette_size,
            seed = ?args.seed,
            "board ready"
        );
        Ok(Self {
            args,
            theme,
            board,
            motion_rx,
            screen: Screen::Playing,
            quit_selected: QuitOption::Resume,
            cursor: Position::new(0, 0),
            stats: SessionStats::default(),
            status: String::from("Pick a bean"),
            last_area: Rect::default(),
            motion: Vec::new(),
            motion_effect: None,
            motion_effect_process_time: None,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        let result = self.run_loop(&mut terminal);

        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;
        info!(
            committed = self.stats.committed,
            reverted = self.stats.reverted,
            "session ended"
        );
        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.args.frame_rate.max(1.0));
        loop {
            let frame_start = Instant::now();

            if self.args.no_animation {
                self.motion.clear();
            }
            if self.motion_effect.as_ref().is_some_and(Effect::done) {
                self.clear_motion();
            }

            let quit_selected = (self.screen == Screen::QuitMenu).then_some(self.quit_selected);
            terminal.draw(|f| {
                self.last_area = f.area();
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.board,
                    &self.theme,
                    self.cursor,
                    &self.stats,
                    &self.status,
                    self.last_area,
                    &self.motion,
                    &mut self.motion_effect,
                    &mut self.motion_effect_process_time,
                    frame_start,
                    self.args.no_animation,
                    quit_selected,
                );
            })?;

            let timeout = frame_duration.saturating_sub(frame_start.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let exit = match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            self.handle_action(key_to_action(key))?
                        }
                        Event::Mouse(mouse) => {
                            self.handle_mouse(mouse)?;
                            false
                        }
                        _ => false,
                    };
                    if exit {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Apply one action. Returns true when the app should exit.
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        match self.screen {
            Screen::Playing => match action {
                Action::CursorLeft => self.move_cursor(0, -1),
                Action::CursorRight => self.move_cursor(0, 1),
                Action::CursorUp => self.move_cursor(-1, 0),
                Action::CursorDown => self.move_cursor(1, 0),
                Action::Pick => self.pick(self.cursor)?,
                Action::NewBoard => self.new_board(),
                Action::Quit => {
                    self.screen = Screen::QuitMenu;
                    self.quit_selected = QuitOption::Resume;
                }
                Action::None => {}
            },
            Screen::QuitMenu => match action {
                Action::CursorUp | Action::CursorLeft => {
                    self.quit_selected = self.quit_selected.prev();
                }
                Action::CursorDown | Action::CursorRight => {
                    self.quit_selected = self.quit_selected.next();
                }
                Action::Pick => match self.quit_selected {
                    QuitOption::Resume => self.screen = Screen::Playing,
                    QuitOption::NewBoard => {
                        self.new_board();
                        self.screen = Screen::Playing;
                    }
                    QuitOption::Exit => return Ok(true),
                },
                Action::Quit => self.screen = Screen::Playing,
                Action::NewBoard | Action::None => {}
            },
        }
        Ok(false)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        if self.screen != Screen::Playing || mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return Ok(());
        }
        let grid = self.board.grid();
        let hit = crate::ui::position_at(
            self.last_area,
            grid.rows(),
            grid.cols(),
            mouse.column,
            mouse.row,
        );
        if let Some(pos) = hit {
            self.cursor = pos;
            self.pick(pos)?;
        }
        Ok(())
    }

    fn move_cursor(&mut self, d_row: isize, d_col: isize) {
        let grid = self.board.grid();
        let row = self.cursor.row.saturating_add_signed(d_row).min(grid.rows() - 1);
        let col = self.cursor.col.saturating_add_signed(d_col).min(grid.cols() - 1);
        self.cursor = Position::new(row, col);
    }

    fn pick(&mut self, pos: Position) -> Result<()> {
        match self.board.handle_pick(pos)? {
            PickOutcome::Ignored(reason) => debug!(?reason, "pick ignored"),
            PickOutcome::Selected(p) => self.status = format!("Picked {}", p),
            PickOutcome::Deselected => self.status = String::from("Selection cleared"),
            PickOutcome::SelectionDiscarded => {
                self.status = String::from("Not adjacent, pick again");
            }
            PickOutcome::Reverted { .. } => {
                self.stats.reverted += 1;
                self.status = String::from("No match, swap undone");
            }
            PickOutcome::Committed(report) => {
                self.stats.committed += 1;
                self.stats.longest_cascade = self.stats.longest_cascade.max(report.passes);
                self.status = format!("Cleared {} in {} pass(es)", report.cleared, report.passes);
                info!(
                    passes = report.passes,
                    cleared = report.cleared,
                    drops = report.drops.len(),
                    spawns = report.spawns.len(),
                    "swap committed"
                );
            }
        }
        self.collect_motion();
        Ok(())
    }

    /// Drain listener events into the set of cells to animate.
    fn collect_motion(&mut self) {
        let mut moved: Vec<Position> = self.motion_rx.try_iter().map(BoardMotion::target).collect();
        if moved.is_empty() {
            return;
        }
        moved.sort_unstable();
        moved.dedup();
        self.motion = moved;
        self.motion_effect = None;
        self.motion_effect_process_time = None;
    }

    fn clear_motion(&mut self) {
        self.motion.clear();
        self.motion_effect = None;
        self.motion_effect_process_time = None;
    }

    fn new_board(&mut self) {
        self.board.reset();
        // Reset refills without cascading; any queued motion is stale.
        let _ = self.motion_rx.try_iter().count();
        self.clear_motion();
        self.stats = SessionStats::default();
        self.status = String::from("New board");
        info!("new board");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn app(extra: &[&str]) -> App {
        let mut argv = vec!["beanswap", "--seed", "7"];
        argv.extend_from_slice(extra);
        let args = Args::parse_from(argv);
        let config = crate::board_config(&args);
        App::new(args, config, Theme::default()).unwrap()
    }

    #[test]
    fn test_cursor_clamps_to_board() {
        let mut a = app(&["--rows", "4", "--cols", "5"]);
        a.handle_action(Action::CursorUp).unwrap();
        a.handle_action(Action::CursorLeft).unwrap();
        assert_eq!(a.cursor, Position::new(0, 0));
        for _ in 0..10 {
            a.handle_action(Action::CursorDown).unwrap();
            a.handle_action(Action::CursorRight).unwrap();
        }
        assert_eq!(a.cursor, Position::new(3, 4));
    }

    #[test]
    fn test_pick_then_repick_clears_selection() {
        let mut a = app(&[]);
        let before = a.board.grid().clone();
        a.handle_action(Action::Pick).unwrap();
        assert_eq!(a.board.selection(), Some(Position::new(0, 0)));
        a.handle_action(Action::Pick).unwrap();
        assert_eq!(a.board.selection(), None);
        assert_eq!(a.board.grid(), &before);
        assert_eq!(a.stats, SessionStats::default());
    }

    #[test]
    fn test_swaps_update_stats_and_motion() {
        let mut a = app(&[]);
        for _ in 0..40 {
            a.handle_action(Action::Pick).unwrap();
            a.handle_action(Action::CursorRight).unwrap();
            a.handle_action(Action::Pick).unwrap();
            a.handle_action(Action::CursorDown).unwrap();
            if a.cursor.col == 7 {
                a.cursor = Position::new(a.cursor.row, 0);
            }
        }
        assert!(a.stats.committed + a.stats.reverted > 0);
        assert_eq!(a.stats.committed > 0, a.stats.longest_cascade > 0);
        assert_eq!(a.motion_rx.try_iter().count(), 0);
    }

    #[test]
    fn test_quit_menu_navigation() {
        let mut a = app(&[]);
        assert!(!a.handle_action(Action::Quit).unwrap());
        assert_eq!(a.screen, Screen::QuitMenu);
        a.handle_action(Action::CursorUp).unwrap();
        assert_eq!(a.quit_selected, QuitOption::Exit);
        a.handle_action(Action::CursorDown).unwrap();
        assert_eq!(a.quit_selected, QuitOption::Resume);
        a.handle_action(Action::Pick).unwrap();
        assert_eq!(a.screen, Screen::Playing);

        a.handle_action(Action::Quit).unwrap();
        a.handle_action(Action::CursorUp).unwrap();
        assert!(a.handle_action(Action::Pick).unwrap());
    }

    #[test]
    fn test_mouse_outside_board_is_ignored() {
        let mut a = app(&[]);
        a.last_area = Rect::new(0, 0, 80, 24);
        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 0,
            row: 0,
            modifiers: crossterm::event::KeyModifiers::NONE,
        };
        a.handle_mouse(click).unwrap();
        assert_eq!(a.board.selection(), None);
    }

    #[test]
    fn test_new_board_resets_stats() {
        let mut a = app(&[]);
        a.stats.committed = 3;
        a.handle_action(Action::NewBoard).unwrap();
        assert_eq!(a.stats, SessionStats::default());
        assert_eq!(a.status, "New board");
    }
}

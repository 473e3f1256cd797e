//! Layout and drawing: board, selection, cursor, sidebar, quit menu.
//! Also the screen → grid hit-test used for mouse picks.

use crate::app::{QuitOption, Screen, SessionStats};
use crate::board::BoardController;
use crate::grid::{Cell, Position};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Position as ScreenPos, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Terminal columns per bean: left marker, glyph, right marker.
const CELL_WIDTH: u16 = 3;
const CELL_HEIGHT: u16 = 1;

const SIDEBAR_WIDTH: u16 = 30;
/// Sidebar needs this many rows even when the board is shorter.
const SIDEBAR_HEIGHT: u16 = 17;

/// Fade-in of dropped and spawned beans after a committed swap.
const MOTION_FADE_MS: u32 = 250;

const BEAN_GLYPH: &str = "●";
const EMPTY_GLYPH: &str = "·";

/// Board size in terminal cells, border included.
fn board_outer_size(rows: usize, cols: usize) -> (u16, u16) {
    (cols as u16 * CELL_WIDTH + 2, rows as u16 * CELL_HEIGHT + 2)
}

/// Board rect (with border), centred together with the sidebar.
fn board_outer_rect(area: Rect, rows: usize, cols: usize) -> Rect {
    let (bw, bh) = board_outer_size(rows, cols);
    let total_w = bw + SIDEBAR_WIDTH;
    let total_h = bh.max(SIDEBAR_HEIGHT);
    Rect {
        x: area.x + area.width.saturating_sub(total_w) / 2,
        y: area.y + area.height.saturating_sub(total_h) / 2,
        width: bw.min(area.width),
        height: bh.min(area.height),
    }
}

/// Board inner rect (cells only, no border); matches what draw_board paints.
fn board_inner_rect(area: Rect, rows: usize, cols: usize) -> Rect {
    let outer = board_outer_rect(area, rows, cols);
    Rect {
        x: outer.x + 1,
        y: outer.y + 1,
        width: (cols as u16 * CELL_WIDTH).min(outer.width.saturating_sub(2)),
        height: (rows as u16 * CELL_HEIGHT).min(outer.height.saturating_sub(2)),
    }
}

fn sidebar_rect(area: Rect, rows: usize, cols: usize) -> Rect {
    let outer = board_outer_rect(area, rows, cols);
    let x = outer.x + outer.width;
    Rect {
        x,
        y: outer.y,
        width: SIDEBAR_WIDTH.min((area.x + area.width).saturating_sub(x)),
        height: SIDEBAR_HEIGHT.min((area.y + area.height).saturating_sub(outer.y)),
    }
}

/// Screen rect of one bean inside the board's inner rect.
pub fn cell_rect(inner: Rect, pos: Position) -> Rect {
    Rect {
        x: inner.x + pos.col as u16 * CELL_WIDTH,
        y: inner.y + pos.row as u16 * CELL_HEIGHT,
        width: CELL_WIDTH,
        height: CELL_HEIGHT,
    }
}

/// Grid position under terminal cell (column, row), if any.
pub fn position_at(
    area: Rect,
    rows: usize,
    cols: usize,
    column: u16,
    row: u16,
) -> Option<Position> {
    let inner = board_inner_rect(area, rows, cols);
    if !inner.contains(ScreenPos::new(column, row)) {
        return None;
    }
    let pos = Position::new(
        ((row - inner.y) / CELL_HEIGHT) as usize,
        ((column - inner.x) / CELL_WIDTH) as usize,
    );
    (pos.row < rows && pos.col < cols).then_some(pos)
}

/// Buffer positions covered by the given beans.
fn motion_buffer_positions(inner: Rect, cells: &[Position]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &pos in cells {
        let r = cell_rect(inner, pos);
        for bx in r.x..(r.x + r.width).min(inner.x + inner.width) {
            for by in r.y..(r.y + r.height).min(inner.y + inner.height) {
                set.insert((bx, by));
            }
        }
    }
    set
}

/// Create or update the fade-in for moved beans and process it.
fn apply_motion_effect(
    frame: &mut Frame,
    board: &BoardController,
    theme: &Theme,
    area: Rect,
    motion: &[Position],
    motion_effect: &mut Option<Effect>,
    motion_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let grid = board.grid();
    let inner = board_inner_rect(area, grid.rows(), grid.cols());
    let delta = motion_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    *motion_process_time = Some(now);

    if motion_effect.is_none() {
        let moved = motion_buffer_positions(inner, motion);
        let filter = CellFilter::PositionFn(ref_count(move |pos: ScreenPos| {
            moved.contains(&(pos.x, pos.y))
        }));
        let effect = fx::fade_from(theme.bg, theme.bg, (MOTION_FADE_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(inner);
        *motion_effect = Some(effect);
    }

    if let Some(effect) = motion_effect {
        frame.render_effect(effect, inner, TfxDuration::from_millis(delta_ms));
    }
}

/// Draw the current screen. While `motion` is non-empty and animation is on, the
/// moved beans fade in; `motion_effect` / `motion_process_time` carry that effect across frames.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    board: &BoardController,
    theme: &Theme,
    cursor: Position,
    stats: &SessionStats,
    status: &str,
    area: Rect,
    motion: &[Position],
    motion_effect: &mut Option<Effect>,
    motion_process_time: &mut Option<Instant>,
    now: Instant,
    no_animation: bool,
    quit_selected: Option<QuitOption>,
) {
    draw_game(frame, board, theme, cursor, stats, status, area);
    match screen {
        Screen::Playing => {
            if !motion.is_empty() && !no_animation {
                apply_motion_effect(
                    frame,
                    board,
                    theme,
                    area,
                    motion,
                    motion_effect,
                    motion_process_time,
                    now,
                );
            }
        }
        Screen::QuitMenu => {
            if let Some(opt) = quit_selected {
                draw_quit_menu(frame, theme, opt);
            }
        }
    }
}

fn draw_game(
    frame: &mut Frame,
    board: &BoardController,
    theme: &Theme,
    cursor: Position,
    stats: &SessionStats,
    status: &str,
    area: Rect,
) {
    let (rows, cols) = (board.grid().rows(), board.grid().cols());
    draw_board(frame, board, theme, cursor, board_outer_rect(area, rows, cols));
    draw_sidebar(frame, board, theme, stats, status, sidebar_rect(area, rows, cols));
}

fn draw_board(
    frame: &mut Frame,
    board: &BoardController,
    theme: &Theme,
    cursor: Position,
    outer: Rect,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" beanswap ", Style::default().fg(theme.title)));
    let inner = block.inner(outer);
    block.render(outer, frame.buffer_mut());

    let bg = Style::default().bg(theme.bg);
    let selected = board.selection();
    let grid = board.grid();
    let buf = frame.buffer_mut();

    for pos in grid.positions() {
        let r = cell_rect(inner, pos);
        if r.x + r.width > inner.x + inner.width || r.y >= inner.y + inner.height {
            continue;
        }
        let (glyph, glyph_style) = match grid.get(pos).unwrap_or(Cell::Empty) {
            Cell::Empty => (EMPTY_GLYPH, bg.fg(theme.inactive_fg)),
            Cell::Bean(c) => (BEAN_GLYPH, bg.fg(theme.bean_color(c))),
        };
        // The first pick is drawn inverted (bean colour as background).
        let cell_style = if selected == Some(pos) {
            let fill = glyph_style.fg.unwrap_or(theme.main_fg);
            Style::default().fg(theme.bg).bg(fill).bold()
        } else {
            glyph_style
        };
        let (left, right) = if pos == cursor { ("[", "]") } else { (" ", " ") };
        let marker_style = if selected == Some(pos) {
            cell_style
        } else {
            bg.fg(theme.title).bold()
        };
        buf[(r.x, r.y)].set_symbol(left).set_style(marker_style);
        buf[(r.x + 1, r.y)].set_symbol(glyph).set_style(cell_style);
        buf[(r.x + 2, r.y)].set_symbol(right).set_style(marker_style);
    }
}

fn draw_sidebar(
    frame: &mut Frame,
    board: &BoardController,
    theme: &Theme,
    stats: &SessionStats,
    status: &str,
    area: Rect,
) {
    if area.width < 4 || area.height < 4 {
        return;
    }
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let hint_style = Style::default().fg(theme.inactive_fg);
    let config = board.config();

    let mut strip = vec![Span::styled("Colours: ", title_style)];
    for c in 0..config.palette_size {
        strip.push(Span::styled(BEAN_GLYPH, Style::default().fg(theme.bean_color(c))));
    }

    let lines = vec![
        Line::from(vec![
            Span::styled("Board: ", title_style),
            Span::styled(format!("{}×{}", config.rows, config.cols), fg_style),
        ]),
        Line::from(strip),
        Line::from(""),
        Line::from(vec![
            Span::styled("Swaps kept: ", title_style),
            Span::styled(stats.committed.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Swaps undone: ", title_style),
            Span::styled(stats.reverted.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Longest cascade: ", title_style),
            Span::styled(stats.longest_cascade.to_string(), fg_style),
        ]),
        Line::from(""),
        Line::from(Span::styled(status.to_string(), fg_style)),
        Line::from(""),
        Line::from(Span::styled("←↓↑→/hjkl  move", hint_style)),
        Line::from(Span::styled("Space/Enter pick", hint_style)),
        Line::from(Span::styled("Mouse      pick", hint_style)),
        Line::from(Span::styled("R          new board", hint_style)),
        Line::from(Span::styled("Q/Esc      quit", hint_style)),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg));
    Paragraph::new(Text::from(lines))
        .block(block)
        .render(area, frame.buffer_mut());
}

pub fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption) {
    let area = frame.area();
    let qw = 24.min(area.width);
    let qh = 8.min(area.height);
    let quit_rect = Rect {
        x: area.x + area.width.saturating_sub(qw) / 2,
        y: area.y + area.height.saturating_sub(qh) / 2,
        width: qw,
        height: qh,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title))
        .title(" Quit? ")
        .title_alignment(Alignment::Center);

    for y in quit_rect.y..quit_rect.y + quit_rect.height {
        for x in quit_rect.x..quit_rect.x + quit_rect.width {
            frame.buffer_mut()[(x, y)]
                .set_symbol(" ")
                .set_style(Style::default().bg(theme.bg));
        }
    }

    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    let options = [
        (QuitOption::Resume, " Resume "),
        (QuitOption::NewBoard, " New board "),
        (QuitOption::Exit, " Exit "),
    ];

    for (i, (opt, label)) in options.iter().enumerate() {
        let style = if *opt == selected {
            Style::default().fg(theme.bg).bg(theme.title).bold()
        } else {
            Style::default().fg(theme.title)
        };
        let rx = inner.x + (inner.width.saturating_sub(label.chars().count() as u16)) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        if ry < inner.y + inner.height {
            frame.buffer_mut().set_string(rx, ry, label, style);
        }
    }
}

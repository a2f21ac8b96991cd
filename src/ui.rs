//! Layout and drawing: playfield, sidebar, cleared and quit overlays, mouse hit-testing.

use crate::app::{QuitOption, Screen};
use crate::block::Colour;
use crate::grid::{Grid, Matches, Position};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};

/// Terminal cells per block.
const CELL_WIDTH: u16 = 2;
const CELL_HEIGHT: u16 = 1;

const SIDEBAR_WIDTH: u16 = 26;
const SIDEBAR_MIN_HEIGHT: u16 = 18;

/// Everything `draw` reads. Built by the app once per frame.
pub struct View<'a> {
    pub grid: &'a Grid,
    pub theme: &'a Theme,
    pub screen: Screen,
    pub cursor: Position,
    pub last: Option<&'a Matches>,
    pub quit_selected: QuitOption,
    pub seed: Option<u64>,
    pub palette_size: usize,
}

/// Terminal cells spanned by `count` grid cells, saturating at the u16 limit.
fn span(count: usize, per_cell: u16) -> u16 {
    u16::try_from(count).unwrap_or(u16::MAX).saturating_mul(per_cell)
}

/// Playfield size in terminal cells (border + grid).
fn playfield_size(width: usize, height: usize) -> (u16, u16) {
    (
        span(width, CELL_WIDTH).saturating_add(2),
        span(height, CELL_HEIGHT).saturating_add(2),
    )
}

/// Largest grid (columns, rows) whose playfield and sidebar fit the terminal.
pub fn max_grid_for_terminal(term_cols: u16, term_rows: u16) -> (usize, usize) {
    let cols = term_cols.saturating_sub(2 + SIDEBAR_WIDTH) / CELL_WIDTH;
    let rows = term_rows.saturating_sub(2) / CELL_HEIGHT;
    (usize::from(cols.max(1)), usize::from(rows.max(1)))
}

/// Playfield (with border) and sidebar, centred in `area`.
fn game_layout(area: Rect, grid: &Grid) -> (Rect, Rect) {
    let (pw, ph) = playfield_size(grid.width(), grid.height());
    let total_w = pw.saturating_add(SIDEBAR_WIDTH);
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(ph.max(SIDEBAR_MIN_HEIGHT)) / 2;
    let playfield = Rect {
        x,
        y,
        width: pw.min(area.width),
        height: ph.min(area.bottom().saturating_sub(y)),
    };
    let sidebar_x = playfield.right();
    let sidebar = Rect {
        x: sidebar_x,
        y,
        width: SIDEBAR_WIDTH.min(area.right().saturating_sub(sidebar_x)),
        height: ph
            .max(SIDEBAR_MIN_HEIGHT)
            .min(area.bottom().saturating_sub(y)),
    };
    (playfield, sidebar)
}

/// Board inner rect (no border) for the given area; matches `draw`.
fn board_rect(area: Rect, grid: &Grid) -> Rect {
    let (playfield, _) = game_layout(area, grid);
    Rect {
        x: playfield.x + 1,
        y: playfield.y + 1,
        width: span(grid.width(), CELL_WIDTH).min(playfield.width.saturating_sub(2)),
        height: span(grid.height(), CELL_HEIGHT).min(playfield.height.saturating_sub(2)),
    }
}

/// Grid position under a terminal cell, if any. Row 0 of the grid is the bottom line.
/// Empty cells are still returned; selecting them is a no-op.
pub fn cell_at(area: Rect, grid: &Grid, column: u16, row: u16) -> Option<Position> {
    let board = board_rect(area, grid);
    if !board.contains(ratatui::layout::Position::new(column, row)) {
        return None;
    }
    let x = usize::from((column - board.x) / CELL_WIDTH);
    let line = usize::from((row - board.y) / CELL_HEIGHT);
    let y = grid.height().checked_sub(line + 1)?;
    (x < grid.width()).then_some((x, y))
}

/// Screen position of the top-left terminal cell of a grid position.
fn cell_origin(board: Rect, grid: &Grid, (x, y): Position) -> (u16, u16) {
    let line = grid.height() - 1 - y;
    (
        board.x.saturating_add(span(x, CELL_WIDTH)),
        board.y.saturating_add(span(line, CELL_HEIGHT)),
    )
}

/// Draw current screen: the game, plus the cleared or quit overlay.
pub fn draw(frame: &mut Frame, view: &View) {
    let area = frame.area();
    draw_game(frame, view, area);
    match view.screen {
        Screen::Playing => {}
        Screen::Cleared => draw_cleared(frame, view, area),
        Screen::QuitMenu => draw_quit_menu(frame, view, area),
    }
}

fn draw_game(frame: &mut Frame, view: &View, area: Rect) {
    let (playfield, sidebar) = game_layout(area, view.grid);
    draw_playfield(frame, view, playfield, board_rect(area, view.grid));
    draw_sidebar(frame, view, sidebar);
}

fn draw_playfield(frame: &mut Frame, view: &View, area: Rect, board: Rect) {
    let theme = view.theme;
    let title = format!(" blockgrid | {} left ", view.grid.remaining());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, theme.title));
    block.render(area, frame.buffer_mut());

    let buf = frame.buffer_mut();
    for y in board.top()..board.bottom() {
        for x in board.left()..board.right() {
            buf[(x, y)].set_symbol(" ").set_style(Style::default().bg(theme.bg));
        }
    }

    for block in view.grid.columns().iter().flatten().filter(|b| b.is_displayed()) {
        let origin = cell_origin(board, view.grid, (block.x(), block.y()));
        let style = Style::default().fg(theme.block_color(block.colour())).bg(theme.bg);
        paint_cell(buf, board, origin, ["█", "█"], style);
    }

    if view.screen == Screen::Playing {
        let (x, y) = view.cursor;
        let (fg, bg) = match view.grid.get(x, y).filter(|b| b.is_displayed()) {
            Some(b) => (theme.cursor, theme.block_color(b.colour())),
            None => (theme.inactive_fg, theme.bg),
        };
        let origin = cell_origin(board, view.grid, view.cursor);
        let style = Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD);
        paint_cell(buf, board, origin, ["[", "]"], style);
    }
}

/// Fills one grid cell; the left and right halves get their own symbol. Clipped to `board`.
fn paint_cell(buf: &mut Buffer, board: Rect, (rx, ry): (u16, u16), symbols: [&str; 2], style: Style) {
    for dy in 0..CELL_HEIGHT {
        for dx in 0..CELL_WIDTH {
            let (cx, cy) = (rx.saturating_add(dx), ry.saturating_add(dy));
            if cx >= board.right() || cy >= board.bottom() {
                continue;
            }
            let symbol = if dx == 0 { symbols[0] } else { symbols[1] };
            buf[(cx, cy)].set_symbol(symbol).set_style(style);
        }
    }
}

fn draw_sidebar(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let label = Style::default().fg(theme.inactive_fg);
    let value = Style::default().fg(theme.main_fg);
    let row = |name: &'static str, v: String| {
        Line::from(vec![Span::styled(format!(" {name:<9}"), label), Span::styled(v, value)])
    };

    let seed = view.seed.map_or_else(|| "random".to_string(), |s| s.to_string());
    let last = match view.last {
        Some(m) => format!("{} {}", m.removed.len(), m.colour.map_or("-", Colour::name)),
        None => "-".to_string(),
    };
    let (cx, cy) = view.cursor;
    let lines = vec![
        Line::from(""),
        row("Grid", format!("{} x {}", view.grid.width(), view.grid.height())),
        row("Left", view.grid.remaining().to_string()),
        row("Colours", view.palette_size.to_string()),
        row("Seed", seed),
        row("Cursor", format!("({cx}, {cy})")),
        row("Removed", last),
        Line::from(""),
        Line::from(Span::styled(" Controls", Style::default().fg(theme.title))),
        Line::from(Span::styled(" Click       Select", value)),
        Line::from(Span::styled(" Arrows/hjkl Move", value)),
        Line::from(Span::styled(" Enter/Space Select", value)),
        Line::from(Span::styled(" R           New grid", value)),
        Line::from(Span::styled(" Q / Esc     Quit", value)),
    ];
    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(area, frame.buffer_mut());
}

fn centred_popup(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_cleared(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let popup = centred_popup(area, 30, 6);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Board cleared! ",
            Style::default().fg(Color::Black).bg(theme.title),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " R: new grid    Q: quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_quit_menu(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let popup = centred_popup(area, 24, 7);
    let option = |opt: QuitOption, text: &'static str| {
        let style = if view.quit_selected == opt {
            Style::default()
                .fg(Color::Black)
                .bg(theme.title)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.main_fg)
        };
        Line::from(Span::styled(text, style))
    };
    let lines = vec![
        Line::from(""),
        option(QuitOption::Resume, " Resume "),
        option(QuitOption::NewGrid, " New grid "),
        option(QuitOption::Exit, " Exit "),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .title(Span::styled(" Quit? ", theme.title)),
    );
    p.render(popup, frame.buffer_mut());
}

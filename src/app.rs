//! App: terminal init, main loop, key and mouse handling.

use crate::GameConfig;
use crate::block::{Colour, ColourSource, RandomColours};
use crate::grid::{Grid, Matches, Position};
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::ui::{self, View};
use crate::{log_info, vlog};
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::Duration;

/// How long to wait for input before redrawing.
const POLL_INTERVAL_MS: u64 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    Cleared,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    NewGrid,
    Exit,
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    colours: Box<dyn ColourSource>,
    grid: Grid,
    /// Largest grid that fits the terminal; new grids are clamped to it.
    fit: (usize, usize),
    cursor: Position,
    screen: Screen,
    quit_selected: QuitOption,
    last_selection: Option<Matches>,
    /// Frame area from the last draw, for mouse hit-testing.
    area: Rect,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Result<Self> {
        let palette = Colour::palette(config.high_color);
        let mut colours: Box<dyn ColourSource> = match config.seed {
            Some(seed) => Box::new(RandomColours::seeded(seed, palette)),
            None => Box::new(RandomColours::new(palette)),
        };
        let grid = match &config.layout {
            Some(layout) => layout.clone(),
            None => Grid::generate(config.width, config.height, colours.as_mut())
                .context("creating grid")?,
        };
        let fit = (grid.width(), grid.height());
        Ok(Self {
            config,
            theme,
            colours,
            grid,
            fit,
            cursor: (0, 0),
            screen: Screen::Playing,
            quit_selected: QuitOption::Resume,
            last_selection: None,
            area: Rect::default(),
        })
    }

    fn view(&self) -> View<'_> {
        View {
            grid: &self.grid,
            theme: &self.theme,
            screen: self.screen,
            cursor: self.cursor,
            last: self.last_selection.as_ref(),
            quit_selected: self.quit_selected,
            seed: self.config.seed,
            palette_size: Colour::palette(self.config.high_color).len(),
        }
    }

    /// Fresh grid at the requested size, clamped to the terminal. A loaded layout is replayed as is.
    fn new_grid(&mut self) -> Result<()> {
        self.grid = match &self.config.layout {
            Some(layout) => layout.clone(),
            None => {
                let width = self.config.width.min(self.fit.0).max(1);
                let height = self.config.height.min(self.fit.1).max(1);
                Grid::generate(width, height, self.colours.as_mut()).context("creating grid")?
            }
        };
        self.cursor = (0, 0);
        self.screen = Screen::Playing;
        self.quit_selected = QuitOption::Resume;
        self.last_selection = None;
        log_info!("new {}x{} grid", self.grid.width(), self.grid.height());
        Ok(())
    }

    fn set_terminal_size(&mut self, cols: u16, rows: u16) {
        self.fit = ui::max_grid_for_terminal(cols, rows);
        vlog!("terminal {}x{}, grid fits {}x{}", cols, rows, self.fit.0, self.fit.1);
    }

    fn move_cursor(&mut self, dx: isize, dy: isize) {
        let (x, y) = self.cursor;
        let max_x = self.grid.width() - 1;
        let max_y = self.grid.height() - 1;
        self.cursor = (
            x.saturating_add_signed(dx).min(max_x),
            y.saturating_add_signed(dy).min(max_y),
        );
    }

    fn select(&mut self, (x, y): Position) {
        if let Some(matches) = self.grid.select_block(x, y) {
            self.last_selection = Some(matches);
            if self.grid.is_cleared() {
                log_info!("grid cleared");
                self.screen = Screen::Cleared;
            }
        }
    }

    /// Returns true when the app should exit.
    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        let action = key_to_action(key);
        match self.screen {
            Screen::Playing => match action {
                Action::Quit => {
                    self.screen = Screen::QuitMenu;
                    self.quit_selected = QuitOption::Resume;
                }
                Action::CursorLeft => self.move_cursor(-1, 0),
                Action::CursorRight => self.move_cursor(1, 0),
                Action::CursorUp => self.move_cursor(0, 1),
                Action::CursorDown => self.move_cursor(0, -1),
                Action::Select => self.select(self.cursor),
                Action::NewGrid => self.new_grid()?,
                Action::None => {}
            },
            Screen::Cleared => match action {
                Action::Quit => return Ok(true),
                Action::NewGrid | Action::Select => self.new_grid()?,
                _ => {}
            },
            Screen::QuitMenu => match action {
                Action::CursorDown | Action::CursorRight => {
                    self.quit_selected = match self.quit_selected {
                        QuitOption::Resume => QuitOption::NewGrid,
                        QuitOption::NewGrid => QuitOption::Exit,
                        QuitOption::Exit => QuitOption::Resume,
                    };
                }
                Action::CursorUp | Action::CursorLeft => {
                    self.quit_selected = match self.quit_selected {
                        QuitOption::Resume => QuitOption::Exit,
                        QuitOption::NewGrid => QuitOption::Resume,
                        QuitOption::Exit => QuitOption::NewGrid,
                    };
                }
                Action::Select => match self.quit_selected {
                    QuitOption::Resume => self.screen = Screen::Playing,
                    QuitOption::NewGrid => self.new_grid()?,
                    QuitOption::Exit => return Ok(true),
                },
                Action::Quit => self.screen = Screen::Playing,
                Action::NewGrid | Action::None => {}
            },
        }
        Ok(false)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.screen != Screen::Playing || mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        if let Some(pos) = ui::cell_at(self.area, &self.grid, mouse.column, mouse.row) {
            self.cursor = pos;
            self.select(pos);
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode, size},
        };

        enable_raw_mode().context("enabling raw mode")?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let mut terminal = ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        // Size the grid to fit the terminal; respect --width/--height when they fit
        let (term_cols, term_rows) = size()?;
        self.set_terminal_size(term_cols, term_rows);
        if self.grid.width() > self.fit.0 || self.grid.height() > self.fit.1 {
            if self.config.layout.is_some() {
                log_info!("layout is larger than the terminal, part of it will be hidden");
            } else {
                self.new_grid()?;
            }
        }

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let mut area = self.area;
            let view = self.view();
            terminal.draw(|f| {
                area = f.area();
                ui::draw(f, &view);
            })?;
            self.area = area;

            if !event::poll(Duration::from_millis(POLL_INTERVAL_MS))? {
                continue;
            }
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if self.handle_key(key)? {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => self.handle_mouse(mouse),
                Event::Resize(cols, rows) => self.set_terminal_size(cols, rows),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    const R: Colour = Colour::Red;
    const B: Colour = Colour::Blue;

    fn config(width: usize, height: usize) -> GameConfig {
        GameConfig {
            width,
            height,
            seed: Some(11),
            high_color: false,
            layout: None,
        }
    }

    fn app_with(layout: &[Vec<Colour>]) -> App {
        let mut app = App::new(config(layout.len(), layout[0].len()), Theme::default()).unwrap();
        app.grid = Grid::from_colours(layout).unwrap();
        app.area = Rect::new(0, 0, 80, 24);
        app
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE)).unwrap()
    }

    fn click(app: &mut App, column: u16, row: u16) {
        app.handle_mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        });
    }

    #[test]
    fn test_new_app_uses_config_size() {
        let app = App::new(config(6, 4), Theme::default()).unwrap();
        assert_eq!((app.grid.width(), app.grid.height()), (6, 4));
        assert_eq!(app.screen, Screen::Playing);
    }

    #[test]
    fn test_seeded_apps_share_layout() {
        let a = App::new(config(5, 5), Theme::default()).unwrap();
        let b = App::new(config(5, 5), Theme::default()).unwrap();
        assert_eq!(a.grid, b.grid);
    }

    #[test]
    fn test_cursor_is_clamped() {
        let mut app = app_with(&[vec![R, B], vec![B, R]]);
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.cursor, (0, 0));
        for _ in 0..5 {
            press(&mut app, KeyCode::Right);
            press(&mut app, KeyCode::Char('k'));
        }
        assert_eq!(app.cursor, (1, 1));
    }

    #[test]
    fn test_enter_selects_under_cursor() {
        let mut app = app_with(&[vec![R, R], vec![B, B]]);
        press(&mut app, KeyCode::Enter);
        let last = app.last_selection.as_ref().unwrap();
        assert_eq!(last.removed.len(), 2);
        assert_eq!(last.colour, Some(R));
        assert!(app.grid.columns()[0].is_empty());
        assert_eq!(app.screen, Screen::Playing);
    }

    #[test]
    fn test_selecting_empty_cell_keeps_last_selection() {
        let mut app = app_with(&[vec![R, R], vec![B, B]]);
        press(&mut app, KeyCode::Enter);
        let before = app.grid.clone();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.grid, before);
        assert_eq!(app.last_selection.as_ref().map(|m| m.removed.len()), Some(2));
    }

    #[test]
    fn test_clearing_board_shows_cleared_screen() {
        let mut app = app_with(&[vec![R, R], vec![R, R]]);
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.screen, Screen::Cleared);
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.screen, Screen::Playing);
        assert_eq!(app.grid.remaining(), 4);
        assert!(app.last_selection.is_none());
    }

    #[test]
    fn test_quit_menu_flow() {
        let mut app = app_with(&[vec![R, B], vec![B, R]]);
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.screen, Screen::QuitMenu);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.screen, Screen::Playing);

        press(&mut app, KeyCode::Char('q'));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.quit_selected, QuitOption::Exit);
        assert!(press(&mut app, KeyCode::Enter));
    }

    #[test]
    fn test_quit_menu_new_grid() {
        let mut app = app_with(&[vec![R, R], vec![R, B]]);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('q'));
        press(&mut app, KeyCode::Down);
        assert_eq!(app.quit_selected, QuitOption::NewGrid);
        assert!(!press(&mut app, KeyCode::Enter));
        assert_eq!(app.screen, Screen::Playing);
        assert_eq!(app.grid.remaining(), 4);
    }

    #[test]
    fn test_click_selects_block() {
        // Column 0 bottom to top: R B; column 1: B B.
        let mut app = app_with(&[vec![R, B], vec![B, B]]);
        let (column, row) = (0..80u16)
            .flat_map(|c| (0..24u16).map(move |r| (c, r)))
            .find(|&(c, r)| ui::cell_at(app.area, &app.grid, c, r) == Some((1, 0)))
            .unwrap();
        click(&mut app, column, row);
        assert_eq!(app.cursor, (1, 0));
        assert_eq!(app.last_selection.as_ref().map(|m| m.removed.len()), Some(3));
        assert_eq!(app.grid.remaining(), 1);
    }

    #[test]
    fn test_click_outside_board_is_ignored() {
        let mut app = app_with(&[vec![R, B], vec![B, B]]);
        let before = app.grid.clone();
        click(&mut app, 0, 0);
        assert_eq!(app.grid, before);
        assert!(app.last_selection.is_none());
    }

    #[test]
    fn test_layout_is_replayed_on_new_grid() {
        let layout = Grid::from_colours(&[vec![R, B, R], vec![B, B, R]]).unwrap();
        let mut cfg = config(10, 10);
        cfg.layout = Some(layout.clone());
        let mut app = App::new(cfg, Theme::default()).unwrap();
        assert_eq!(app.grid, layout);

        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.grid.remaining(), 3);
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.grid, layout);
    }

    #[test]
    fn test_new_grid_is_clamped_to_terminal() {
        let mut app = App::new(config(40, 40), Theme::default()).unwrap();
        app.set_terminal_size(80, 24);
        app.new_grid().unwrap();
        assert_eq!((app.grid.width(), app.grid.height()), (26, 22));
    }
}

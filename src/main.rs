//! blockgrid: same-colour block clearing puzzle in the terminal.

mod app;
mod block;
mod grid;
mod input;
mod logging;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};

/// Options derived from CLI that affect the grid (size, palette, colour seed, fixed layout).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub width: usize,
    pub height: usize,
    pub seed: Option<u64>,
    pub high_color: bool,
    /// Fixed starting grid; replaces random generation when set.
    pub layout: Option<grid::Grid>,
}

impl GameConfig {
    pub fn from_args(args: &Args) -> Result<Self> {
        let layout = match args.layout.as_deref() {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading layout {}", path.display()))?;
                let grid = grid::Grid::parse_layout(&text)
                    .with_context(|| format!("parsing layout {}", path.display()))?;
                Some(grid)
            }
            None => None,
        };
        let (width, height) = match &layout {
            Some(grid) => (grid.width(), grid.height()),
            None => (usize::from(args.width), usize::from(args.height)),
        };
        Ok(Self {
            width,
            height,
            seed: args.seed,
            high_color: args.high_color,
            layout,
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = args.log_file.as_deref() {
        logging::init_log_file(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        if args.verbose {
            logging::enable_verbose_logging();
        }
    }
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        log_info!("theme not loaded ({e}), using defaults");
        let mut theme = theme::Theme::default();
        theme.apply_palette(args.palette);
        theme
    });
    let config = GameConfig::from_args(&args)?;
    log_info!(
        "starting: {}x{} grid, seed {:?}, {} colours",
        config.width,
        config.height,
        config.seed,
        block::Colour::palette(config.high_color).len()
    );
    let mut app = App::new(config, theme)?;
    app.run()?;
    Ok(())
}

/// Same-colour block clearing puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "blockgrid",
    version,
    about = "Same-colour block clearing puzzle in the terminal. Pick a block to remove it and every touching block of its colour.",
    long_about = "blockgrid is a terminal tile-matching puzzle.\n\n\
        Selecting a block removes it together with every block of the same colour connected to it \
        up, down, left or right. The blocks left in each column then fall to close the gaps.\n\n\
        CONTROLS:\n  Mouse click  Select    Arrows / hjkl  Move cursor    Enter/Space  Select\n  \
        R            New grid  Q / Esc        Quit menu\n\n\
        Use --seed to replay the same grids, --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Grid width in columns. Clamped so the board fits the terminal.
    #[arg(long, default_value = "10", value_name = "COLS", value_parser = clap::value_parser!(u16).range(1..))]
    pub width: u16,

    /// Grid height in rows. Clamped so the board fits the terminal.
    #[arg(long, default_value = "10", value_name = "ROWS", value_parser = clap::value_parser!(u16).range(1..))]
    pub height: u16,

    /// Seed for block colours; the same seed replays the same sequence of grids.
    #[arg(short, long, value_name = "N")]
    pub seed: Option<u64>,

    /// High color mode: use 6 colors (adds magenta and cyan) instead of 4 (red, green, blue, yellow).
    #[arg(long)]
    pub high_color: bool,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Start from a fixed grid: one line per row, top row first, letters R G B Y M C.
    /// Overrides --width and --height; R replays the same layout.
    #[arg(short, long, value_name = "FILE")]
    pub layout: Option<std::path::PathBuf>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Write diagnostics to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<std::path::PathBuf>,

    /// Also log every selection and grid change (needs --log-file).
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["blockgrid"]).unwrap();
        let config = GameConfig::from_args(&args).unwrap();
        assert_eq!((config.width, config.height), (10, 10));
        assert_eq!(config.seed, None);
        assert!(!config.high_color);
        assert_eq!(args.palette, Palette::Normal);
    }

    #[test]
    fn test_flags() {
        let args = Args::try_parse_from([
            "blockgrid",
            "--width",
            "5",
            "--height",
            "3",
            "--seed",
            "42",
            "--high-color",
            "--palette",
            "colourblind",
        ])
        .unwrap();
        let config = GameConfig::from_args(&args).unwrap();
        assert_eq!((config.width, config.height), (5, 3));
        assert_eq!(config.seed, Some(42));
        assert!(config.high_color);
        assert_eq!(args.palette, Palette::Colorblind);
    }

    #[test]
    fn test_layout_file_sets_size() {
        let path = std::env::temp_dir().join(format!("blockgrid-layout-{}.txt", std::process::id()));
        std::fs::write(&path, "RGB\nYMC\n").unwrap();
        let path_arg = path.to_string_lossy().into_owned();
        let args =
            Args::try_parse_from(["blockgrid", "--width", "9", "--layout", &path_arg]).unwrap();
        let config = GameConfig::from_args(&args).unwrap();
        std::fs::remove_file(&path).ok();
        let grid = config.layout.unwrap();
        assert_eq!((config.width, config.height), (3, 2));
        assert_eq!(grid.get(0, 1).unwrap().colour(), block::Colour::Red);
        assert_eq!(grid.get(2, 0).unwrap().colour(), block::Colour::Cyan);
    }

    #[test]
    fn test_missing_layout_file_is_an_error() {
        let args = Args::try_parse_from(["blockgrid", "--layout", "/nonexistent/blockgrid.layout"]).unwrap();
        let err = GameConfig::from_args(&args).unwrap_err();
        assert!(err.to_string().contains("reading layout"));
    }

    #[test]
    fn test_zero_size_is_rejected() {
        assert!(Args::try_parse_from(["blockgrid", "--width", "0"]).is_err());
        assert!(Args::try_parse_from(["blockgrid", "--height", "0"]).is_err());
    }
}

//! Beanswap: swap-and-match bean puzzle in the terminal.

mod app;
mod board;
mod cascade;
mod colors;
mod grid;
mod input;
mod matcher;
mod swap;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use board::BoardConfig;
use clap::{Parser, ValueEnum};
use grid::FillPolicy;
use std::path::{Path, PathBuf};
use swap::AdjacencyMode;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let config = board_config(&args);
    let mut app = App::new(args, config, theme)?;
    app.run()?;
    Ok(())
}

/// Board parameters from the command line.
pub fn board_config(args: &Args) -> BoardConfig {
    BoardConfig {
        rows: args.rows as usize,
        cols: args.cols as usize,
        palette_size: args.colors,
        adjacency: if args.diagonal_swaps {
            AdjacencyMode::WithDiagonals
        } else {
            AdjacencyMode::Orthogonal
        },
        fill: if args.no_initial_matches {
            FillPolicy::NoInitialMatches
        } else {
            FillPolicy::Unconstrained
        },
    }
}

/// Logs go to a file only; the terminal belongs to the UI. `RUST_LOG` overrides the `info` default.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("cannot install logger: {}", e))?;
    Ok(())
}

/// Swap-and-match bean puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "beanswap",
    version,
    about = "Swap-and-match bean puzzle in the terminal. Line up three or more beans of one colour to clear them.",
    long_about = "Beanswap is a terminal match-3 puzzle.\n\n\
        Pick a bean, then pick a neighbour to swap them. If the swap lines up three or more \
        beans of one colour in a row or column, they clear, the beans above fall and new beans \
        drop in from the top, cascading until the board is stable. A swap that makes no line is undone.\n\n\
        CONTROLS:\n  Arrows / hjkl  Move cursor    Space / Enter  Pick    Mouse  Pick\n  R              New board      Q / Esc        Quit\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Board height in rows.
    #[arg(
        long,
        default_value = "8",
        value_name = "ROWS",
        value_parser = clap::value_parser!(u16).range(1..=40)
    )]
    pub rows: u16,

    /// Board width in columns.
    #[arg(
        long,
        default_value = "8",
        value_name = "COLS",
        value_parser = clap::value_parser!(u16).range(1..=40)
    )]
    pub cols: u16,

    /// Number of bean colours.
    #[arg(
        short,
        long,
        default_value = "6",
        value_name = "N",
        value_parser = clap::value_parser!(u8).range(2..=8)
    )]
    pub colors: u8,

    /// Seed for bean colours; the same seed deals the same board and refills.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Allow swapping with diagonal neighbours too.
    #[arg(long)]
    pub diagonal_swaps: bool,

    /// Deal the starting board without any ready-made lines (needs 3+ colours).
    #[arg(long)]
    pub no_initial_matches: bool,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable the fade-in of fallen and new beans.
    #[arg(long)]
    pub no_animation: bool,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Write logs to this file (filter with RUST_LOG).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
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
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults_match_board_defaults() {
        let args = Args::parse_from(["beanswap"]);
        assert_eq!(board_config(&args), BoardConfig::default());
        assert_eq!(args.palette, Palette::Normal);
        assert!(args.log_file.is_none());
    }

    #[test]
    fn test_flags_map_to_config() {
        let args = Args::parse_from([
            "beanswap",
            "--rows",
            "5",
            "--cols",
            "7",
            "-c",
            "4",
            "--diagonal-swaps",
            "--no-initial-matches",
            "--palette",
            "contrast",
        ]);
        let config = board_config(&args);
        assert_eq!((config.rows, config.cols, config.palette_size), (5, 7, 4));
        assert_eq!(config.adjacency, AdjacencyMode::WithDiagonals);
        assert_eq!(config.fill, FillPolicy::NoInitialMatches);
        assert_eq!(args.palette, Palette::HighContrast);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_colour_count_is_bounded() {
        assert!(Args::try_parse_from(["beanswap", "--colors", "1"]).is_err());
        assert!(Args::try_parse_from(["beanswap", "--colors", "9"]).is_err());
        assert!(Args::try_parse_from(["beanswap", "--rows", "0"]).is_err());
    }
}

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use genotile_core::{NormalizationMode, SortOrder};
use std::path::PathBuf;

mod commands;
mod config;
mod error;

use config::Config;
use error::{print_error_and_exit, CliError};

#[derive(Parser)]
#[command(name = "genotile")]
#[command(about = "genotile - tile addressing and locus search for tiled genome browsers")]
#[command(version)]
#[command(long_about = "
genotile resolves locus queries against a chromosome index, computes which
tiles of a zoom pyramid cover a viewport, and normalizes tile payloads.

Examples:
  genotile search --chrom-sizes hg38.chrom.sizes 'chr1:1,000,000-2,000,000 & chr2'
  genotile locate --chrom-sizes hg38.chrom.sizes --x 1000 250000000
  genotile tiles --tileset info.json --x 1000000 2000000 --width 800
  genotile unflatten --tile tile.json --mode sorted-desc --normalize
  genotile config --example
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a locus query to absolute genome ranges
    Search {
        /// Query text, e.g. 'chr1:1000-2000', 'chr3-chr5', 'chr1 & chr2 [offset 5,10]'
        query: String,

        /// Two-column chrom.sizes file (overrides [general] chrom_sizes)
        #[arg(long)]
        chrom_sizes: Option<PathBuf>,

        /// Half-width of the window around a single position
        #[arg(long)]
        radius: Option<f64>,
    },

    /// Format absolute ranges back into query text
    Locate {
        /// Two-column chrom.sizes file (overrides [general] chrom_sizes)
        #[arg(long)]
        chrom_sizes: Option<PathBuf>,

        /// X range in absolute coordinates
        #[arg(long, num_args = 2, value_names = ["START", "END"], allow_negative_numbers = true, required = true)]
        x: Vec<f64>,

        /// Y range in absolute coordinates
        #[arg(long, num_args = 2, value_names = ["START", "END"], allow_negative_numbers = true)]
        y: Option<Vec<f64>>,
    },

    /// List the tiles covering a viewport
    Tiles {
        /// Tileset metadata JSON
        #[arg(long, required = true)]
        tileset: PathBuf,

        /// Zoom level (chosen from the x range and --width if omitted)
        #[arg(short, long)]
        zoom: Option<u32>,

        /// Visible x range
        #[arg(long, num_args = 2, value_names = ["START", "END"], allow_negative_numbers = true, required = true)]
        x: Vec<f64>,

        /// Visible y range (matrix tilesets)
        #[arg(long, num_args = 2, value_names = ["START", "END"], allow_negative_numbers = true)]
        y: Option<Vec<f64>>,

        /// Track width in pixels for automatic zoom selection
        #[arg(long)]
        width: Option<f64>,

        /// Cap on tiles per axis for resolution tilesets
        #[arg(long)]
        max_tiles: Option<usize>,
    },

    /// Unflatten and normalize a tile payload
    Unflatten {
        /// Tile payload JSON ({zoom_level, tile_pos, shape, dense})
        #[arg(long, required = true)]
        tile: PathBuf,

        /// Normalization mode
        #[arg(long, default_value = "row-sum")]
        mode: ModeArg,

        /// Row-sum normalize before sorting (sorted modes only)
        #[arg(long)]
        normalize: bool,
    },

    /// Show or write configuration
    Config {
        /// Print an example configuration file
        #[arg(long)]
        example: bool,

        /// Write the effective configuration to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ModeArg {
    RowSum,
    Raw,
    SortedAsc,
    SortedDesc,
}

impl ModeArg {
    pub fn to_mode(self, normalize: bool) -> NormalizationMode {
        match self {
            ModeArg::RowSum => NormalizationMode::RowSum,
            ModeArg::Raw => NormalizationMode::Raw,
            ModeArg::SortedAsc => NormalizationMode::Sorted { order: SortOrder::Ascending, normalize },
            ModeArg::SortedDesc => NormalizationMode::Sorted { order: SortOrder::Descending, normalize },
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) -> Result<()> {
    if quiet {
        std::env::set_var("RUST_LOG", "error");
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        std::env::set_var("RUST_LOG", level);
    }

    env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .init();

    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    setup_logging(cli.verbose, cli.quiet)?;

    let mut config = Config::load(cli.config.as_deref())?;
    if cli.json {
        config.general.output = "json".to_string();
    }

    match cli.command {
        Commands::Search { query, chrom_sizes, radius } => {
            commands::search::execute(&config, query, chrom_sizes, radius)?;
        }

        Commands::Locate { chrom_sizes, x, y } => {
            commands::locate::execute(&config, chrom_sizes, x, y)?;
        }

        Commands::Tiles { tileset, zoom, x, y, width, max_tiles } => {
            commands::tiles::execute(&config, tileset, zoom, x, y, width, max_tiles)?;
        }

        Commands::Unflatten { tile, mode, normalize } => {
            commands::unflatten::execute(&config, tile, mode.to_mode(normalize))?;
        }

        Commands::Config { example, output } => {
            commands::config::execute(&config, example, output)?;
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        if let Some(cli_err) = err.downcast_ref::<CliError>() {
            print_error_and_exit(cli_err);
        }
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

//! Command implementations for the genotile CLI

pub mod config;
pub mod locate;
pub mod search;
pub mod tiles;
pub mod unflatten;

use anyhow::{Context, Result};
use genotile_core::{ChromosomeIndex, GenomicRange};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{CliError, CliResult};

/// Chromosome index from the flag, falling back to `[general] chrom_sizes`
pub fn load_chroms(config: &Config, path: Option<PathBuf>) -> Result<ChromosomeIndex> {
    let path = path
        .or_else(|| config.general.chrom_sizes.clone())
        .ok_or_else(|| CliError::config("no chrom.sizes file given (use --chrom-sizes or [general] chrom_sizes)"))?;

    let file = open_input(&path)?;
    let chroms = ChromosomeIndex::from_reader(std::io::BufReader::new(file)).map_err(CliError::from)?;
    log::info!(
        "Loaded {} chromosomes ({} bp) from {}",
        chroms.len(),
        chroms.total_length(),
        path.display()
    );
    Ok(chroms)
}

pub fn open_input(path: &Path) -> CliResult<std::fs::File> {
    if !path.exists() {
        return Err(CliError::file_not_found(path.to_path_buf()));
    }
    Ok(std::fs::File::open(path)?)
}

pub fn read_input(path: &Path) -> Result<String> {
    let mut content = String::new();
    open_input(path)?
        .read_to_string(&mut content)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(content)
}

/// `[start, end]` from a two-value flag
pub fn range_arg(values: &[f64], flag: &str) -> CliResult<GenomicRange> {
    match values {
        [start, end] if start.is_finite() && end.is_finite() => Ok(GenomicRange::new(*start, *end)),
        _ => Err(CliError::validation(format!("{} expects two finite numbers", flag))),
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Failed to serialize output")?);
    Ok(())
}

//! Locate command implementation - format absolute ranges as locus text

use anyhow::Result;
use genotile_core::GenomicRange;
use serde::Serialize;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct LocateOutput {
    x: GenomicRange,
    y: Option<GenomicRange>,
    text: String,
}

pub fn execute(config: &Config, chrom_sizes: Option<PathBuf>, x: Vec<f64>, y: Option<Vec<f64>>) -> Result<()> {
    let x = super::range_arg(&x, "--x")?;
    let y = y.map(|values| super::range_arg(&values, "--y")).transpose()?;

    let chroms = super::load_chroms(config, chrom_sizes)?;
    let field = genotile_core::SearchField::with_config(chroms, &config.search)?;

    let text = field
        .position_text(&x, y.as_ref())
        .ok_or_else(|| CliError::validation("the chromosome index is empty"))?;

    if config.json_output() {
        super::print_json(&LocateOutput { x, y, text })?;
    } else {
        println!("{}", text);
    }

    Ok(())
}

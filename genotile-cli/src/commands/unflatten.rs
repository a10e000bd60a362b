//! Unflatten command implementation - reshape and normalize a tile payload

use anyhow::{Context, Result};
use genotile_core::{NormalizationMode, NormalizedTile, Normalizer, TilePayload, TileStats, ValueScaling};
use serde::Serialize;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::CliResult;

#[derive(Debug, Serialize)]
struct UnflattenOutput {
    id: String,
    shape: [usize; 2],
    stats: TileStats,
    scaling: ValueScaling,
    data: NormalizedTile,
}

pub fn execute(config: &Config, tile: PathBuf, mode: NormalizationMode) -> Result<()> {
    let text = super::read_input(&tile)?;
    let payload = TilePayload::from_json(&text)
        .with_context(|| format!("Failed to parse tile payload: {}", tile.display()))?;

    let output = process(&payload, mode)?;

    if config.json_output() {
        super::print_json(&output)?;
        return Ok(());
    }

    println!("tile\t{}", output.id);
    println!("shape\t{}x{}", output.shape[0], output.shape[1]);
    println!("max_value\t{}", output.stats.max_value);
    if let Some(min) = output.stats.min_value {
        println!("min_value\t{}", min);
    }
    println!("scaling\t{}", output.scaling);

    match &output.data {
        NormalizedTile::RowSum { matrix } => print_rows(matrix),
        NormalizedTile::Raw { matrix, max_row_sum } => {
            println!("max_row_sum\t{}", max_row_sum);
            print_rows(matrix);
        }
        NormalizedTile::Sorted { rows, max_row_sum } => {
            println!("max_row_sum\t{}", max_row_sum);
            for row in rows {
                let cells: Vec<String> = row.iter().map(|s| format!("{}:{}", s.channel, s.value)).collect();
                println!("{}", cells.join("\t"));
            }
        }
    }

    Ok(())
}

fn process(payload: &TilePayload, mode: NormalizationMode) -> CliResult<UnflattenOutput> {
    let normalizer = Normalizer::default();
    let tile = normalizer.process(payload)?;
    let data = normalizer.normalize(&tile, mode);

    Ok(UnflattenOutput {
        id: tile.id.key(),
        shape: tile.shape,
        stats: tile.stats,
        scaling: normalizer.scaling().get(),
        data,
    })
}

fn print_rows(matrix: &[Vec<f64>]) {
    for row in matrix {
        let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        println!("{}", cells.join("\t"));
    }
}

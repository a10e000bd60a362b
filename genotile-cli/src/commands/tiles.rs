//! Tiles command implementation - list the tiles covering a viewport

use anyhow::{Context, Result};
use genotile_core::{
    DensityZoomPolicy, EngineConfig, GenomicRange, TileGeometry, TilePosition, TileSelector, TilesetInfo, ZoomLevel,
    ZoomPolicy,
};
use serde::Serialize;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::{CliError, CliResult};

#[derive(Debug, Serialize)]
struct TileEntry {
    id: String,
    position: TilePosition,
}

#[derive(Debug, Serialize)]
struct TilesOutput {
    zoom: ZoomLevel,
    max_zoom: ZoomLevel,
    tiles: Vec<TileEntry>,
}

pub fn execute(
    config: &Config,
    tileset: PathBuf,
    zoom: Option<ZoomLevel>,
    x: Vec<f64>,
    y: Option<Vec<f64>>,
    width: Option<f64>,
    max_tiles: Option<usize>,
) -> Result<()> {
    let text = super::read_input(&tileset)?;
    let info = TilesetInfo::from_json(&text)
        .with_context(|| format!("Failed to parse tileset metadata: {}", tileset.display()))?;

    let mut engine = config.engine();
    if let Some(max_tiles) = max_tiles {
        engine.tiles.max_tiles_per_axis = max_tiles;
    }

    let mut ranges = vec![super::range_arg(&x, "--x")?];
    if let Some(y) = y {
        ranges.push(super::range_arg(&y, "--y")?);
    }

    let zoom = match zoom {
        Some(zoom) => zoom,
        None => {
            let track_width = width.unwrap_or(config.general.track_width);
            let zoom = DensityZoomPolicy::from_config(&engine)
                .zoom_level(&info, &ranges[0], track_width)
                .map_err(CliError::from)?;
            log::info!("Selected zoom level {} for a {}px track", zoom, track_width);
            zoom
        }
    };

    let output = covering_tiles(&info, &engine, zoom, &ranges)?;
    log::info!("{} tiles visible at zoom {}", output.tiles.len(), zoom);

    if config.json_output() {
        super::print_json(&output)?;
    } else {
        for tile in &output.tiles {
            print!("{}\t{}\t{}", tile.id, tile.position.x.start, tile.position.x.end());
            if let Some(y) = tile.position.y {
                print!("\t{}\t{}", y.start, y.end());
            }
            println!();
        }
    }

    Ok(())
}

fn covering_tiles(
    info: &TilesetInfo,
    engine: &EngineConfig,
    zoom: ZoomLevel,
    ranges: &[GenomicRange],
) -> CliResult<TilesOutput> {
    let selector = TileSelector::new(info, &engine.tiles)?;
    let geometry = TileGeometry::new(info, &engine.tiles)?;
    let visible = selector.visible_tiles(zoom, ranges)?;

    let tiles = visible
        .iter()
        .map(|id| -> CliResult<TileEntry> {
            Ok(TileEntry {
                id: id.key(),
                position: geometry.tile_position(id)?,
            })
        })
        .collect::<CliResult<Vec<_>>>()?;

    Ok(TilesOutput {
        zoom,
        max_zoom: selector.scheme().max_zoom(),
        tiles,
    })
}

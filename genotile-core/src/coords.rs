//! Tile geometry: where a tile sits in data coordinates and how wide it is

use serde::{Deserialize, Serialize};

use crate::config::TileConfig;
use crate::error::TileResult;
use crate::tiles::TileId;
use crate::tileset::{TileScheme, TilesetInfo};
use crate::types::{Axis, GenomicPos, TileIndex, ZoomLevel};

/// Start and width of a tile along one axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisExtent {
    pub start: GenomicPos,
    pub width: GenomicPos,
}

impl AxisExtent {
    pub fn end(&self) -> GenomicPos {
        self.start + self.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TilePosition {
    pub x: AxisExtent,
    pub y: Option<AxisExtent>,
}

#[derive(Debug, Clone)]
pub struct TileGeometry {
    scheme: TileScheme,
    min: [GenomicPos; 2],
    bins_per_tile: u32,
}

impl TileGeometry {
    pub fn new(info: &TilesetInfo, config: &TileConfig) -> TileResult<Self> {
        let scheme = info.scheme(config.default_bins_per_tile)?;
        let bins_per_tile = match &scheme {
            TileScheme::Resolutions { bins_per_tile, .. } => *bins_per_tile,
            TileScheme::PowerOfTwo { .. } => info.tile_size.unwrap_or(config.default_bins_per_tile),
        };

        Ok(Self {
            scheme,
            min: [info.min(Axis::X), info.min(Axis::Y)],
            bins_per_tile,
        })
    }

    pub fn scheme(&self) -> &TileScheme {
        &self.scheme
    }

    pub fn bins_per_tile(&self) -> u32 {
        self.bins_per_tile
    }

    /// Extent of tile `index` along `axis` at `zoom`.
    ///
    /// Power-of-two tiles are offset by the axis minimum; resolution tiles
    /// start at zero. Both axes share the same width (square pyramid).
    pub fn axis_extent(&self, zoom: ZoomLevel, index: TileIndex, axis: Axis) -> TileResult<AxisExtent> {
        let width = self.scheme.tile_width(zoom)?;
        let start = match self.scheme {
            TileScheme::PowerOfTwo { .. } => self.min[axis.index()] + index as GenomicPos * width,
            TileScheme::Resolutions { .. } => width * index as GenomicPos,
        };
        Ok(AxisExtent { start, width })
    }

    pub fn tile_position(&self, tile: &TileId) -> TileResult<TilePosition> {
        let x = self.axis_extent(tile.zoom, tile.x, Axis::X)?;
        let y = match tile.y {
            Some(y) => Some(self.axis_extent(tile.zoom, y, Axis::Y)?),
            None => None,
        };
        Ok(TilePosition { x, y })
    }

    /// Width of a single bin (one matrix row of a 1-D tile) at `zoom`
    pub fn bin_width(&self, zoom: ZoomLevel) -> TileResult<GenomicPos> {
        Ok(self.scheme.tile_width(zoom)? / self.bins_per_tile as GenomicPos)
    }
}

/// One-shot geometry lookup with default tile settings.
///
/// `tile_pos` holds one index for 1-D tracks or two for matrices.
pub fn tile_position(zoom: ZoomLevel, tile_pos: &[TileIndex], info: &TilesetInfo) -> TileResult<TilePosition> {
    let geometry = TileGeometry::new(info, &TileConfig::default())?;
    let tile = TileId::from_indices(zoom, tile_pos)?;
    geometry.tile_position(&tile)
}

//! Tile identities and visible-tile selection

use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::TileConfig;
use crate::error::{TileError, TileResult};
use crate::tileset::{TileScheme, TilesetInfo};
use crate::types::{Axis, GenomicPos, GenomicRange, TileIndex, ZoomLevel};

/// Identity of a tile: zoom level plus one (track) or two (matrix) indices.
///
/// The string form `"zoom.x"` / `"zoom.x.y"` is the key used for all
/// loaded/loading/visible bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId {
    pub zoom: ZoomLevel,
    pub x: TileIndex,
    pub y: Option<TileIndex>,
}

impl TileId {
    pub fn new_1d(zoom: ZoomLevel, x: TileIndex) -> Self {
        Self { zoom, x, y: None }
    }

    pub fn new_2d(zoom: ZoomLevel, x: TileIndex, y: TileIndex) -> Self {
        Self { zoom, x, y: Some(y) }
    }

    pub fn from_indices(zoom: ZoomLevel, indices: &[TileIndex]) -> TileResult<Self> {
        match indices {
            [x] => Ok(Self::new_1d(zoom, *x)),
            [x, y] => Ok(Self::new_2d(zoom, *x, *y)),
            _ => Err(TileError::InvalidTileId(format!(
                "expected 1 or 2 tile indices, got {}",
                indices.len()
            ))),
        }
    }

    pub fn indices(&self) -> Vec<TileIndex> {
        match self.y {
            Some(y) => vec![self.x, y],
            None => vec![self.x],
        }
    }

    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.y {
            Some(y) => write!(f, "{}.{}.{}", self.zoom, self.x, y),
            None => write!(f, "{}.{}", self.zoom, self.x),
        }
    }
}

impl FromStr for TileId {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TileError::InvalidTileId(s.to_string());
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(invalid());
        }

        let zoom = parts[0].parse::<ZoomLevel>().map_err(|_| invalid())?;
        let indices = parts[1..]
            .iter()
            .map(|p| p.parse::<TileIndex>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_indices(zoom, &indices)
    }
}

/// Tiles that cover the current viewport.
///
/// Replaced wholesale on every viewport change; compare two sets with
/// [`VisibleTileSet::diff`] to find what to fetch and what to evict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibleTileSet {
    ids: BTreeSet<TileId>,
}

/// Partition of a new visible set against the previous one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileDelta {
    pub entered: Vec<TileId>,
    pub retained: Vec<TileId>,
    pub exited: Vec<TileId>,
}

impl VisibleTileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &TileId) -> bool {
        self.ids.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileId> {
        self.ids.iter()
    }

    pub fn keys(&self) -> Vec<String> {
        self.ids.iter().map(TileId::key).collect()
    }

    pub fn diff(&self, previous: &VisibleTileSet) -> TileDelta {
        let mut delta = TileDelta::default();
        for id in &self.ids {
            if previous.contains(id) {
                delta.retained.push(*id);
            } else {
                delta.entered.push(*id);
            }
        }
        delta.exited = previous.ids.difference(&self.ids).copied().collect();
        delta
    }
}

impl FromIterator<TileId> for VisibleTileSet {
    fn from_iter<I: IntoIterator<Item = TileId>>(iter: I) -> Self {
        Self { ids: iter.into_iter().collect() }
    }
}

/// Maps a visible range at a fixed resolution to tile indices.
///
/// Resolution tilesets delegate index computation to this collaborator; the
/// selector only chooses the resolution and the data bounds.
pub trait ResolutionTiler {
    fn tiles_for_resolution(
        &self,
        resolution: GenomicPos,
        bins_per_tile: u32,
        visible: &GenomicRange,
        min_pos: GenomicPos,
        max_pos: GenomicPos,
    ) -> Vec<TileIndex>;
}

/// Default resolution tiler: clamps to the data bounds and caps the number
/// of tiles requested per axis.
#[derive(Debug, Clone)]
pub struct BoundedResolutionTiler {
    pub max_tiles_per_axis: usize,
}

impl Default for BoundedResolutionTiler {
    fn default() -> Self {
        Self {
            max_tiles_per_axis: TileConfig::default().max_tiles_per_axis,
        }
    }
}

impl ResolutionTiler for BoundedResolutionTiler {
    fn tiles_for_resolution(
        &self,
        resolution: GenomicPos,
        bins_per_tile: u32,
        visible: &GenomicRange,
        min_pos: GenomicPos,
        max_pos: GenomicPos,
    ) -> Vec<TileIndex> {
        let tile_width = resolution * bins_per_tile as GenomicPos;
        if !tile_width.is_finite() || tile_width <= 0.0 {
            return Vec::new();
        }
        let Some(bounded) = visible.normalized().clamp(min_pos, max_pos) else {
            return Vec::new();
        };

        let first_valid = (min_pos / tile_width).floor().max(0.0);
        let last_valid = ((max_pos / tile_width).ceil() - 1.0).max(first_valid);

        let first = (bounded.start / tile_width).floor().max(first_valid);
        let last = (bounded.end / tile_width).ceil().min(last_valid);
        if !first.is_finite() || !last.is_finite() || first > last {
            return Vec::new();
        }

        // counted in f64 so huge extents cannot overflow the index type
        let count = last - first + 1.0;
        let mut last = last;
        if self.max_tiles_per_axis > 0 && count > self.max_tiles_per_axis as GenomicPos {
            log::warn!(
                "Visible range needs {} tiles at resolution {}, truncating to {}",
                count,
                resolution,
                self.max_tiles_per_axis
            );
            last = first + self.max_tiles_per_axis as GenomicPos - 1.0;
        }

        let first = first as TileIndex;
        let last = (last as TileIndex).max(first);

        (first..=last).collect()
    }
}

/// Index range of power-of-two tiles covering `range` on one axis.
///
/// `floor((start - origin) / w) ..= ceil((end - origin) / w)`, clamped to
/// `[0, max_index]`. `None` when the range misses the pyramid entirely.
pub fn covering_indices(
    range: &GenomicRange,
    origin: GenomicPos,
    tile_width: GenomicPos,
    max_index: TileIndex,
) -> Option<RangeInclusive<TileIndex>> {
    let range = range.normalized();
    let first = ((range.start - origin) / tile_width).floor();
    let last = ((range.end - origin) / tile_width).ceil();

    if !first.is_finite() || !last.is_finite() || last < 0.0 || first > max_index as GenomicPos {
        return None;
    }

    let first = first.max(0.0) as TileIndex;
    let last = (last as TileIndex).min(max_index);
    Some(first..=last)
}

fn max_tile_index(zoom: ZoomLevel) -> TileIndex {
    if zoom >= 64 {
        TileIndex::MAX
    } else {
        (1u64 << zoom).saturating_sub(1)
    }
}

/// Computes visible tile sets for one tileset
pub struct TileSelector {
    scheme: TileScheme,
    dimensions: usize,
    bounds: [(GenomicPos, GenomicPos); 2],
    tiler: Box<dyn ResolutionTiler + Send + Sync>,
}

impl TileSelector {
    pub fn new(info: &TilesetInfo, config: &TileConfig) -> TileResult<Self> {
        let tiler = BoundedResolutionTiler {
            max_tiles_per_axis: config.max_tiles_per_axis,
        };
        Self::with_tiler(info, config, Box::new(tiler))
    }

    pub fn with_tiler(
        info: &TilesetInfo,
        config: &TileConfig,
        tiler: Box<dyn ResolutionTiler + Send + Sync>,
    ) -> TileResult<Self> {
        Ok(Self {
            scheme: info.scheme(config.default_bins_per_tile)?,
            dimensions: info.dimensions(),
            bounds: [
                (info.min(Axis::X), info.max(Axis::X)),
                (info.min(Axis::Y), info.max(Axis::Y)),
            ],
            tiler,
        })
    }

    pub fn scheme(&self) -> &TileScheme {
        &self.scheme
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Tile indices along one axis
    pub fn axis_tiles(&self, zoom: ZoomLevel, range: &GenomicRange, axis: Axis) -> TileResult<Vec<TileIndex>> {
        let (min_pos, max_pos) = self.bounds[axis.index()];

        match &self.scheme {
            TileScheme::PowerOfTwo { .. } => {
                let tile_width = self.scheme.tile_width(zoom)?;
                Ok(covering_indices(range, min_pos, tile_width, max_tile_index(zoom))
                    .map(|r| r.collect())
                    .unwrap_or_default())
            }
            TileScheme::Resolutions { sorted, bins_per_tile } => {
                self.scheme.check_zoom(zoom)?;
                let resolution = sorted[zoom as usize];
                Ok(self.tiler.tiles_for_resolution(resolution, *bins_per_tile, range, min_pos, max_pos))
            }
        }
    }

    /// All tiles covering the visible ranges (one per tileset axis) at `zoom`
    pub fn visible_tiles(&self, zoom: ZoomLevel, visible: &[GenomicRange]) -> TileResult<VisibleTileSet> {
        if visible.len() != self.dimensions {
            return Err(TileError::AxisMismatch {
                expected: self.dimensions,
                actual: visible.len(),
            });
        }

        let xs = self.axis_tiles(zoom, &visible[0], Axis::X)?;
        if self.dimensions == 1 {
            return Ok(xs.into_iter().map(|x| TileId::new_1d(zoom, x)).collect());
        }

        let ys = self.axis_tiles(zoom, &visible[1], Axis::Y)?;
        Ok(xs
            .iter()
            .flat_map(|&x| ys.iter().map(move |&y| TileId::new_2d(zoom, x, y)))
            .collect())
    }
}

/// One-shot visible tile computation with default tile settings
pub fn visible_tiles(zoom: ZoomLevel, visible: &[GenomicRange], info: &TilesetInfo) -> TileResult<VisibleTileSet> {
    TileSelector::new(info, &TileConfig::default())?.visible_tiles(zoom, visible)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> TilesetInfo {
        TilesetInfo::power_of_two(vec![0.0], vec![1000.0], 1024.0, 4)
    }

    #[test]
    fn test_tile_id_keys() {
        assert_eq!(TileId::new_1d(3, 7).key(), "3.7");
        assert_eq!(TileId::new_2d(3, 7, 2).key(), "3.7.2");
        assert_eq!("3.7.2".parse::<TileId>().unwrap(), TileId::new_2d(3, 7, 2));
        assert!("3".parse::<TileId>().is_err());
        assert!("a.b".parse::<TileId>().is_err());
    }

    #[test]
    fn test_power_of_two_selection() {
        // zoom 2 => width 256; [300, 600] => floor(1.17)=1 ..= ceil(2.34)=3
        let set = visible_tiles(2, &[GenomicRange::new(300.0, 600.0)], &track()).unwrap();
        assert_eq!(set.keys(), vec!["2.1", "2.2", "2.3"]);
    }

    #[test]
    fn test_selection_clamped_to_pyramid() {
        let set = visible_tiles(1, &[GenomicRange::new(-5000.0, 5000.0)], &track()).unwrap();
        assert_eq!(set.keys(), vec!["1.0", "1.1"]);

        let empty = visible_tiles(1, &[GenomicRange::new(5000.0, 6000.0)], &track()).unwrap();
        assert!(empty.is_empty());
        let empty = visible_tiles(1, &[GenomicRange::new(-600.0, -550.0)], &track()).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_two_dimensional_cross_product() {
        let info = TilesetInfo::power_of_two(vec![0.0, 0.0], vec![1024.0, 1024.0], 1024.0, 3);
        let set = visible_tiles(
            2,
            &[GenomicRange::new(0.0, 200.0), GenomicRange::new(300.0, 400.0)],
            &info,
        )
        .unwrap();
        // x: 0..=ceil(0.78) ; y: floor(1.17)..=ceil(1.56)
        assert_eq!(set.keys(), vec!["2.0.1", "2.0.2", "2.1.1", "2.1.2"]);
    }

    #[test]
    fn test_axis_count_must_match() {
        let err = visible_tiles(0, &[GenomicRange::new(0.0, 1.0), GenomicRange::new(0.0, 1.0)], &track())
            .unwrap_err();
        assert_eq!(err, TileError::AxisMismatch { expected: 1, actual: 2 });
    }

    #[test]
    fn test_out_of_range_zoom() {
        let err = visible_tiles(5, &[GenomicRange::new(0.0, 1.0)], &track()).unwrap_err();
        assert!(matches!(err, TileError::OutOfRangeZoom { .. }));
    }

    #[test]
    fn test_resolution_selection() {
        let info = TilesetInfo::with_resolutions(vec![0.0], vec![10_000.0], vec![1.0, 10.0], Some(100));
        // zoom 1 => resolution 1, width 100
        let set = visible_tiles(1, &[GenomicRange::new(250.0, 420.0)], &info).unwrap();
        assert_eq!(set.keys(), vec!["1.2", "1.3", "1.4", "1.5"]);

        // zoom 0 => resolution 10, width 1000; range clamped to [0, 10000]
        let set = visible_tiles(0, &[GenomicRange::new(-500.0, 50_000.0)], &info).unwrap();
        assert_eq!(set.len(), 10);
        assert!(set.contains(&TileId::new_1d(0, 9)));
    }

    #[test]
    fn test_resolution_tiler_truncates() {
        let tiler = BoundedResolutionTiler { max_tiles_per_axis: 3 };
        let tiles = tiler.tiles_for_resolution(1.0, 10, &GenomicRange::new(0.0, 1000.0), 0.0, 1000.0);
        assert_eq!(tiles, vec![0, 1, 2]);
    }

    #[test]
    fn test_resolution_tiler_huge_extent() {
        let tiler = BoundedResolutionTiler::default();
        let tiles = tiler.tiles_for_resolution(1.0, 256, &GenomicRange::new(0.0, 1e30), 0.0, 1e30);
        assert_eq!(tiles, (0..20).collect::<Vec<TileIndex>>());

        let tiles = tiler.tiles_for_resolution(0.0, 256, &GenomicRange::new(0.0, 10.0), 0.0, 10.0);
        assert!(tiles.is_empty());
    }

    #[test]
    fn test_resolution_selection_two_dimensional() {
        let info = TilesetInfo::with_resolutions(
            vec![0.0, 0.0],
            vec![10_000.0, 5_000.0],
            vec![10.0, 1.0],
            Some(100),
        );
        // zoom 1 => resolution 1, width 100 on both axes
        let set = visible_tiles(
            1,
            &[GenomicRange::new(150.0, 250.0), GenomicRange::new(4_950.0, 9_000.0)],
            &info,
        )
        .unwrap();
        // x: floor(1.5)..=ceil(2.5); y clamped to [4950, 5000]: floor(49.5)..=min(ceil(50), 49)
        assert_eq!(set.keys(), vec!["1.1.49", "1.2.49", "1.3.49"]);

        let capped = TileSelector::with_tiler(
            &info,
            &TileConfig::default(),
            Box::new(BoundedResolutionTiler { max_tiles_per_axis: 2 }),
        )
        .unwrap()
        .visible_tiles(1, &[GenomicRange::new(0.0, 10_000.0), GenomicRange::new(0.0, 5_000.0)])
        .unwrap();
        assert_eq!(capped.keys(), vec!["1.0.0", "1.0.1", "1.1.0", "1.1.1"]);
    }

    #[test]
    fn test_diff_partitions() {
        let prev: VisibleTileSet = (0..3).map(|x| TileId::new_1d(2, x)).collect();
        let next: VisibleTileSet = (1..5).map(|x| TileId::new_1d(2, x)).collect();
        let delta = next.diff(&prev);
        assert_eq!(delta.entered, vec![TileId::new_1d(2, 3), TileId::new_1d(2, 4)]);
        assert_eq!(delta.retained, vec![TileId::new_1d(2, 1), TileId::new_1d(2, 2)]);
        assert_eq!(delta.exited, vec![TileId::new_1d(2, 0)]);
    }
}

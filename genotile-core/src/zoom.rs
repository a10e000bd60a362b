//! Default zoom-level selection for a visible range

use crate::config::{EngineConfig, DEFAULT_BINS_PER_TILE, DEFAULT_VIEW_RESOLUTION};
use crate::error::TileResult;
use crate::tileset::{TileScheme, TilesetInfo};
use crate::types::{GenomicPos, GenomicRange, ZoomLevel};

/// Chooses the zoom level a track should request for a visible range
pub trait ZoomPolicy {
    fn zoom_level(&self, info: &TilesetInfo, visible: &GenomicRange, track_width_px: f64) -> TileResult<ZoomLevel>;
}

/// Picks the zoom at which tiles are drawn at roughly their native density.
///
/// Power-of-two tilesets zoom in one level per halving of the visible width,
/// plus extra levels when the track is wider than `view_resolution` pixels.
/// Resolution tilesets use the finest resolution that still has more than one
/// pixel per bin.
#[derive(Debug, Clone)]
pub struct DensityZoomPolicy {
    pub view_resolution: f64,
    pub default_bins_per_tile: u32,
}

impl Default for DensityZoomPolicy {
    fn default() -> Self {
        Self {
            view_resolution: DEFAULT_VIEW_RESOLUTION,
            default_bins_per_tile: DEFAULT_BINS_PER_TILE,
        }
    }
}

impl DensityZoomPolicy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            view_resolution: config.zoom.view_resolution,
            default_bins_per_tile: config.tiles.default_bins_per_tile,
        }
    }
}

impl ZoomPolicy for DensityZoomPolicy {
    fn zoom_level(&self, info: &TilesetInfo, visible: &GenomicRange, track_width_px: f64) -> TileResult<ZoomLevel> {
        let visible_width = visible.width().abs();

        Ok(match info.scheme(self.default_bins_per_tile)? {
            TileScheme::PowerOfTwo { max_width, max_zoom } => {
                power_of_two_zoom(max_width, visible_width, track_width_px, self.view_resolution, max_zoom)
            }
            TileScheme::Resolutions { sorted, .. } => resolution_zoom(&sorted, visible_width, track_width_px),
        })
    }
}

pub fn power_of_two_zoom(
    max_width: GenomicPos,
    visible_width: GenomicPos,
    track_width_px: f64,
    view_resolution: f64,
    max_zoom: ZoomLevel,
) -> ZoomLevel {
    let ratio = if visible_width > 0.0 { max_width / visible_width } else { f64::INFINITY };
    let base = ratio.max(1.0).log2().round();
    let extra = if track_width_px > 0.0 && view_resolution > 0.0 {
        (track_width_px / view_resolution).log2().ceil().max(0.0)
    } else {
        0.0
    };

    let zoom = base + extra;
    if !zoom.is_finite() || zoom >= max_zoom as f64 {
        max_zoom
    } else {
        zoom as ZoomLevel
    }
}

/// Index into `sorted` (coarsest first) of the finest resolution with fewer
/// than one bin per pixel, or 0 when even the coarsest is too dense
pub fn resolution_zoom(sorted: &[GenomicPos], visible_width: GenomicPos, track_width_px: f64) -> ZoomLevel {
    if track_width_px <= 0.0 {
        return 0;
    }

    sorted
        .iter()
        .rposition(|resolution| visible_width / resolution / track_width_px < 1.0)
        .map_or(0, |i| i as ZoomLevel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_dataset_at_native_width() {
        let info = TilesetInfo::power_of_two(vec![0.0], vec![1e6], 1_048_576.0, 10);
        let policy = DensityZoomPolicy::default();
        let zoom = policy.zoom_level(&info, &GenomicRange::new(0.0, 1_048_576.0), 384.0).unwrap();
        assert_eq!(zoom, 0);
    }

    #[test]
    fn test_zoom_increases_as_range_narrows() {
        assert_eq!(power_of_two_zoom(1024.0, 256.0, 384.0, 384.0, 10), 2);
        // wider track adds a level
        assert_eq!(power_of_two_zoom(1024.0, 256.0, 700.0, 384.0, 10), 3);
        // range wider than the data does not go negative
        assert_eq!(power_of_two_zoom(1024.0, 4096.0, 100.0, 384.0, 10), 0);
    }

    #[test]
    fn test_zoom_clamped_to_max() {
        assert_eq!(power_of_two_zoom(1024.0, 1.0, 384.0, 384.0, 4), 4);
        assert_eq!(power_of_two_zoom(1024.0, 0.0, 384.0, 384.0, 4), 4);
    }

    #[test]
    fn test_resolution_zoom() {
        let sorted = [1000.0, 100.0, 10.0, 1.0];
        // 10_000 units over 500 px: resolution 100 gives 0.2 bins/px, 10 gives 2
        assert_eq!(resolution_zoom(&sorted, 10_000.0, 500.0), 1);
        assert_eq!(resolution_zoom(&sorted, 100.0, 500.0), 3);
        assert_eq!(resolution_zoom(&sorted, 1e9, 500.0), 0);
    }

    #[test]
    fn test_policy_dispatches_on_scheme() {
        let info = TilesetInfo::with_resolutions(vec![0.0], vec![1e6], vec![1.0, 100.0, 10.0], None);
        let policy = DensityZoomPolicy::default();
        let zoom = policy.zoom_level(&info, &GenomicRange::new(0.0, 2000.0), 500.0).unwrap();
        assert_eq!(zoom, 1);
    }
}

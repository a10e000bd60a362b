//! Tileset metadata and the zoom-pyramid addressing scheme it implies

use serde::{Deserialize, Serialize};

use crate::error::{TileError, TileResult};
use crate::types::{Axis, GenomicPos, ZoomLevel};

/// Metadata describing a tileset, as served alongside the tiles.
///
/// Field names follow the tileset info JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilesetInfo {
    pub min_pos: Vec<GenomicPos>,
    pub max_pos: Vec<GenomicPos>,
    #[serde(default)]
    pub max_zoom: Option<ZoomLevel>,
    #[serde(default)]
    pub max_width: Option<GenomicPos>,
    #[serde(default)]
    pub tile_size: Option<u32>,
    #[serde(default)]
    pub resolutions: Option<Vec<GenomicPos>>,
}

/// The addressing scheme in force for a tileset. Exactly one applies.
#[derive(Debug, Clone, PartialEq)]
pub enum TileScheme {
    /// Tiles halve in width with every zoom level, starting from `max_width`
    PowerOfTwo {
        max_width: GenomicPos,
        max_zoom: ZoomLevel,
    },
    /// Explicit resolutions, coarsest first; zoom level `z` uses `sorted[z]`
    Resolutions {
        sorted: Vec<GenomicPos>,
        bins_per_tile: u32,
    },
}

impl TilesetInfo {
    /// Power-of-two tileset covering `[min, min + max_width]` on each axis
    pub fn power_of_two(min_pos: Vec<GenomicPos>, max_pos: Vec<GenomicPos>, max_width: GenomicPos, max_zoom: ZoomLevel) -> Self {
        Self {
            min_pos,
            max_pos,
            max_zoom: Some(max_zoom),
            max_width: Some(max_width),
            tile_size: None,
            resolutions: None,
        }
    }

    pub fn with_resolutions(min_pos: Vec<GenomicPos>, max_pos: Vec<GenomicPos>, resolutions: Vec<GenomicPos>, tile_size: Option<u32>) -> Self {
        Self {
            min_pos,
            max_pos,
            max_zoom: None,
            max_width: None,
            tile_size,
            resolutions: Some(resolutions),
        }
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let info: TilesetInfo = serde_json::from_str(text)?;
        Ok(info)
    }

    /// Number of axes the tileset is addressed in (1 for tracks, 2 for matrices)
    pub fn dimensions(&self) -> usize {
        self.min_pos.len()
    }

    /// Lower data bound on an axis; 1-D tilesets reuse their only bound for y
    pub fn min(&self, axis: Axis) -> GenomicPos {
        self.min_pos
            .get(axis.index())
            .or_else(|| self.min_pos.first())
            .copied()
            .unwrap_or(0.0)
    }

    pub fn max(&self, axis: Axis) -> GenomicPos {
        self.max_pos
            .get(axis.index())
            .or_else(|| self.max_pos.first())
            .copied()
            .unwrap_or(0.0)
    }

    /// Resolve which addressing scheme applies, validating the metadata.
    ///
    /// `default_bins_per_tile` is only consulted for resolution tilesets
    /// without a `tile_size`.
    pub fn scheme(&self, default_bins_per_tile: u32) -> TileResult<TileScheme> {
        if self.min_pos.is_empty() || self.min_pos.len() > 2 {
            return Err(TileError::InvalidTileset(format!(
                "min_pos must have 1 or 2 entries, got {}",
                self.min_pos.len()
            )));
        }
        if self.min_pos.len() != self.max_pos.len() {
            return Err(TileError::InvalidTileset(format!(
                "min_pos has {} entries but max_pos has {}",
                self.min_pos.len(),
                self.max_pos.len()
            )));
        }

        if let Some(resolutions) = &self.resolutions {
            if resolutions.is_empty() {
                return Err(TileError::InvalidTileset("empty resolutions list".to_string()));
            }
            if resolutions.iter().any(|r| !r.is_finite() || *r <= 0.0) {
                return Err(TileError::InvalidTileset(
                    "resolutions must be positive finite numbers".to_string(),
                ));
            }

            let mut sorted = resolutions.clone();
            sorted.sort_by(|a, b| b.total_cmp(a));

            let bins_per_tile = match self.tile_size {
                Some(size) if size > 0 => size,
                _ => {
                    log::debug!(
                        "Tileset has no tile_size, assuming {} bins per tile",
                        default_bins_per_tile
                    );
                    default_bins_per_tile
                }
            };

            return Ok(TileScheme::Resolutions { sorted, bins_per_tile });
        }

        let max_width = self
            .max_width
            .filter(|w| w.is_finite() && *w > 0.0)
            .ok_or_else(|| TileError::InvalidTileset("max_width is required without resolutions".to_string()))?;
        let max_zoom = self
            .max_zoom
            .ok_or_else(|| TileError::InvalidTileset("max_zoom is required without resolutions".to_string()))?;

        Ok(TileScheme::PowerOfTwo { max_width, max_zoom })
    }
}

impl TileScheme {
    pub fn max_zoom(&self) -> ZoomLevel {
        match self {
            TileScheme::PowerOfTwo { max_zoom, .. } => *max_zoom,
            TileScheme::Resolutions { sorted, .. } => (sorted.len() - 1) as ZoomLevel,
        }
    }

    pub fn check_zoom(&self, zoom: ZoomLevel) -> TileResult<()> {
        let max_zoom = self.max_zoom();
        if zoom > max_zoom {
            Err(TileError::OutOfRangeZoom { zoom, max_zoom })
        } else {
            Ok(())
        }
    }

    /// Resolution (data units per bin) for a zoom level of a resolution tileset
    pub fn resolution(&self, zoom: ZoomLevel) -> TileResult<Option<GenomicPos>> {
        self.check_zoom(zoom)?;
        Ok(match self {
            TileScheme::PowerOfTwo { .. } => None,
            TileScheme::Resolutions { sorted, .. } => Some(sorted[zoom as usize]),
        })
    }

    /// Width of one tile, in data units, at `zoom`
    pub fn tile_width(&self, zoom: ZoomLevel) -> TileResult<GenomicPos> {
        self.check_zoom(zoom)?;
        Ok(match self {
            TileScheme::PowerOfTwo { max_width, .. } => max_width / 2f64.powi(zoom as i32),
            TileScheme::Resolutions { sorted, bins_per_tile } => {
                sorted[zoom as usize] * *bins_per_tile as GenomicPos
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_of_two_scheme() {
        let info = TilesetInfo::power_of_two(vec![0.0], vec![1000.0], 1024.0, 4);
        let scheme = info.scheme(1024).unwrap();
        assert_eq!(scheme, TileScheme::PowerOfTwo { max_width: 1024.0, max_zoom: 4 });
        assert_eq!(scheme.tile_width(0).unwrap(), 1024.0);
        assert_eq!(scheme.tile_width(3).unwrap(), 128.0);
    }

    #[test]
    fn test_resolutions_sorted_descending() {
        let info = TilesetInfo::with_resolutions(vec![0.0], vec![1e6], vec![10.0, 1000.0, 100.0], Some(256));
        let scheme = info.scheme(1024).unwrap();
        match &scheme {
            TileScheme::Resolutions { sorted, bins_per_tile } => {
                assert_eq!(sorted, &vec![1000.0, 100.0, 10.0]);
                assert_eq!(*bins_per_tile, 256);
            }
            other => panic!("unexpected scheme {:?}", other),
        }
        assert_eq!(scheme.max_zoom(), 2);
        assert_eq!(scheme.tile_width(1).unwrap(), 100.0 * 256.0);
    }

    #[test]
    fn test_resolutions_default_tile_size() {
        let info = TilesetInfo::with_resolutions(vec![0.0], vec![1e6], vec![1.0], None);
        let scheme = info.scheme(1024).unwrap();
        assert_eq!(scheme.tile_width(0).unwrap(), 1024.0);
    }

    #[test]
    fn test_out_of_range_zoom() {
        let info = TilesetInfo::power_of_two(vec![0.0], vec![1000.0], 1024.0, 4);
        let scheme = info.scheme(1024).unwrap();
        assert_eq!(
            scheme.tile_width(5),
            Err(TileError::OutOfRangeZoom { zoom: 5, max_zoom: 4 })
        );
    }

    #[test]
    fn test_missing_max_width_is_invalid() {
        let mut info = TilesetInfo::power_of_two(vec![0.0], vec![1000.0], 1024.0, 4);
        info.max_width = None;
        assert!(matches!(info.scheme(1024), Err(TileError::InvalidTileset(_))));
    }

    #[test]
    fn test_from_json() {
        let info = TilesetInfo::from_json(
            r#"{"min_pos": [0, 0], "max_pos": [3000, 3000], "max_zoom": 2, "max_width": 4096}"#,
        )
        .unwrap();
        assert_eq!(info.dimensions(), 2);
        assert_eq!(info.max(Axis::Y), 3000.0);
        assert!(matches!(info.scheme(1024).unwrap(), TileScheme::PowerOfTwo { .. }));
    }
}

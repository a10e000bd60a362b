//! Tunable defaults for the tiling, search and zoom components

use serde::{Deserialize, Serialize};

/// Bins per tile assumed when a resolution-based tileset omits `tile_size`.
/// A policy default, not a property of any particular tileset.
pub const DEFAULT_BINS_PER_TILE: u32 = 1024;

/// Half-width of the window shown around a single searched position.
pub const DEFAULT_POINT_RADIUS: f64 = 8_000_000.0;

/// Cap on tiles requested per axis for resolution-based tilesets
pub const DEFAULT_MAX_TILES_PER_AXIS: usize = 20;

/// Pixel width a single tile is expected to cover at its native zoom
pub const DEFAULT_VIEW_RESOLUTION: f64 = 384.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileConfig {
    #[serde(default = "default_bins_per_tile")]
    pub default_bins_per_tile: u32,

    #[serde(default = "default_max_tiles_per_axis")]
    pub max_tiles_per_axis: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_point_radius")]
    pub point_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomConfig {
    #[serde(default = "default_view_resolution")]
    pub view_resolution: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub tiles: TileConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub zoom: ZoomConfig,
}

fn default_bins_per_tile() -> u32 { DEFAULT_BINS_PER_TILE }
fn default_max_tiles_per_axis() -> usize { DEFAULT_MAX_TILES_PER_AXIS }
fn default_point_radius() -> f64 { DEFAULT_POINT_RADIUS }
fn default_view_resolution() -> f64 { DEFAULT_VIEW_RESOLUTION }

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            default_bins_per_tile: default_bins_per_tile(),
            max_tiles_per_axis: default_max_tiles_per_axis(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            point_radius: default_point_radius(),
        }
    }
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            view_resolution: default_view_resolution(),
        }
    }
}

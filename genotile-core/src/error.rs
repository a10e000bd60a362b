//! Error types for tile addressing and tile processing

use thiserror::Error;

use crate::types::ZoomLevel;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TileError {
    #[error("Zoom level {zoom} is beyond the tileset's maximum zoom {max_zoom}")]
    OutOfRangeZoom { zoom: ZoomLevel, max_zoom: ZoomLevel },

    #[error("Tile data length {actual} does not match shape {shape:?} (expected {expected})")]
    ShapeMismatch {
        shape: [usize; 2],
        expected: usize,
        actual: usize,
    },

    #[error("Sum normalization is undefined for tiles with negative values")]
    SignModeConflict,

    #[error("Invalid tileset info: {0}")]
    InvalidTileset(String),

    #[error("Invalid tile id: {0}")]
    InvalidTileId(String),

    #[error("Expected {expected} axis range(s) for this tileset, got {actual}")]
    AxisMismatch { expected: usize, actual: usize },
}

/// Failure reported by the tile transport
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FetchError {
    #[error("Tile {0} is not available")]
    Unavailable(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed tile payload: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

pub type TileResult<T> = Result<T, TileError>;

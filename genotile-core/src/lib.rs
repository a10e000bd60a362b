//! genotile core library
//!
//! Tile addressing, tile data normalization and locus search for tiled
//! genomic data tracks and matrices.

pub mod types;
pub mod error;
pub mod config;
pub mod chrom;
pub mod tileset;
pub mod coords;
pub mod tiles;
pub mod normalize;
pub mod cache;
pub mod track;
pub mod zoom;
pub mod search;

// Re-export commonly used types and functions
pub use types::{Axis, GenomicPos, GenomicRange, TileIndex, ZoomLevel};
pub use error::{FetchError, TileError, TileResult};
pub use config::EngineConfig;
pub use chrom::{ChromSizesError, ChromosomeIndex};
pub use tileset::{TileScheme, TilesetInfo};
pub use coords::{tile_position, AxisExtent, TileGeometry, TilePosition};
pub use tiles::{visible_tiles, ResolutionTiler, TileDelta, TileId, TileSelector, VisibleTileSet};
pub use normalize::{
    unflatten, NormalizationMode, NormalizedTile, Normalizer, SharedValueScaling, SortOrder, TilePayload,
    TileStats, ValueScaling,
};
pub use cache::{FetchOutcome, TileCache, TileFetcher};
pub use track::{RenderTile, Track};
pub use zoom::{DensityZoomPolicy, ZoomPolicy};
pub use search::{ParsedLocus, SearchField};

/// Version information for the genotile core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! A tiled data track: tile selection, fetching and normalization for one
//! tileset, composed from the geometry, selector, cache and normalizer.

use serde::Serialize;

use crate::cache::{FetchOutcome, RefreshSummary, TileCache, TileFetcher};
use crate::config::EngineConfig;
use crate::coords::{TileGeometry, TilePosition};
use crate::error::{FetchError, TileError, TileResult};
use crate::normalize::{NormalizationMode, NormalizedTile, Normalizer, SharedValueScaling, TilePayload, TileStats};
use crate::tiles::{ResolutionTiler, TileDelta, TileId, TileSelector, VisibleTileSet};
use crate::tileset::TilesetInfo;
use crate::types::{GenomicRange, ZoomLevel};
use crate::zoom::ZoomPolicy;

/// Everything a renderer needs to draw one tile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderTile {
    pub id: TileId,
    pub position: TilePosition,
    pub stats: TileStats,
    pub data: NormalizedTile,
}

pub struct Track {
    info: TilesetInfo,
    geometry: TileGeometry,
    selector: TileSelector,
    normalizer: Normalizer,
    cache: TileCache,
    mode: NormalizationMode,
    zoom: Option<ZoomLevel>,
}

impl Track {
    pub fn new(info: TilesetInfo, config: &EngineConfig, scaling: SharedValueScaling) -> TileResult<Self> {
        let selector = TileSelector::new(&info, &config.tiles)?;
        Self::build(info, config, scaling, selector)
    }

    pub fn with_tiler(
        info: TilesetInfo,
        config: &EngineConfig,
        scaling: SharedValueScaling,
        tiler: Box<dyn ResolutionTiler + Send + Sync>,
    ) -> TileResult<Self> {
        let selector = TileSelector::with_tiler(&info, &config.tiles, tiler)?;
        Self::build(info, config, scaling, selector)
    }

    fn build(info: TilesetInfo, config: &EngineConfig, scaling: SharedValueScaling, selector: TileSelector) -> TileResult<Self> {
        Ok(Self {
            geometry: TileGeometry::new(&info, &config.tiles)?,
            info,
            selector,
            normalizer: Normalizer::new(scaling),
            cache: TileCache::new(),
            mode: NormalizationMode::RowSum,
            zoom: None,
        })
    }

    pub fn info(&self) -> &TilesetInfo {
        &self.info
    }

    pub fn zoom(&self) -> Option<ZoomLevel> {
        self.zoom
    }

    pub fn mode(&self) -> NormalizationMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: NormalizationMode) {
        self.mode = mode;
    }

    pub fn scaling(&self) -> &SharedValueScaling {
        self.normalizer.scaling()
    }

    pub fn visible(&self) -> &VisibleTileSet {
        self.cache.visible()
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    /// Recompute the visible set for a new viewport.
    ///
    /// `visible` holds one range per tileset axis. Tiles that left the view
    /// are evicted; returns the tiles that now need fetching.
    pub fn update_viewport(&mut self, zoom: ZoomLevel, visible: &[GenomicRange]) -> TileResult<Vec<TileId>> {
        let tiles = self.selector.visible_tiles(zoom, visible)?;
        self.zoom = Some(zoom);
        self.cache.set_visible(tiles);
        Ok(self.cache.take_requests())
    }

    /// Like [`Track::update_viewport`], choosing the zoom level with `policy`
    /// from the x range and the track's pixel width
    pub fn update_viewport_auto(
        &mut self,
        policy: &dyn ZoomPolicy,
        visible: &[GenomicRange],
        track_width_px: f64,
    ) -> TileResult<Vec<TileId>> {
        let Some(x) = visible.first() else {
            return Err(TileError::AxisMismatch {
                expected: self.selector.dimensions(),
                actual: 0,
            });
        };
        let zoom = policy.zoom_level(&self.info, x, track_width_px)?;
        self.update_viewport(zoom, visible)
    }

    /// Same partition [`Track::update_viewport`] would apply, without mutating
    pub fn preview_viewport(&self, zoom: ZoomLevel, visible: &[GenomicRange]) -> TileResult<TileDelta> {
        Ok(self.selector.visible_tiles(zoom, visible)?.diff(self.cache.visible()))
    }

    pub fn on_fetch_complete(&mut self, id: TileId, result: Result<TilePayload, FetchError>) -> FetchOutcome {
        self.cache.on_fetch_complete(id, result)
    }

    pub fn refresh(&mut self, fetcher: &dyn TileFetcher) -> RefreshSummary {
        self.cache.refresh(fetcher)
    }

    pub fn tile_position(&self, id: &TileId) -> TileResult<TilePosition> {
        self.geometry.tile_position(id)
    }

    /// Normalized data for a loaded tile; `Ok(None)` when not loaded
    pub fn render_tile(&mut self, id: &TileId) -> TileResult<Option<RenderTile>> {
        let position = self.geometry.tile_position(id)?;
        let Some(tile) = self.cache.processed(id, &self.normalizer)? else {
            return Ok(None);
        };

        Ok(Some(RenderTile {
            id: *id,
            position,
            stats: tile.stats,
            data: self.normalizer.normalize(tile, self.mode),
        }))
    }

    /// Render every loaded visible tile, in tile order.
    ///
    /// Tiles that fail to unflatten are skipped (and dropped from the cache).
    pub fn render_visible(&mut self) -> Vec<RenderTile> {
        let ids: Vec<TileId> = self.cache.visible().iter().copied().collect();
        ids.iter()
            .filter_map(|id| match self.render_tile(id) {
                Ok(tile) => tile,
                Err(e) => {
                    log::debug!("Skipping tile {}: {}", id, e);
                    None
                }
            })
            .collect()
    }

    /// Shared value extent over the loaded visible tiles, for a common scale
    pub fn value_extent(&mut self) -> TileStats {
        let mut extent = TileStats { max_value: 0.0, min_value: None };
        for id in self.cache.loaded_ids() {
            if let Ok(Some(tile)) = self.cache.processed(&id, &self.normalizer) {
                extent.max_value = extent.max_value.max(tile.stats.max_value);
                extent.min_value = match (extent.min_value, tile.stats.min_value) {
                    (Some(a), Some(b)) => Some(a.max(b)),
                    (a, b) => a.or(b),
                };
            }
        }
        extent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::ValueScaling;

    fn info() -> TilesetInfo {
        TilesetInfo::power_of_two(vec![0.0], vec![1024.0], 1024.0, 4)
    }

    fn fetch(id: &TileId) -> Result<TilePayload, FetchError> {
        Ok(TilePayload {
            zoom_level: id.zoom,
            tile_pos: id.indices(),
            shape: [2, 2],
            dense: vec![1.0, 3.0, 1.0, 1.0],
        })
    }

    #[test]
    fn test_viewport_requests_then_renders() {
        let mut track = Track::new(info(), &EngineConfig::default(), SharedValueScaling::default()).unwrap();
        let requests = track.update_viewport(2, &[GenomicRange::new(0.0, 300.0)]).unwrap();
        assert_eq!(requests, vec![TileId::new_1d(2, 0), TileId::new_1d(2, 1), TileId::new_1d(2, 2)]);

        let summary = track.refresh(&fetch);
        assert_eq!(summary.stored, 3);

        let rendered = track.render_visible();
        assert_eq!(rendered.len(), 3);
        assert_eq!(rendered[1].position.x.start, 256.0);
        match &rendered[0].data {
            NormalizedTile::RowSum { matrix } => assert_eq!(matrix[0], vec![0.5, 0.5]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_pan_only_requests_new_tiles() {
        let mut track = Track::new(info(), &EngineConfig::default(), SharedValueScaling::default()).unwrap();
        track.update_viewport(2, &[GenomicRange::new(0.0, 300.0)]).unwrap();
        track.refresh(&fetch);

        let requests = track.update_viewport(2, &[GenomicRange::new(260.0, 600.0)]).unwrap();
        assert_eq!(requests, vec![TileId::new_1d(2, 3)]);
        assert!(!track.cache().is_loaded(&TileId::new_1d(2, 0)));
    }

    #[test]
    fn test_value_extent_and_shared_scaling() {
        let scaling = SharedValueScaling::default();
        let mut signed = Track::new(info(), &EngineConfig::default(), scaling.clone()).unwrap();
        let other = Track::new(info(), &EngineConfig::default(), scaling).unwrap();

        signed.update_viewport(0, &[GenomicRange::new(0.0, 10.0)]).unwrap();
        let negative = |id: &TileId| -> Result<TilePayload, FetchError> {
            Ok(TilePayload {
                zoom_level: id.zoom,
                tile_pos: id.indices(),
                shape: [2, 1],
                dense: vec![2.0, -1.5],
            })
        };
        signed.refresh(&negative);

        let extent = signed.value_extent();
        assert_eq!(extent.max_value, 2.0);
        assert_eq!(extent.min_value, Some(1.5));
        assert_eq!(other.scaling().get(), ValueScaling::Exponential);
    }

    #[test]
    fn test_preview_does_not_mutate() {
        let mut track = Track::new(info(), &EngineConfig::default(), SharedValueScaling::default()).unwrap();
        track.update_viewport(1, &[GenomicRange::new(0.0, 100.0)]).unwrap();
        let delta = track.preview_viewport(1, &[GenomicRange::new(600.0, 700.0)]).unwrap();
        assert_eq!(delta.exited, vec![TileId::new_1d(1, 0)]);
        assert!(track.visible().contains(&TileId::new_1d(1, 0)));
    }
}

//! Loaded and in-flight tile bookkeeping for one track

use std::collections::{HashMap, HashSet};

use crate::error::{FetchError, TileResult};
use crate::normalize::{Normalizer, ProcessedTile, TilePayload};
use crate::tiles::{TileDelta, TileId, VisibleTileSet};

/// Tile transport. Implementations may block; asynchronous callers use the
/// request/complete pair on [`TileCache`] instead.
pub trait TileFetcher {
    fn fetch(&self, id: &TileId) -> Result<TilePayload, FetchError>;
}

impl<F> TileFetcher for F
where
    F: Fn(&TileId) -> Result<TilePayload, FetchError>,
{
    fn fetch(&self, id: &TileId) -> Result<TilePayload, FetchError> {
        self(id)
    }
}

/// A fetched tile; the matrix and statistics are derived on first access
#[derive(Debug, Clone)]
pub struct CachedTile {
    payload: TilePayload,
    processed: Option<ProcessedTile>,
}

impl CachedTile {
    fn new(payload: TilePayload) -> Self {
        Self { payload, processed: None }
    }

    pub fn payload(&self) -> &TilePayload {
        &self.payload
    }

    pub fn is_processed(&self) -> bool {
        self.processed.is_some()
    }
}

/// What happened to a completed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Stored,
    /// The tile left the visible set while in flight; the result was dropped
    Stale,
    /// The fetch failed; the tile is marked unavailable
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub requested: usize,
    pub stored: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct TileCache {
    visible: VisibleTileSet,
    loaded: HashMap<TileId, CachedTile>,
    loading: HashSet<TileId>,
    unavailable: HashSet<TileId>,
}

impl TileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible(&self) -> &VisibleTileSet {
        &self.visible
    }

    /// Replace the visible set, discarding everything that left it
    pub fn set_visible(&mut self, visible: VisibleTileSet) -> TileDelta {
        let delta = visible.diff(&self.visible);

        for id in &delta.exited {
            self.loaded.remove(id);
            self.loading.remove(id);
            self.unavailable.remove(id);
        }
        if !delta.exited.is_empty() || !delta.entered.is_empty() {
            log::debug!(
                "Visible tiles: {} entered, {} retained, {} exited",
                delta.entered.len(),
                delta.retained.len(),
                delta.exited.len()
            );
        }

        self.visible = visible;
        delta
    }

    /// Visible tiles that still need fetching; they are marked as loading
    pub fn take_requests(&mut self) -> Vec<TileId> {
        let requests: Vec<TileId> = self
            .visible
            .iter()
            .copied()
            .filter(|id| {
                !self.loaded.contains_key(id) && !self.loading.contains(id) && !self.unavailable.contains(id)
            })
            .collect();

        self.loading.extend(requests.iter().copied());
        requests
    }

    /// Accept a fetch result for `id`.
    ///
    /// Results for tiles no longer visible are discarded and never retried.
    /// A payload whose own id disagrees with `id` counts as a failed fetch.
    pub fn on_fetch_complete(&mut self, id: TileId, result: Result<TilePayload, FetchError>) -> FetchOutcome {
        self.loading.remove(&id);

        if !self.visible.contains(&id) {
            log::debug!("Dropping stale tile {}", id);
            return FetchOutcome::Stale;
        }

        let result = result.and_then(|payload| match payload.tile_id() {
            Ok(got) if got == id => Ok(payload),
            Ok(got) => Err(FetchError::Malformed(format!("requested tile {} but received {}", id, got))),
            Err(e) => Err(FetchError::Malformed(e.to_string())),
        });

        match result {
            Ok(payload) => {
                self.loaded.insert(id, CachedTile::new(payload));
                FetchOutcome::Stored
            }
            Err(e) => {
                log::warn!("Tile {} unavailable: {}", id, e);
                self.unavailable.insert(id);
                FetchOutcome::Failed
            }
        }
    }

    /// Fetch every outstanding request synchronously
    pub fn refresh(&mut self, fetcher: &dyn TileFetcher) -> RefreshSummary {
        let requests = self.take_requests();
        let mut summary = RefreshSummary {
            requested: requests.len(),
            ..Default::default()
        };

        for id in requests {
            match self.on_fetch_complete(id, fetcher.fetch(&id)) {
                FetchOutcome::Stored => summary.stored += 1,
                FetchOutcome::Failed => summary.failed += 1,
                FetchOutcome::Stale => {}
            }
        }
        summary
    }

    pub fn get(&self, id: &TileId) -> Option<&CachedTile> {
        self.loaded.get(id)
    }

    /// Matrix and statistics for a loaded tile, computed once.
    ///
    /// `Ok(None)` when the tile is not loaded. A tile whose payload cannot be
    /// unflattened is dropped and marked unavailable.
    pub fn processed(&mut self, id: &TileId, normalizer: &Normalizer) -> TileResult<Option<&ProcessedTile>> {
        let Some(entry) = self.loaded.get_mut(id) else {
            return Ok(None);
        };

        if entry.processed.is_none() {
            match normalizer.process(&entry.payload) {
                Ok(processed) => entry.processed = Some(processed),
                Err(e) => {
                    log::warn!("Dropping tile {}: {}", id, e);
                    self.loaded.remove(id);
                    self.unavailable.insert(*id);
                    return Err(e);
                }
            }
        }

        Ok(self.loaded.get(id).and_then(|entry| entry.processed.as_ref()))
    }

    pub fn loaded_ids(&self) -> Vec<TileId> {
        let mut ids: Vec<TileId> = self.loaded.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_loaded(&self, id: &TileId) -> bool {
        self.loaded.contains_key(id)
    }

    pub fn is_loading(&self, id: &TileId) -> bool {
        self.loading.contains(id)
    }

    pub fn is_unavailable(&self, id: &TileId) -> bool {
        self.unavailable.contains(id)
    }
}

//! Tile payload unflattening, statistics and per-row normalization
//!
//! Tiles arrive as a flat buffer interleaved by channel: element
//! `shape_y * i + j` is channel `i` of row `j`. [`unflatten`] rebuilds the
//! row-major matrix that renderers consume, and [`Normalizer`] derives the
//! scaling statistics and normalized forms.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{TileError, TileResult};
use crate::tiles::TileId;
use crate::types::{TileIndex, ZoomLevel};

/// Rows of channel values; `matrix[row][channel]`
pub type Matrix = Vec<Vec<f64>>;

/// A fetched tile as delivered by the tile server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilePayload {
    pub zoom_level: ZoomLevel,
    pub tile_pos: Vec<TileIndex>,
    /// `[channels per row, rows]`
    pub shape: [usize; 2],
    pub dense: Vec<f64>,
}

impl TilePayload {
    pub fn tile_id(&self) -> TileResult<TileId> {
        TileId::from_indices(self.zoom_level, &self.tile_pos)
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Reshape a channel-interleaved buffer into `shape_y` rows of `shape_x` values.
///
/// The buffer length must be exactly `shape_x * shape_y`; anything else is a
/// [`TileError::ShapeMismatch`] and the tile must be dropped.
pub fn unflatten(dense: &[f64], shape: [usize; 2]) -> TileResult<Matrix> {
    let [shape_x, shape_y] = shape;
    let mismatch = |expected| TileError::ShapeMismatch {
        shape,
        expected,
        actual: dense.len(),
    };

    let expected = shape_x.checked_mul(shape_y).ok_or_else(|| mismatch(usize::MAX))?;
    if dense.len() != expected {
        return Err(mismatch(expected));
    }

    Ok((0..shape_y)
        .map(|j| (0..shape_x).map(|i| dense[shape_y * i + j]).collect())
        .collect())
}

/// Tile-level aggregates used to set a shared value-to-pixel scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileStats {
    /// Largest per-row sum of the non-negative entries
    pub max_value: f64,
    /// Largest per-row sum of |negative entries|, `None` without negatives
    pub min_value: Option<f64>,
}

pub fn find_max_and_min(matrix: &Matrix) -> TileStats {
    let mut max_value = 0.0f64;
    let mut min_value: Option<f64> = None;

    for row in matrix {
        let positive: f64 = row.iter().filter(|v| **v >= 0.0).sum();
        max_value = max_value.max(positive);

        if row.iter().any(|v| *v < 0.0) {
            let negative: f64 = row.iter().filter(|v| **v < 0.0).map(|v| v.abs()).sum();
            min_value = Some(min_value.map_or(negative, |m| m.max(negative)));
        }
    }

    TileStats { max_value, min_value }
}

/// Largest row sum in the matrix, never below zero
pub fn max_row_sum(matrix: &Matrix) -> f64 {
    matrix
        .iter()
        .map(|row| row.iter().sum::<f64>())
        .fold(0.0, f64::max)
}

/// Divide every row by its own sum.
///
/// Rows summing to zero are returned unchanged. Signed data has no
/// meaningful row sum and is refused with [`TileError::SignModeConflict`].
pub fn row_sum_normalize(matrix: &Matrix) -> TileResult<Matrix> {
    if matrix.iter().flatten().any(|v| *v < 0.0) {
        return Err(TileError::SignModeConflict);
    }

    Ok(matrix
        .iter()
        .map(|row| {
            let sum: f64 = row.iter().sum();
            if sum == 0.0 {
                row.clone()
            } else {
                row.iter().map(|v| v / sum).collect()
            }
        })
        .collect())
}

/// Per-channel series across rows, for line rendering
pub fn channel_series(matrix: &Matrix) -> Vec<Vec<f64>> {
    let channels = matrix.first().map_or(0, |row| row.len());
    (0..channels)
        .map(|i| matrix.iter().map(|row| row[i]).collect())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueScaling {
    Linear,
    Exponential,
}

impl fmt::Display for ValueScaling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueScaling::Linear => write!(f, "linear"),
            ValueScaling::Exponential => write!(f, "exponential"),
        }
    }
}

/// Value-scaling mode shared by every track drawing from one tileset.
///
/// Clones share the same state. The only automatic mutation is
/// [`SharedValueScaling::escalate_for_signed`]: once a tile with negative
/// values is seen under linear scaling, the mode becomes exponential for all
/// holders and stays that way until explicitly reset with `set`.
#[derive(Debug, Clone)]
pub struct SharedValueScaling {
    inner: Arc<RwLock<ValueScaling>>,
}

impl SharedValueScaling {
    pub fn new(initial: ValueScaling) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    pub fn get(&self) -> ValueScaling {
        *self.inner.read()
    }

    pub fn set(&self, scaling: ValueScaling) {
        *self.inner.write() = scaling;
    }

    /// Switch linear scaling to exponential. Returns whether the mode changed.
    pub fn escalate_for_signed(&self) -> bool {
        let mut scaling = self.inner.write();
        if *scaling == ValueScaling::Linear {
            *scaling = ValueScaling::Exponential;
            true
        } else {
            false
        }
    }
}

impl Default for SharedValueScaling {
    fn default() -> Self {
        Self::new(ValueScaling::Linear)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NormalizationMode {
    /// Each row divided by its own sum
    RowSum,
    /// Rows untouched; the global max row sum sets the shared scale
    Raw,
    /// Rows sorted for stacked rendering, optionally row-sum normalized first
    Sorted { order: SortOrder, normalize: bool },
}

/// One segment of a sorted, stacked row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StackedValue {
    pub value: f64,
    /// Channel this value came from before sorting
    pub channel: usize,
    /// Sum of the values stacked below this one
    pub offset: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum NormalizedTile {
    RowSum { matrix: Matrix },
    Raw { matrix: Matrix, max_row_sum: f64 },
    Sorted { rows: Vec<Vec<StackedValue>>, max_row_sum: f64 },
}

/// Sort each row, keeping every value paired with its original channel.
///
/// The sort is stable, so equal values stay in channel order and each keeps
/// its own channel.
pub fn sort_rows(matrix: &Matrix, order: SortOrder) -> Vec<Vec<StackedValue>> {
    matrix
        .iter()
        .map(|row| {
            let mut pairs: Vec<(f64, usize)> = row.iter().copied().zip(0..).collect();
            match order {
                SortOrder::Ascending => pairs.sort_by(|a, b| a.0.total_cmp(&b.0)),
                SortOrder::Descending => pairs.sort_by(|a, b| b.0.total_cmp(&a.0)),
            }

            let mut offset = 0.0;
            pairs
                .into_iter()
                .map(|(value, channel)| {
                    let stacked = StackedValue { value, channel, offset };
                    offset += value;
                    stacked
                })
                .collect()
        })
        .collect()
}

/// A tile after unflattening, with its statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedTile {
    pub id: TileId,
    pub shape: [usize; 2],
    pub matrix: Matrix,
    pub stats: TileStats,
}

impl ProcessedTile {
    pub fn has_negative(&self) -> bool {
        self.stats.min_value.is_some()
    }
}

/// Turns tile payloads into matrices and normalized forms.
///
/// Holds a handle to the shared value-scaling mode and escalates it when a
/// signed tile shows up.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    scaling: SharedValueScaling,
}

impl Normalizer {
    pub fn new(scaling: SharedValueScaling) -> Self {
        Self { scaling }
    }

    pub fn scaling(&self) -> &SharedValueScaling {
        &self.scaling
    }

    fn note_signed(&self, id: &TileId) {
        if self.scaling.escalate_for_signed() {
            log::warn!(
                "Negative values present in tile {}. Switching value scaling to exponential.",
                id
            );
        }
    }

    pub fn process(&self, payload: &TilePayload) -> TileResult<ProcessedTile> {
        let id = payload.tile_id()?;
        let matrix = unflatten(&payload.dense, payload.shape)?;

        if payload.dense.iter().any(|v| *v < 0.0) {
            self.note_signed(&id);
        }

        let stats = find_max_and_min(&matrix);
        Ok(ProcessedTile {
            id,
            shape: payload.shape,
            matrix,
            stats,
        })
    }

    /// Apply a normalization mode.
    ///
    /// Sum normalization of signed data falls back to the raw rows; the
    /// shared scaling is escalated so the renderer switches scales.
    pub fn normalize(&self, tile: &ProcessedTile, mode: NormalizationMode) -> NormalizedTile {
        match mode {
            NormalizationMode::RowSum => match row_sum_normalize(&tile.matrix) {
                Ok(matrix) => NormalizedTile::RowSum { matrix },
                Err(_) => {
                    self.note_signed(&tile.id);
                    NormalizedTile::Raw {
                        matrix: tile.matrix.clone(),
                        max_row_sum: max_row_sum(&tile.matrix),
                    }
                }
            },
            NormalizationMode::Raw => NormalizedTile::Raw {
                matrix: tile.matrix.clone(),
                max_row_sum: max_row_sum(&tile.matrix),
            },
            NormalizationMode::Sorted { order, normalize } => {
                let matrix = if normalize {
                    row_sum_normalize(&tile.matrix).unwrap_or_else(|_| {
                        self.note_signed(&tile.id);
                        tile.matrix.clone()
                    })
                } else {
                    tile.matrix.clone()
                };
                NormalizedTile::Sorted {
                    max_row_sum: max_row_sum(&matrix),
                    rows: sort_rows(&matrix, order),
                }
            }
        }
    }
}

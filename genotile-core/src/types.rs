use serde::{Deserialize, Serialize};
use std::fmt;

/// Position in the flattened absolute-genome coordinate space.
///
/// Kept as `f64` because tile widths at deep zoom are fractional and search
/// windows may extend before the start of the genome.
pub type GenomicPos = f64;
pub type ZoomLevel = u32;
pub type TileIndex = u64;

/// Which viewport axis a range or tile index belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
        }
    }
}

/// An absolute `[start, end]` pair.
///
/// Nothing here enforces `start <= end`; use [`GenomicRange::normalized`]
/// where ordering matters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenomicRange {
    pub start: GenomicPos,
    pub end: GenomicPos,
}

impl GenomicRange {
    pub fn new(start: GenomicPos, end: GenomicPos) -> Self {
        Self { start, end }
    }

    /// Signed span, negative when the range is reversed
    pub fn width(&self) -> GenomicPos {
        self.end - self.start
    }

    pub fn normalized(self) -> Self {
        if self.start > self.end {
            Self::new(self.end, self.start)
        } else {
            self
        }
    }

    pub fn center(&self) -> GenomicPos {
        (self.start + self.end) / 2.0
    }

    /// Grow symmetrically by `amount` in total
    pub fn expand(self, amount: GenomicPos) -> Self {
        Self::new(self.start - amount / 2.0, self.end + amount / 2.0)
    }

    pub fn shift(self, start_delta: GenomicPos, end_delta: GenomicPos) -> Self {
        Self::new(self.start + start_delta, self.end + end_delta)
    }

    pub fn clamp(self, min: GenomicPos, max: GenomicPos) -> Option<Self> {
        let start = self.start.max(min);
        let end = self.end.min(max);
        if start > end {
            None
        } else {
            Some(Self::new(start, end))
        }
    }

    pub fn overlaps(&self, other: &GenomicRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl From<(GenomicPos, GenomicPos)> for GenomicRange {
    fn from((start, end): (GenomicPos, GenomicPos)) -> Self {
        Self::new(start, end)
    }
}

impl fmt::Display for GenomicRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_swaps_reversed() {
        let r = GenomicRange::new(10.0, 2.0).normalized();
        assert_eq!(r, GenomicRange::new(2.0, 10.0));
        assert_eq!(r.width(), 8.0);
    }

    #[test]
    fn test_expand_is_symmetric() {
        let r = GenomicRange::new(100.0, 200.0).expand(50.0);
        assert_eq!(r, GenomicRange::new(75.0, 225.0));
        assert_eq!(r.center(), 150.0);
    }

    #[test]
    fn test_clamp() {
        let r = GenomicRange::new(-5.0, 50.0);
        assert_eq!(r.clamp(0.0, 20.0), Some(GenomicRange::new(0.0, 20.0)));
        assert_eq!(GenomicRange::new(30.0, 40.0).clamp(0.0, 20.0), None);
    }
}

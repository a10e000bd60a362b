//! Chromosome index: name to offset/length lookup in the flattened
//! absolute-genome coordinate space.
//!
//! Built once from tileset metadata (usually a `chrom.sizes` file) and
//! immutable afterwards.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::GenomicPos;

#[derive(Debug, Error)]
pub enum ChromSizesError {
    #[error("Invalid chrom.sizes line {line}: expected 'name<TAB>length', got '{content}'")]
    InvalidLine { line: usize, content: String },
    #[error("Invalid chromosome length on line {line}: {value}")]
    InvalidLength { line: usize, value: String },
    #[error("Duplicate chromosome name: {0}")]
    DuplicateName(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromInfo {
    pub id: usize,
    pub name: String,
    pub length: u64,
    pub offset: u64, // absolute start
}

impl ChromInfo {
    pub fn start(&self) -> GenomicPos {
        self.offset as GenomicPos
    }

    pub fn end(&self) -> GenomicPos {
        (self.offset + self.length) as GenomicPos
    }
}

/// Result of mapping an absolute coordinate back onto a chromosome.
///
/// `overflow` is non-zero when the coordinate lies outside the genome: negative
/// before the first chromosome, positive past the end of the last one.
#[derive(Debug, Clone, PartialEq)]
pub struct ChromPosition<'a> {
    pub chrom: &'a ChromInfo,
    pub position: i64,
    pub overflow: i64,
}

/// Serialized form of one index entry; offsets are always recomputed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromSize {
    pub name: String,
    pub length: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ChromSize>", into = "Vec<ChromSize>")]
pub struct ChromosomeIndex {
    chroms: Vec<ChromInfo>,
    total_length: u64,
    by_name: HashMap<String, usize>,
}

impl TryFrom<Vec<ChromSize>> for ChromosomeIndex {
    type Error = ChromSizesError;

    fn try_from(sizes: Vec<ChromSize>) -> Result<Self, Self::Error> {
        Self::from_sizes(sizes.into_iter().map(|c| (c.name, c.length)))
    }
}

impl From<ChromosomeIndex> for Vec<ChromSize> {
    fn from(index: ChromosomeIndex) -> Self {
        index
            .chroms
            .into_iter()
            .map(|c| ChromSize { name: c.name, length: c.length })
            .collect()
    }
}

impl ChromosomeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from ordered `(name, length)` pairs, laying the
    /// chromosomes end to end.
    pub fn from_sizes<I, S>(sizes: I) -> Result<Self, ChromSizesError>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut index = Self::new();
        for (name, length) in sizes {
            index.push(name.into(), length)?;
        }
        Ok(index)
    }

    fn push(&mut self, name: String, length: u64) -> Result<usize, ChromSizesError> {
        if self.by_name.contains_key(&name) {
            return Err(ChromSizesError::DuplicateName(name));
        }

        let id = self.chroms.len();
        self.chroms.push(ChromInfo {
            id,
            name: name.clone(),
            length,
            offset: self.total_length,
        });
        self.by_name.insert(name, id);
        self.total_length = self.total_length.saturating_add(length);
        Ok(id)
    }

    /// Parse a two-column `chrom.sizes` table. Blank lines and lines starting
    /// with `#` are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ChromSizesError> {
        let mut index = Self::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = trimmed.split_whitespace().collect();
            if fields.len() < 2 {
                return Err(ChromSizesError::InvalidLine {
                    line: line_no + 1,
                    content: trimmed.to_string(),
                });
            }

            let length = fields[1].parse::<u64>().map_err(|_| ChromSizesError::InvalidLength {
                line: line_no + 1,
                value: fields[1].to_string(),
            })?;

            index.push(fields[0].to_string(), length)?;
        }

        Ok(index)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)
            .with_context(|| format!("Failed to open chrom sizes: {}", path.as_ref().display()))?;
        let index = Self::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse chrom sizes: {}", path.as_ref().display()))?;
        log::debug!("Loaded {} chromosomes from {}", index.len(), path.as_ref().display());
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.chroms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chroms.is_empty()
    }

    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChromInfo> {
        self.chroms.iter()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ChromInfo> {
        self.by_name.get(name).and_then(|&id| self.chroms.get(id))
    }

    pub fn offset(&self, name: &str) -> Option<u64> {
        self.get(name).map(|c| c.offset)
    }

    pub fn length(&self, name: &str) -> Option<u64> {
        self.get(name).map(|c| c.length)
    }

    /// Map an absolute coordinate to `(chromosome, position, overflow)`.
    ///
    /// Coordinates before the genome clamp to position 1 of the first
    /// chromosome; coordinates past the end clamp to the last chromosome's
    /// length. The distance clamped away is reported in `overflow`.
    pub fn abs_to_chr(&self, abs: GenomicPos) -> Option<ChromPosition<'_>> {
        if self.chroms.is_empty() || abs.is_nan() {
            return None;
        }

        // last chromosome whose offset is <= abs
        let insert = self.chroms.partition_point(|c| (c.offset as GenomicPos) <= abs);
        let idx = insert.saturating_sub(1);
        let chrom = &self.chroms[idx];

        // float-to-int casts saturate; the arithmetic below must too
        let mut position = (abs - chrom.offset as GenomicPos).floor() as i64;
        let mut overflow = 0;

        if position < 0 {
            overflow = position.saturating_sub(1);
            position = 1;
        }

        let last_length = i64::try_from(chrom.length).unwrap_or(i64::MAX);
        if idx == self.chroms.len() - 1 && position > last_length {
            overflow = position.saturating_sub(last_length);
            position = last_length;
        }

        Some(ChromPosition { chrom, position, overflow })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn index() -> ChromosomeIndex {
        ChromosomeIndex::from_sizes(vec![("chr1", 1000), ("chr2", 500), ("chr3", 200)]).unwrap()
    }

    #[test]
    fn test_offsets_are_contiguous() {
        let idx = index();
        assert_eq!(idx.offset("chr1"), Some(0));
        assert_eq!(idx.offset("chr2"), Some(1000));
        assert_eq!(idx.offset("chr3"), Some(1500));
        assert_eq!(idx.total_length(), 1700);

        let mut prev_end = 0;
        for chrom in idx.iter() {
            assert_eq!(chrom.offset, prev_end);
            prev_end = chrom.offset + chrom.length;
        }
    }

    #[test]
    fn test_unknown_name_is_none() {
        let idx = index();
        assert!(idx.get("chrX").is_none());
        assert!(!idx.contains("chrX"));
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = ChromosomeIndex::from_sizes(vec![("chr1", 10), ("chr1", 20)]).unwrap_err();
        assert!(matches!(err, ChromSizesError::DuplicateName(_)));
    }

    #[test]
    fn test_parse_chrom_sizes() {
        let text = "# hg-like\nchr1\t1000\n\nchr2\t500\nchrM 16\n";
        let idx = ChromosomeIndex::from_reader(Cursor::new(text)).unwrap();
        assert_eq!(idx.len(), 3);
        assert_eq!(idx.offset("chrM"), Some(1500));
    }

    #[test]
    fn test_parse_chrom_sizes_bad_length() {
        let err = ChromosomeIndex::from_reader(Cursor::new("chr1\tabc\n")).unwrap_err();
        assert!(matches!(err, ChromSizesError::InvalidLength { line: 1, .. }));
    }

    #[test]
    fn test_abs_to_chr() {
        let idx = index();

        let p = idx.abs_to_chr(1250.0).unwrap();
        assert_eq!(p.chrom.name, "chr2");
        assert_eq!(p.position, 250);
        assert_eq!(p.overflow, 0);

        let p = idx.abs_to_chr(1000.0).unwrap();
        assert_eq!(p.chrom.name, "chr2");
        assert_eq!(p.position, 0);
    }

    #[test]
    fn test_abs_to_chr_outside_genome() {
        let idx = index();

        let before = idx.abs_to_chr(-10.0).unwrap();
        assert_eq!(before.chrom.name, "chr1");
        assert_eq!(before.position, 1);
        assert_eq!(before.overflow, -11);

        let after = idx.abs_to_chr(1750.0).unwrap();
        assert_eq!(after.chrom.name, "chr3");
        assert_eq!(after.position, 200);
        assert_eq!(after.overflow, 50);
    }

    #[test]
    fn test_serde_rebuilds_offsets() {
        let json = serde_json::to_string(&index()).unwrap();
        assert_eq!(
            json,
            r#"[{"name":"chr1","length":1000},{"name":"chr2","length":500},{"name":"chr3","length":200}]"#
        );

        let idx: ChromosomeIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(idx, index());
        assert_eq!(idx.offset("chr3"), Some(1500));

        let dup = serde_json::from_str::<ChromosomeIndex>(r#"[{"name":"a","length":1},{"name":"a","length":2}]"#);
        assert!(dup.is_err());
    }

    #[test]
    fn test_abs_to_chr_extreme_coordinates() {
        let idx = index();

        let before = idx.abs_to_chr(-1e300).unwrap();
        assert_eq!(before.chrom.name, "chr1");
        assert_eq!(before.position, 1);
        assert_eq!(before.overflow, i64::MIN);

        let after = idx.abs_to_chr(1e300).unwrap();
        assert_eq!(after.chrom.name, "chr3");
        assert_eq!(after.position, 200);
        assert_eq!(after.overflow, i64::MAX - 200);

        assert!(idx.abs_to_chr(f64::NAN).is_none());
    }
}

//! Free-text locus search
//!
//! Turns queries such as `chr1:1,000-2,000`, `chr3-chr5`,
//! `chr1:100-200 & chr2:500-600` or `chr1:100-200 [offset 5,10]` into
//! absolute genomic ranges, and formats ranges back into that text form.
//!
//! Malformed input never fails: unresolvable parts come back as `None`.

use regex::Regex;
use thiserror::Error;

use crate::chrom::{ChromPosition, ChromosomeIndex};
use crate::config::{SearchConfig, DEFAULT_POINT_RADIUS};
use crate::types::{GenomicPos, GenomicRange};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid offset pattern: {0}")]
    Regex(#[from] regex::Error),
}

/// One side of a locus query
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLocus {
    /// Chromosome the position is relative to, if any
    pub chromosome: Option<String>,
    /// Position within the chromosome (or absolute, without a chromosome);
    /// `None` when the number did not parse
    pub chr_pos: Option<GenomicPos>,
    /// Absolute genome coordinate; `None` on lookup failure
    pub absolute: Option<GenomicPos>,
}

/// Per-axis `[start, end]` nudges from an `[offset a,b:c,d]` suffix
pub type AxisOffsets = [[GenomicPos; 2]; 2];

pub struct SearchField {
    chroms: ChromosomeIndex,
    point_radius: GenomicPos,
    offset_re: Regex,
}

/// Parse a number the way free text is typed: surrounding whitespace and
/// thousands separators are ignored, an empty string is zero.
fn parse_number(text: &str) -> Option<GenomicPos> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Some(0.0);
    }
    cleaned.parse::<GenomicPos>().ok().filter(|v| v.is_finite())
}

/// Split a range term on `-`, keeping a leading minus on the first token
fn split_range(term: &str) -> Vec<String> {
    let (negative, rest) = match term.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, term),
    };

    let mut parts: Vec<String> = rest
        .split('-')
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    if negative {
        if let Some(first) = parts.first_mut() {
            first.insert(0, '-');
        }
    }
    parts
}

/// Decimal with `,` every three digits
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

impl SearchField {
    pub fn new(chroms: ChromosomeIndex) -> Result<Self, SearchError> {
        Self::with_radius(chroms, DEFAULT_POINT_RADIUS)
    }

    pub fn with_config(chroms: ChromosomeIndex, config: &SearchConfig) -> Result<Self, SearchError> {
        Self::with_radius(chroms, config.point_radius)
    }

    pub fn with_radius(chroms: ChromosomeIndex, point_radius: GenomicPos) -> Result<Self, SearchError> {
        Ok(Self {
            chroms,
            point_radius,
            offset_re: Regex::new(r"\[offset (.+?)\]")?,
        })
    }

    pub fn chroms(&self) -> &ChromosomeIndex {
        &self.chroms
    }

    pub fn point_radius(&self) -> GenomicPos {
        self.point_radius
    }

    /// Parse a single locus.
    ///
    /// `prev_chr` is the chromosome of the other side of a range. It is used
    /// for bare numbers, and makes a bare chromosome name mean "to the end
    /// of that chromosome" instead of its start. An unknown chromosome gives
    /// `None` for both the chromosome and the absolute position.
    pub fn parse_position(&self, text: &str, prev_chr: Option<&str>) -> ParsedLocus {
        let text = text.trim();

        let (chromosome, chr_pos) = match text.split_once(':') {
            Some((chr, pos)) => {
                let pos = pos.split(':').next().unwrap_or_default();
                (Some(chr.trim().to_string()), parse_number(pos))
            }
            None => match self.chroms.get(text) {
                Some(chrom) => {
                    let pos = if prev_chr.is_some() { chrom.length as GenomicPos } else { 0.0 };
                    (Some(chrom.name.clone()), Some(pos))
                }
                None => (prev_chr.map(str::to_string), parse_number(text)),
            },
        };

        // an unknown chromosome name resolves to nothing at all
        let chromosome = match chromosome {
            Some(name) if !self.chroms.contains(&name) => {
                return ParsedLocus { chromosome: None, chr_pos, absolute: None };
            }
            other => other,
        };

        let absolute = match (&chromosome, chr_pos) {
            (_, None) => None,
            (None, Some(pos)) => Some(pos),
            (Some(name), Some(pos)) => self.chroms.offset(name).map(|offset| offset as GenomicPos + pos),
        };

        ParsedLocus { chromosome, chr_pos, absolute }
    }

    /// Resolve one axis term to a range with `start <= end`.
    ///
    /// Two-sided terms are evaluated twice, once with the left side as
    /// context for the right and once the other way round; the candidate
    /// with the larger signed span wins, the left-to-right one on ties.
    pub fn search_range(&self, term: &str) -> Option<GenomicRange> {
        let term = term.trim();
        if term.is_empty() {
            return None;
        }

        let parts = split_range(term);
        let range = match parts.as_slice() {
            [] => None,
            [single] => self.single_range(single),
            [left, right, ..] => self.two_sided_range(left, right),
        };

        range.map(GenomicRange::normalized)
    }

    fn single_range(&self, term: &str) -> Option<GenomicRange> {
        if let Some(chrom) = self.chroms.get(term) {
            return Some(GenomicRange::new(chrom.start(), chrom.end()));
        }

        let center = self.parse_position(term, None).absolute?;
        Some(GenomicRange::new(center - self.point_radius, center + self.point_radius))
    }

    fn two_sided_range(&self, left: &str, right: &str) -> Option<GenomicRange> {
        let l = self.parse_position(left, None);
        let r = self.parse_position(right, l.chromosome.as_deref());
        let forward = l.absolute.zip(r.absolute).map(GenomicRange::from);

        let mut r = self.parse_position(right, None);
        let l = self.parse_position(left, r.chromosome.as_deref());
        if r.chromosome.is_none() && l.chromosome.is_some() {
            // "chr1:1000-2000": the bare right side borrows the left's chromosome
            r = self.parse_position(right, l.chromosome.as_deref());
        }
        let backward = r.absolute.zip(l.absolute).map(GenomicRange::from);

        match (forward, backward) {
            (Some(f), Some(b)) => Some(if b.width() > f.width() { b } else { f }),
            (f, b) => f.or(b),
        }
    }

    /// Parse the body of an offset suffix: `a,b` or `a,b:c,d`.
    ///
    /// Missing or unparseable numbers count as zero.
    pub fn parse_offset(&self, text: &str) -> AxisOffsets {
        let pair = |part: Option<&str>| -> [GenomicPos; 2] {
            let mut values = [0.0; 2];
            if let Some(part) = part {
                for (slot, token) in values.iter_mut().zip(part.split(',')) {
                    *slot = parse_number(token).unwrap_or_else(|| {
                        log::warn!("Ignoring malformed offset value {:?}", token);
                        0.0
                    });
                }
            }
            values
        };

        let mut axes = text.split(':');
        [pair(axes.next()), pair(axes.next())]
    }

    /// Widen the narrower range symmetrically so both have the same width
    pub fn match_ranges_to_larger(&self, first: GenomicRange, second: GenomicRange) -> (GenomicRange, GenomicRange) {
        let difference = second.width() - first.width();
        if difference > 0.0 {
            (first.expand(difference), second)
        } else {
            (first, second.expand(-difference))
        }
    }

    /// Parse a full query into ranges for the x and y axes
    pub fn search(&self, query: &str) -> (Option<GenomicRange>, Option<GenomicRange>) {
        let mut text = query.trim().to_string();

        let mut offsets: AxisOffsets = [[0.0; 2]; 2];
        if let Some(captures) = self.offset_re.captures(query.trim()) {
            if let (Some(whole), Some(body)) = (captures.get(0), captures.get(1)) {
                offsets = self.parse_offset(body.as_str());
                text.replace_range(whole.range(), "");
            }
        }

        let (mut x, mut y) = match text.split_once(" & ") {
            Some((first, second)) => {
                let first_term = first.trim().split(' ').next().unwrap_or_default();
                let second_term = second.trim().split(' ').next().unwrap_or_default();
                (self.search_range(first_term), self.search_range(second_term))
            }
            None => (self.search_range(&text), None),
        };

        if let (Some(first), Some(second)) = (x, y) {
            let (first, second) = self.match_ranges_to_larger(first, second);
            x = Some(first);
            y = Some(second);
        }

        let x = x.map(|r| r.shift(offsets[0][0], offsets[0][1]));
        let y = y.map(|r| r.shift(offsets[1][0], offsets[1][1]));
        (x, y)
    }

    fn locus_text(start: &ChromPosition<'_>, end: &ChromPosition<'_>) -> String {
        if start.chrom.name == end.chrom.name {
            format!(
                "{}:{}-{}",
                start.chrom.name,
                group_thousands(start.position),
                group_thousands(end.position)
            )
        } else {
            format!(
                "{}:{}-{}:{}",
                start.chrom.name,
                group_thousands(start.position),
                end.chrom.name,
                group_thousands(end.position)
            )
        }
    }

    /// Format ranges back into query text that [`SearchField::search`] reads.
    ///
    /// Bounds outside the genome are clamped and the remainder written as an
    /// `[offset ...]` suffix. `None` when the chromosome index is empty.
    pub fn position_text(&self, x: &GenomicRange, y: Option<&GenomicRange>) -> Option<String> {
        let x1 = self.chroms.abs_to_chr(x.start)?;
        let x2 = self.chroms.abs_to_chr(x.end.ceil())?;
        let mut text = Self::locus_text(&x1, &x2);
        let mut overflow = vec![x1.overflow, x2.overflow];

        if let Some(y) = y {
            let y1 = self.chroms.abs_to_chr(y.start)?;
            let y2 = self.chroms.abs_to_chr(y.end.ceil())?;
            text.push_str(" & ");
            text.push_str(&Self::locus_text(&y1, &y2));
            overflow.extend([y1.overflow, y2.overflow]);
        }

        if overflow.iter().any(|o| *o != 0) {
            let pairs: Vec<String> = overflow.chunks(2).map(|p| format!("{},{}", p[0], p[1])).collect();
            text.push_str(&format!(" [offset {}]", pairs.join(":")));
        }

        Some(text)
    }
}

//! Search command implementation - resolve locus text to absolute ranges

use anyhow::Result;
use genotile_core::{GenomicRange, SearchField};
use serde::Serialize;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct SearchOutput {
    query: String,
    x: Option<GenomicRange>,
    y: Option<GenomicRange>,
    /// Canonical text for the resolved ranges
    text: Option<String>,
}

pub fn execute(config: &Config, query: String, chrom_sizes: Option<PathBuf>, radius: Option<f64>) -> Result<()> {
    let chroms = super::load_chroms(config, chrom_sizes)?;

    let mut search_config = config.search.clone();
    if let Some(radius) = radius {
        if !radius.is_finite() || radius < 0.0 {
            return Err(CliError::validation(format!("--radius must be a non-negative number, got {}", radius)).into());
        }
        search_config.point_radius = radius;
    }

    let field = SearchField::with_config(chroms, &search_config)?;
    let output = resolve(&field, query)?;

    if config.json_output() {
        super::print_json(&output)?;
    } else {
        print_range("x", output.x);
        if output.y.is_some() {
            print_range("y", output.y);
        }
        if let Some(text) = &output.text {
            println!("text\t{}", text);
        }
    }

    Ok(())
}

fn resolve(field: &SearchField, query: String) -> Result<SearchOutput, CliError> {
    log::debug!("Searching for {:?}", query);
    let (x, y) = field.search(&query);
    if x.is_none() && y.is_none() {
        return Err(CliError::no_match(query));
    }

    let text = x.and_then(|x| field.position_text(&x, y.as_ref()));
    Ok(SearchOutput { query, x, y, text })
}

fn print_range(axis: &str, range: Option<GenomicRange>) {
    match range {
        Some(r) => println!("{}\t{}\t{}", axis, r.start, r.end),
        None => println!("{}\t-", axis),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genotile_core::ChromosomeIndex;

    fn field() -> SearchField {
        let chroms = ChromosomeIndex::from_sizes(vec![("chr1", 1_000_000u64), ("chr2", 500_000)]).unwrap();
        SearchField::with_radius(chroms, 1000.0).unwrap()
    }

    #[test]
    fn test_resolve_two_axes() {
        let output = resolve(&field(), "chr1:100-300 & chr2:10-20".to_string()).unwrap();
        assert_eq!(output.x, Some(GenomicRange::new(100.0, 300.0)));
        assert_eq!(output.y.unwrap().width(), 200.0);
        // y widened to 200 around chr2:15 spills back into chr1
        assert_eq!(output.text.as_deref(), Some("chr1:100-300 & chr1:999,915-chr2:115"));
    }

    #[test]
    fn test_resolve_no_match() {
        let err = resolve(&field(), "chrQ".to_string()).unwrap_err();
        assert!(matches!(err, CliError::NoMatch { .. }));
    }
}

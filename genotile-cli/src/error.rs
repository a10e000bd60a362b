//! Error handling for the genotile CLI

use std::path::PathBuf;
use thiserror::Error;

use genotile_core::{ChromSizesError, TileError};

/// Main error type for genotile CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Input/Output error: {message}")]
    Io { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Parsing error in {file}: {message}")]
    Parse { file: String, message: String },

    #[error("Tile error: {0}")]
    Tile(#[from] TileError),

    #[error("No match for query: {query}")]
    NoMatch { query: String },

    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl CliError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io { message: message.into() }
    }

    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    pub fn parse<S: Into<String>>(file: S, message: S) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn no_match<S: Into<String>>(query: S) -> Self {
        Self::NoMatch { query: query.into() }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into() }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<ChromSizesError> for CliError {
    fn from(err: ChromSizesError) -> Self {
        Self::parse("chrom.sizes".to_string(), err.to_string())
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Provide helpful error messages and suggestions
pub fn format_error_with_suggestions(error: &CliError) -> String {
    let mut message = error.to_string();

    match error {
        CliError::FileNotFound { path } => {
            message.push_str(&format!(
                "\n\nSuggestions:\n\
                 • Check that the file path is correct: {}\n\
                 • Ensure you have read permissions for the file",
                path.display()
            ));
        }

        CliError::Config { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Check your genotile.toml configuration file\n\
                 • Use 'genotile config --example' to generate a sample configuration"
            );
        }

        CliError::Tile(TileError::OutOfRangeZoom { max_zoom, .. }) => {
            message.push_str(&format!(
                "\n\nSuggestions:\n\
                 • Use a zoom level between 0 and {}\n\
                 • Omit --zoom to pick one from the visible range",
                max_zoom
            ));
        }

        CliError::Tile(TileError::AxisMismatch { expected, .. }) => {
            message.push_str(&format!(
                "\n\nSuggestions:\n\
                 • This tileset has {} axis(es); pass --x, and --y for matrices",
                expected
            ));
        }

        CliError::NoMatch { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Check the chromosome names against your chrom.sizes file\n\
                 • Use forms like 'chr1', 'chr1:1,000-2,000' or 'chr1-chr3'"
            );
        }

        _ => {}
    }

    message
}

/// Print error with helpful suggestions and exit
pub fn print_error_and_exit(error: &CliError) -> ! {
    eprintln!("Error: {}", format_error_with_suggestions(error));
    std::process::exit(1);
}

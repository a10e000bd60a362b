//! Configuration handling for the genotile CLI
//!
//! Supports loading configuration from genotile.toml files with CLI argument overrides.

use anyhow::{Context, Result};
use genotile_core::config::{EngineConfig, SearchConfig, TileConfig, ZoomConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub tiles: TileConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub zoom: ZoomConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default chrom.sizes file for search and locate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrom_sizes: Option<PathBuf>,

    /// Output format: "text" or "json"
    #[serde(default = "default_output")]
    pub output: String,

    /// Track width in pixels used for automatic zoom selection
    #[serde(default = "default_track_width")]
    pub track_width: f64,
}

fn default_output() -> String { "text".to_string() }
fn default_track_width() -> f64 { 768.0 }

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            chrom_sizes: None,
            output: default_output(),
            track_width: default_track_width(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from("genotile.toml");
                if default_path.exists() {
                    log::info!("Loading configuration from: genotile.toml");
                    Self::load_from_file(&default_path)?
                } else {
                    log::debug!("Using default configuration");
                    Self::default()
                }
            }
        };

        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// Generate example configuration file content
    pub fn example_toml() -> Result<String> {
        toml::to_string_pretty(&Self::default()).context("Failed to serialize default configuration")
    }

    /// Library settings carried by this configuration
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            tiles: self.tiles.clone(),
            search: self.search.clone(),
            zoom: self.zoom.clone(),
        }
    }

    pub fn json_output(&self) -> bool {
        self.general.output.eq_ignore_ascii_case("json")
    }
}

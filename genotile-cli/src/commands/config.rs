//! Config command implementation - print or write configuration files

use anyhow::Result;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::CliError;

pub fn execute(config: &Config, example: bool, output: Option<PathBuf>) -> Result<()> {
    if example {
        print!("{}", Config::example_toml()?);
        return Ok(());
    }

    match output {
        Some(path) => {
            if path.is_dir() {
                return Err(CliError::config(format!("{} is a directory", path.display())).into());
            }
            config.save_to_file(&path)?;
            log::info!("Configuration written to: {}", path.display());
        }
        None => {
            let content = toml::to_string_pretty(config).map_err(|e| CliError::config(e.to_string()))?;
            print!("{}", content);
        }
    }

    Ok(())
}

//! Configuration file parsing for nevent.toml.

use nevent::HostConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file names searched for, in order.
const CONFIG_NAMES: &[&str] = &["nevent.toml", ".neventrc.toml"];

/// Main configuration structure.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,

    /// Emitter host settings
    #[serde(default)]
    pub host: HostConfig,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
pub struct LogConfig {
    /// Default filter directive, extended by `RUST_LOG`
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// Load configuration from a file or search for default config files.
///
/// An explicit `path` must exist. Without one, the current directory and its
/// parents are searched; if nothing is found the defaults apply.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = path {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        return parse_config_file(path);
    }

    match std::env::current_dir()
        .ok()
        .and_then(|cwd| find_config_file(&cwd))
    {
        Some(path) => parse_config_file(&path),
        None => Ok(Config::default()),
    }
}

fn parse_config_file(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))
}

/// Search `start` and its parents for a configuration file.
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        for name in CONFIG_NAMES {
            let path = current.join(name);
            if path.exists() {
                return Some(path);
            }
        }
        dir = current.parent();
    }
    None
}

//! TOML configuration.
//!
//! Settings load from `~/.recaller.toml`. A missing file yields the
//! defaults; a malformed file is an error rather than a silent fallback.
//! Every field has a serde default so partial files work.

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::Deserialize;

pub const CONFIG_FILE_NAME: &str = ".recaller.toml";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub filesystem: FilesystemConfig,
    /// Suppress progress output regardless of TTY detection.
    #[serde(default)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Substring matching anywhere in the command, rather than prefix-only.
    #[serde(default = "default_enable_fuzzing")]
    pub enable_fuzzing: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilesystemConfig {
    /// Filesystem indexing is opt-in.
    #[serde(default)]
    pub enabled: bool,
    /// Hard cap on the number of indexed entries.
    #[serde(default = "default_max_indexed_files")]
    pub max_indexed_files: usize,
    /// Bloom filter bit count.
    #[serde(default = "default_bloom_filter_size")]
    pub bloom_filter_size: u32,
    /// Bloom filter hash count.
    #[serde(default = "default_bloom_filter_hashes")]
    pub bloom_filter_hashes: u32,
    /// Skip rules for the walker: basename globs or path substrings.
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enable_fuzzing: default_enable_fuzzing(),
        }
    }
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_indexed_files: default_max_indexed_files(),
            bloom_filter_size: default_bloom_filter_size(),
            bloom_filter_hashes: default_bloom_filter_hashes(),
            ignore_patterns: default_ignore_patterns(),
        }
    }
}

fn default_enable_fuzzing() -> bool {
    true
}

fn default_max_indexed_files() -> usize {
    50_000
}

fn default_bloom_filter_size() -> u32 {
    1_000_000
}

fn default_bloom_filter_hashes() -> u32 {
    5
}

fn default_ignore_patterns() -> Vec<String> {
    [
        "node_modules",
        ".git",
        "*.tmp",
        "*.log",
        ".DS_Store",
        "target",
        "build",
        "dist",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Path of the user configuration file, `~/.recaller.toml`.
pub fn config_path() -> Result<PathBuf> {
    let base = BaseDirs::new().context("failed to determine home directory")?;
    Ok(base.home_dir().join(CONFIG_FILE_NAME))
}

/// Load the configuration, falling back to defaults when no file exists.
pub fn load_config() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.filesystem.max_indexed_files == 0 {
        anyhow::bail!("filesystem.max_indexed_files must be > 0");
    }
    if config.filesystem.bloom_filter_size == 0 {
        anyhow::bail!("filesystem.bloom_filter_size must be > 0");
    }
    if config.filesystem.bloom_filter_hashes == 0 {
        anyhow::bail!("filesystem.bloom_filter_hashes must be > 0");
    }
    Ok(())
}

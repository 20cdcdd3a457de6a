use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::errors::SearchError;

pub const DEFAULT_TOP_RESULTS: usize = 5;
pub const DEFAULT_CHUNK_SIZE: usize = 1024;
pub const DEFAULT_CHUNK_OVERLAP: usize = 256;

/// Top-level configuration file layout. Sections unrelated to this crate are
/// ignored so the file can be shared with the rest of the agent stack.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source_processor: SourceProcessorConfig,
}

/// The `source_processor` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceProcessorConfig {
    #[serde(default = "default_top_results")]
    pub top_results: usize,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for SourceProcessorConfig {
    fn default() -> Self {
        SourceProcessorConfig {
            top_results: DEFAULT_TOP_RESULTS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

fn default_top_results() -> usize {
    DEFAULT_TOP_RESULTS
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

impl Config {
    /// Load configuration from a YAML file. A missing file is not an error;
    /// it yields the built-in defaults.
    pub fn load(path: &Path) -> Result<Config, SearchError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let raw = fs::read_to_string(path)
            .map_err(|e| SearchError::Config(format!("failed to read {}: {e}", path.display())))?;
        serde_yaml::from_str(&raw)
            .map_err(|e| SearchError::Config(format!("failed to parse {}: {e}", path.display())))
    }
}

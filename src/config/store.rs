//! Store, allow-list and pipeline configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::allowlist::DEFAULT_TRUSTED_DOMAINS;

/// Analysis store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Persist analyses and answer repeat lookups from the store
    pub enabled: bool,
    /// Directory holding the sled database
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            data_dir: super::app_dir(dirs::data_dir()),
        }
    }
}

/// Domains that are reported as trusted without analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AllowListConfig {
    pub domains: Vec<String>,
}

impl Default for AllowListConfig {
    fn default() -> Self {
        Self {
            domains: DEFAULT_TRUSTED_DOMAINS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

/// End-to-end pipeline guards
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Extracted legal text shorter than this is rejected before classification
    pub min_text_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { min_text_chars: 100 }
    }
}

//! URL gate configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Public registry of top-level domains, one uppercase name per line
pub const IANA_TLD_REGISTRY: &str = "https://data.iana.org/TLD/tlds-alpha-by-domain.txt";

/// URL validation and safety gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Where the TLD list is downloaded from
    pub tld_registry_url: String,
    /// Local TLD cache file (defaults to the platform cache dir)
    pub tld_cache_path: Option<PathBuf>,
    /// How long a cached TLD list counts as fresh (seconds)
    pub tld_cache_max_age_secs: u64,
    /// Timeout for the TLD registry download (seconds)
    pub tld_fetch_timeout_secs: u64,
    /// Timeout for hostname resolution (seconds)
    pub dns_timeout_secs: u64,
    /// Timeout for the HEAD reachability probe (seconds)
    pub head_timeout_secs: u64,
    /// Reject labels made of a single character repeated four or more times
    pub reject_repeated_labels: bool,
}

impl GateConfig {
    /// Resolved TLD cache location
    pub fn tld_cache_path(&self) -> PathBuf {
        self.tld_cache_path
            .clone()
            .unwrap_or_else(|| super::app_dir(dirs::cache_dir()).join("tld_cache.json"))
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            tld_registry_url: IANA_TLD_REGISTRY.to_string(),
            tld_cache_path: None,
            tld_cache_max_age_secs: 7 * 24 * 60 * 60, // one week
            tld_fetch_timeout_secs: 10,
            dns_timeout_secs: 5,
            head_timeout_secs: 5,
            reject_repeated_labels: true,
        }
    }
}

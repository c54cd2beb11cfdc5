//! Fetch and render configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::DEFAULT_USER_AGENT;

/// Plain HTTP fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Timeout for the site's own page (seconds)
    pub page_timeout_secs: u64,
    /// Timeout for each candidate legal page (seconds)
    pub candidate_timeout_secs: u64,
    /// Connection timeout (seconds)
    pub connect_timeout_secs: u64,
    /// Maximum response size (bytes)
    pub max_content_size: usize,
    /// Maximum redirects to follow on GET
    pub max_redirects: usize,
    /// User agent string
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_timeout_secs: 10,
            candidate_timeout_secs: 7,
            connect_timeout_secs: 5,
            max_content_size: 10 * 1024 * 1024, // 10 MB
            max_redirects: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Headless browser rendering, tried before plain HTTP when enabled
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Enable the render strategy
    pub enabled: bool,
    /// Chromium-compatible browser binary
    pub browser_path: PathBuf,
    /// Virtual time granted to page scripts before the DOM is dumped (milliseconds)
    pub settle_ms: u64,
    /// Hard limit for one render (seconds)
    pub timeout_secs: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            browser_path: PathBuf::from("chromium"),
            settle_ms: 2000,
            timeout_secs: 15,
        }
    }
}

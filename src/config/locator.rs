//! Legal document discovery configuration

use serde::{Deserialize, Serialize};

use crate::locate::{
    DEFAULT_FALLBACK_PATHS, DEFAULT_HEADING_KEYWORDS, DEFAULT_LEGAL_FRAGMENTS,
    DEFAULT_LINK_KEYWORDS,
};

/// Legal document locator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Pages with less visible text than this are never treated as legal documents
    pub min_document_chars: usize,
    /// Lines of context captured on each side of a keyword hit
    pub context_window: usize,
    /// Maximum candidate pages fetched per site
    pub max_candidates: usize,
    /// Keyword fragments that mark a line as legal text
    pub legal_fragments: Vec<String>,
    /// Keywords that mark a heading or title as legal
    pub heading_keywords: Vec<String>,
    /// Keywords that make an anchor a candidate legal link
    pub link_keywords: Vec<String>,
    /// Conventional paths probed when a page has no candidate links
    pub fallback_paths: Vec<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            min_document_chars: 600,
            context_window: 5,
            max_candidates: 8,
            legal_fragments: owned(DEFAULT_LEGAL_FRAGMENTS),
            heading_keywords: owned(DEFAULT_HEADING_KEYWORDS),
            link_keywords: owned(DEFAULT_LINK_KEYWORDS),
            fallback_paths: owned(DEFAULT_FALLBACK_PATHS),
        }
    }
}

//! Candidate legal links

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Anchors whose href or text mentions one of `keywords`, resolved against
/// `base`, http(s) only, deduplicated in document order.
pub fn candidate_links(document: &Html, base: &Url, keywords: &[String]) -> Vec<Url> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href").map(str::trim) else {
            continue;
        };
        let href_lower = href.to_lowercase();
        let text = anchor.text().collect::<String>().to_lowercase();

        let is_candidate = keywords
            .iter()
            .any(|k| href_lower.contains(k.as_str()) || text.contains(k.as_str()));
        if !is_candidate {
            continue;
        }

        if let Ok(url) = base.join(href) {
            if (url.scheme() == "http" || url.scheme() == "https")
                && seen.insert(url.as_str().to_string())
            {
                links.push(url);
            }
        }
    }

    links
}

/// Conventional legal paths on the origin of `base`
pub fn fallback_paths(base: &Url, paths: &[String]) -> Vec<Url> {
    paths.iter().filter_map(|path| base.join(path).ok()).collect()
}

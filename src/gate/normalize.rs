//! Canonical URL form used for store keys

use url::Url;

use super::hostname::with_default_scheme;

/// Query parameters that identify a campaign or visitor rather than a page
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "msclkid",
    "mc_cid",
    "mc_eid",
    "ref",
];

/// Canonical text form of a parsed URL.
///
/// Drops the fragment, a leading `www.`, a trailing slash on non-root paths
/// and tracking parameters; remaining parameters are sorted and the whole
/// string is lowercased. Two spellings of the same site map to one key.
pub fn normalize_url(url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_fragment(None);

    if let Some(host) = normalized.host_str().map(str::to_string) {
        if let Some(stripped) = host.strip_prefix("www.") {
            if let Err(e) = normalized.set_host(Some(stripped)) {
                tracing::warn!("Failed to strip www. from {}: {}", host, e);
            }
        }
    }

    let path = normalized.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        normalized.set_path(path.trim_end_matches('/'));
    }

    if let Some(query) = normalized.query().map(str::to_string) {
        let mut params: Vec<&str> = query
            .split('&')
            .filter(|p| !p.is_empty())
            .filter(|p| {
                let key = p.split('=').next().unwrap_or_default().to_ascii_lowercase();
                !TRACKING_PARAMS.contains(&key.as_str())
            })
            .collect();

        if params.is_empty() {
            normalized.set_query(None);
        } else {
            params.sort_unstable();
            normalized.set_query(Some(&params.join("&")));
        }
    }

    normalized.as_str().to_lowercase()
}

/// Canonical form of raw user input, before any validation.
///
/// Input that does not parse as a URL is keyed by its trimmed lowercase text.
pub fn normalize_input(raw: &str) -> String {
    let with_scheme = with_default_scheme(raw);
    match Url::parse(&with_scheme) {
        Ok(url) => normalize_url(&url),
        Err(_) => raw.trim().to_lowercase(),
    }
}

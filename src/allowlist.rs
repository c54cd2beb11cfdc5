//! Trusted domains that skip analysis

use std::collections::HashSet;

/// Well-known sites reported as trusted without fetching anything
pub const DEFAULT_TRUSTED_DOMAINS: &[&str] = &[
    "google.com",
    "facebook.com",
    "twitter.com",
    "linkedin.com",
    "youtube.com",
    "amazon.com",
    "microsoft.com",
    "apple.com",
    "openai.com",
    "github.com",
    "wikipedia.org",
    "reddit.com",
    "instagram.com",
    "paypal.com",
    "stackoverflow.com",
    "netflix.com",
    "dropbox.com",
    "mozilla.org",
    "etsy.com",
    "salesforce.com",
    "zoom.us",
    "airbnb.com",
    "spotify.com",
    "slack.com",
    "tumblr.com",
    "quora.com",
    "bbc.com",
    "cnn.com",
    "nytimes.com",
    "imdb.com",
    "medium.com",
    "adobe.com",
    "nasa.gov",
    "shopify.com",
    "stripe.com",
];

/// Strip scheme, a leading `www.` and trailing slashes; lowercase the rest.
pub fn normalize_domain(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let without_www = without_scheme.strip_prefix("www.").unwrap_or(without_scheme);
    without_www.trim_end_matches('/').to_string()
}

#[derive(Debug, Clone)]
pub struct AllowList {
    domains: HashSet<String>,
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new(DEFAULT_TRUSTED_DOMAINS)
    }
}

impl AllowList {
    pub fn new<I>(domains: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self {
            domains: domains
                .into_iter()
                .map(|d| normalize_domain(d.as_ref()))
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// Whether the user's input names a trusted site.
    ///
    /// Only the bare site matches: paths and subdomains go through analysis.
    pub fn contains(&self, raw_url: &str) -> bool {
        self.domains.contains(&normalize_domain(raw_url))
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

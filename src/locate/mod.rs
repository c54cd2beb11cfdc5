//! Legal document discovery
//!
//! Finds a site's terms of service or privacy policy. The site's own page is
//! checked first; failing that, links that look legal (or conventional legal
//! paths when there are none) are fetched one hop deep.

mod detect;
mod links;

pub use detect::LegalDetector;
pub use links::{candidate_links, fallback_paths};

use scraper::Html;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::LocatorConfig;
use crate::fetch::{visible_text, FetchError, FetchTarget, FetchedPage, Fetcher};
use crate::gate::AddressGuard;

/// Keyword fragments whose presence in a line marks it as legal text
pub const DEFAULT_LEGAL_FRAGMENTS: &[&str] = &[
    "terms of service", "terms and conditions", "user agreement", "service agreement",
    "by using", "by accessing", "by visiting", "you agree", "you accept", "you acknowledge",
    "agreement", "accept", "acceptance", "binding", "bound", "constitute",
    "liability", "limitation of liability", "disclaimer", "warranty", "warranties",
    "damages", "indemnify", "indemnification", "hold harmless", "at your own risk",
    "disclaim", "exclude", "limit", "maximum extent", "fullest extent",
    "rights", "reserve the right", "intellectual property", "proprietary", "copyright",
    "trademark", "license", "permitted", "prohibited", "restricted", "violation",
    "infringement", "unauthorized", "modify", "distribute", "reproduce",
    "service", "services", "website", "platform", "content", "materials",
    "user", "users", "account", "registration", "access", "available",
    "suspend", "terminate", "termination", "discontinue",
    "privacy", "privacy policy", "personal information", "data", "collect",
    "information", "cookies", "tracking", "third party", "share", "disclose",
    "payment", "fees", "charges", "billing", "subscription", "refund",
    "purchase", "transaction", "price", "cost", "currency",
    "governing law", "jurisdiction", "dispute", "arbitration", "court",
    "legal", "laws", "regulations", "compliance", "enforce", "enforcement",
    "changes", "modifications", "updates", "revisions", "notice", "notification",
    "effective date", "last updated", "from time to time", "sole discretion",
    "as is", "as available", "without warranty", "may not", "shall not",
    "responsible", "responsibility", "obligation", "requirements", "conditions",
    "subject to", "in accordance with", "breach",
];

/// Heading and title keywords that mark a whole page as legal
pub const DEFAULT_HEADING_KEYWORDS: &[&str] =
    &["terms", "conditions", "privacy", "policy", "legal", "agreement", "service"];

/// Keywords that make an anchor a candidate legal link
pub const DEFAULT_LINK_KEYWORDS: &[&str] = &["terms", "privacy", "policy", "disclaimer", "legal"];

/// Paths probed when the page links to nothing legal
pub const DEFAULT_FALLBACK_PATHS: &[&str] = &[
    "/privacy",
    "/privacy-policy",
    "/policies",
    "/terms",
    "/terms-of-service",
    "/terms-and-conditions",
    "/legal",
];

/// Legal text found on a linked page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegalDocument {
    pub url: Url,
    pub content: String,
}

/// Where legal text was found, if anywhere
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "found", rename_all = "snake_case")]
pub enum Extraction {
    NotFound,
    FoundInPage { content: String },
    FoundInLinks {
        documents: Vec<LegalDocument>,
        /// Every candidate considered, including those that failed
        links: Vec<Url>,
    },
}

impl Extraction {
    pub fn success(&self) -> bool {
        !matches!(self, Extraction::NotFound)
    }

    pub fn found_in_page(&self) -> bool {
        matches!(self, Extraction::FoundInPage { .. })
    }

    pub fn found_in_links(&self) -> bool {
        matches!(self, Extraction::FoundInLinks { .. })
    }

    pub fn links(&self) -> Option<&[Url]> {
        match self {
            Extraction::FoundInLinks { links, .. } => Some(links),
            _ => None,
        }
    }

    /// All legal text found, linked documents in discovery order separated
    /// by a blank line.
    pub fn into_text(self) -> Option<String> {
        match self {
            Extraction::NotFound => None,
            Extraction::FoundInPage { content } => Some(content),
            Extraction::FoundInLinks { documents, .. } => Some(
                documents
                    .into_iter()
                    .map(|d| d.content)
                    .collect::<Vec<_>>()
                    .join("\n\n"),
            ),
        }
    }
}

/// Failures that prevent any search for legal text
#[derive(Debug, Error)]
pub enum LocateError {
    #[error("Invalid URL format")]
    InvalidUrl,
    #[error("Connection error: {0}")]
    Fetch(#[from] FetchError),
}

/// What one parsed page offers the locator
struct PageScan {
    legal_text: Option<String>,
    links: Vec<Url>,
}

/// Finds legal text for a site
pub struct LegalLocator {
    fetcher: Fetcher,
    detector: LegalDetector,
    link_keywords: Vec<String>,
    fallback_paths: Vec<String>,
    max_candidates: usize,
    guard: Option<AddressGuard>,
}

impl LegalLocator {
    pub fn new(fetcher: Fetcher, config: &LocatorConfig) -> Self {
        let detector = LegalDetector::new(&config.legal_fragments, &config.heading_keywords)
            .with_min_chars(config.min_document_chars)
            .with_context_window(config.context_window);

        Self {
            fetcher,
            detector,
            link_keywords: config.link_keywords.iter().map(|k| k.to_lowercase()).collect(),
            fallback_paths: config.fallback_paths.clone(),
            max_candidates: config.max_candidates,
            guard: None,
        }
    }

    /// Refuse candidate pages whose host fails `guard`
    pub fn with_guard(mut self, guard: AddressGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn detector(&self) -> &LegalDetector {
        &self.detector
    }

    /// Search `url` and, when needed, its candidate legal pages.
    pub async fn locate(&self, url: &Url) -> Result<Extraction, LocateError> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(LocateError::InvalidUrl);
        }

        let page = self.fetcher.fetch(url, FetchTarget::Primary).await?;
        let scan = self.scan(&page, true);

        if let Some(content) = scan.legal_text {
            info!("Legal text found on {}", page.final_url);
            return Ok(Extraction::FoundInPage { content });
        }

        let candidates = if scan.links.is_empty() {
            debug!("No legal links on {}, probing conventional paths", page.final_url);
            fallback_paths(&page.final_url, &self.fallback_paths)
        } else {
            scan.links
        };

        let mut documents = Vec::new();
        for link in candidates.iter().take(self.max_candidates) {
            if let Some(guard) = &self.guard {
                if let Err(e) = guard.check_url(link).await {
                    warn!("Refusing candidate {}: {}", link, e);
                    continue;
                }
            }
            match self.fetcher.fetch(link, FetchTarget::Candidate).await {
                Ok(candidate) => match self.scan(&candidate, false).legal_text {
                    Some(content) => documents.push(LegalDocument {
                        url: link.clone(),
                        content,
                    }),
                    None => debug!("Candidate {} has no legal text", link),
                },
                Err(e) => warn!("Skipping candidate {}: {}", link, e),
            }
        }

        if documents.is_empty() {
            info!("No legal text found for {}", url);
            return Ok(Extraction::NotFound);
        }

        info!(
            "Legal text found on {} of {} candidate pages for {}",
            documents.len(),
            candidates.len().min(self.max_candidates),
            url
        );
        Ok(Extraction::FoundInLinks {
            documents,
            links: candidates,
        })
    }

    /// Parse a page once and pull out everything the locator needs from it.
    fn scan(&self, page: &FetchedPage, with_links: bool) -> PageScan {
        let document = Html::parse_document(&page.html);
        let text = visible_text(&document);
        let legal_text = self.detector.detect(&text, Some(&document));

        let links = if with_links && legal_text.is_none() {
            candidate_links(&document, &page.final_url, &self.link_keywords)
        } else {
            Vec::new()
        };

        PageScan { legal_text, links }
    }
}

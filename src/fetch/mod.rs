//! Document fetching
//!
//! Pages are retrieved through an ordered list of strategies. When headless
//! rendering is enabled it runs first and plain HTTP is the fallback; the
//! first strategy to return HTML wins.

mod http;
mod render;
mod text;

pub use http::HttpStrategy;
pub use render::RenderStrategy;
pub use text::visible_text;
pub(crate) use text::is_hidden_element;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use scraper::Html;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::{FetchConfig, RenderConfig};
use crate::gate::AddressGuard;

/// Errors that can occur during fetching
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned status {status}")]
    Status { status: u16, url: String },
    #[error("Timeout after {0:?}")]
    Timeout(Duration),
    #[error("Content too large: {0} bytes")]
    ContentTooLarge(usize),
    #[error("Too many redirects fetching {0}")]
    TooManyRedirects(String),
    #[error("Refused to fetch {url}: {reason}")]
    Refused { url: String, reason: String },
    #[error("Render failed: {0}")]
    Render(String),
    #[error("No fetch strategy configured")]
    NoStrategy,
}

/// Which kind of page is being fetched; selects the timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTarget {
    /// The site's own page as given by the user
    Primary,
    /// A candidate legal page discovered on the primary page
    Candidate,
}

/// HTML retrieved for one URL
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects
    pub final_url: Url,
    pub html: String,
    /// Name of the strategy that produced the page
    pub strategy: &'static str,
    pub fetch_duration: Duration,
}

impl FetchedPage {
    pub fn document(&self) -> Html {
        Html::parse_document(&self.html)
    }

    /// Visible text of the page, one text node per line
    pub fn text(&self) -> String {
        visible_text(&self.document())
    }
}

/// Outcome of one fetch: the page HTML or the reason there is none
pub type FetchResult = Result<FetchedPage, FetchError>;

/// One way of turning a URL into HTML
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_html(&self, url: &Url, timeout: Duration) -> FetchResult;
}

/// Header set sent with every request, modelled on a desktop browser
pub(crate) fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(REFERER, HeaderValue::from_static("https://www.google.com/"));
    headers
}

/// Runs fetch strategies in order
pub struct Fetcher {
    strategies: Vec<Box<dyn FetchStrategy>>,
    page_timeout: Duration,
    candidate_timeout: Duration,
}

impl Fetcher {
    /// Build the configured strategies. With a `guard`, plain HTTP checks
    /// every redirect target before following it.
    pub fn from_config(
        fetch: &FetchConfig,
        render: &RenderConfig,
        guard: Option<AddressGuard>,
    ) -> Result<Self, FetchError> {
        let mut strategies: Vec<Box<dyn FetchStrategy>> = Vec::new();
        if render.enabled {
            strategies.push(Box::new(RenderStrategy::from_config(render)));
        }
        let http = HttpStrategy::from_config(fetch)?;
        strategies.push(Box::new(match guard {
            Some(guard) => http.with_guard(guard),
            None => http,
        }));

        Ok(Self::with_strategies(
            strategies,
            Duration::from_secs(fetch.page_timeout_secs),
            Duration::from_secs(fetch.candidate_timeout_secs),
        ))
    }

    pub fn with_strategies(
        strategies: Vec<Box<dyn FetchStrategy>>,
        page_timeout: Duration,
        candidate_timeout: Duration,
    ) -> Self {
        Self {
            strategies,
            page_timeout,
            candidate_timeout,
        }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    fn timeout_for(&self, target: FetchTarget) -> Duration {
        match target {
            FetchTarget::Primary => self.page_timeout,
            FetchTarget::Candidate => self.candidate_timeout,
        }
    }

    /// Fetch `url`, trying each strategy until one succeeds.
    ///
    /// The error of the last strategy tried is returned when all fail.
    pub async fn fetch(&self, url: &Url, target: FetchTarget) -> FetchResult {
        let timeout = self.timeout_for(target);
        let mut last_error = FetchError::NoStrategy;

        for strategy in &self.strategies {
            match strategy.fetch_html(url, timeout).await {
                Ok(page) => {
                    debug!(
                        "Fetched {} via {} in {:?}",
                        url,
                        strategy.name(),
                        page.fetch_duration
                    );
                    return Ok(page);
                }
                Err(e) => {
                    warn!("{} fetch of {} failed: {}", strategy.name(), url, e);
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

//! End-to-end site analysis
//!
//! Ties the allow-list, the analysis store, the URL gate, the legal document
//! locator and the risk classifier into one call per site.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};
use url::Url;

use crate::allowlist::AllowList;
use crate::classify::RiskClassifier;
use crate::config::Config;
use crate::fetch::Fetcher;
use crate::gate::{normalize_input, UrlValidator};
use crate::locate::LegalLocator;
use crate::store::{AnalysisStore, StoredAnalysis};

/// Step at which an analysis stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// The URL failed validation or could not be reached
    Validation,
    /// The URL resolves into address space that is never contacted
    Security,
    /// No legal text could be found
    Extraction,
    /// Legal text was found but is too short to judge
    Content,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineStage::Validation => "validation",
            PipelineStage::Security => "security",
            PipelineStage::Extraction => "extraction",
            PipelineStage::Content => "content",
        };
        f.write_str(s)
    }
}

/// Outcome of analyzing one site
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SiteReport {
    /// The site is on the allow-list
    Trusted { url: String },
    /// A previous analysis was found in the store
    Cached { url: String, record: StoredAnalysis },
    Analyzed {
        url: String,
        safety_rating: String,
        recommendation: String,
        suspicious_clauses: Vec<String>,
        total_risks: usize,
        risk_categories: Vec<String>,
        text_length: usize,
    },
    Failed {
        url: String,
        stage: PipelineStage,
        error: String,
    },
}

impl SiteReport {
    pub fn url(&self) -> &str {
        match self {
            SiteReport::Trusted { url }
            | SiteReport::Cached { url, .. }
            | SiteReport::Analyzed { url, .. }
            | SiteReport::Failed { url, .. } => url,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SiteReport::Failed { .. })
    }

    fn failed(url: impl Into<String>, stage: PipelineStage, error: impl Into<String>) -> Self {
        SiteReport::Failed {
            url: url.into(),
            stage,
            error: error.into(),
        }
    }
}

/// Analyzes sites end to end
pub struct SitePipeline {
    allowlist: AllowList,
    store: Option<AnalysisStore>,
    validator: UrlValidator,
    locator: LegalLocator,
    classifier: RiskClassifier,
    min_text_chars: usize,
}

impl SitePipeline {
    /// Candidate pages found by `locator` are held to the validator's
    /// address policy.
    pub fn new(validator: UrlValidator, locator: LegalLocator, classifier: RiskClassifier) -> Self {
        let locator = locator.with_guard(validator.guard());
        Self {
            allowlist: AllowList::default(),
            store: None,
            validator,
            locator,
            classifier,
            min_text_chars: 100,
        }
    }

    /// Build every component from configuration.
    ///
    /// A store that cannot be opened is logged and analysis continues
    /// without persistence.
    pub fn from_config(config: &Config) -> Result<Self> {
        let validator = UrlValidator::from_config(&config.gate, &config.fetch.user_agent)
            .context("Failed to build URL validator")?;
        let fetcher = Fetcher::from_config(&config.fetch, &config.render, Some(validator.guard()))
            .context("Failed to build fetcher")?;
        let locator = LegalLocator::new(fetcher, &config.locator);
        let classifier = RiskClassifier::from_config(&config.classifier)
            .context("Failed to build risk classifier")?;

        let mut pipeline = Self::new(validator, locator, classifier)
            .with_allowlist(AllowList::new(&config.allowlist.domains))
            .with_min_text_chars(config.pipeline.min_text_chars);

        if config.store.enabled {
            match AnalysisStore::open(&config.store.data_dir) {
                Ok(store) => pipeline = pipeline.with_store(store),
                Err(e) => warn!(
                    "Analysis store at {:?} unavailable, results will not be saved: {}",
                    config.store.data_dir, e
                ),
            }
        }

        Ok(pipeline)
    }

    pub fn with_allowlist(mut self, allowlist: AllowList) -> Self {
        self.allowlist = allowlist;
        self
    }

    pub fn with_store(mut self, store: AnalysisStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_min_text_chars(mut self, min_text_chars: usize) -> Self {
        self.min_text_chars = min_text_chars;
        self
    }

    pub fn store(&self) -> Option<&AnalysisStore> {
        self.store.as_ref()
    }

    pub fn classifier(&self) -> &RiskClassifier {
        &self.classifier
    }

    /// Analyze one site. Never fails: problems are reported in the result.
    pub async fn analyze_site(&self, raw: &str) -> SiteReport {
        let raw = raw.trim();

        if self.allowlist.contains(raw) {
            info!("{} is on the allow-list", raw);
            return SiteReport::Trusted { url: raw.to_string() };
        }

        let key = normalize_input(raw);
        if let Some(record) = self.cached(&key) {
            info!("Found previous analysis for {}", raw);
            return SiteReport::Cached {
                url: raw.to_string(),
                record,
            };
        }

        let validation = self.validator.validate(raw).await;
        if !validation.valid {
            let stage = if validation.is_security_rejection() {
                PipelineStage::Security
            } else {
                PipelineStage::Validation
            };
            return SiteReport::failed(raw, stage, format!("Invalid URL: {}", validation.message));
        }
        let url = match Url::parse(&validation.url) {
            Ok(url) => url,
            Err(e) => {
                return SiteReport::failed(
                    raw,
                    PipelineStage::Validation,
                    format!("Invalid URL: {}", e),
                )
            }
        };
        info!("URL is valid: {}", url);

        let extraction = match self.locator.locate(&url).await {
            Ok(extraction) => extraction,
            Err(e) => {
                return SiteReport::failed(
                    url.as_str(),
                    PipelineStage::Extraction,
                    format!("Could not find Terms & Conditions: {}", e),
                )
            }
        };
        let Some(text) = extraction.into_text() else {
            return SiteReport::failed(
                url.as_str(),
                PipelineStage::Extraction,
                "Could not find Terms & Conditions: no legal text on the site or its linked pages",
            );
        };

        let text_length = text.trim().chars().count();
        if text_length < self.min_text_chars {
            return SiteReport::failed(
                url.as_str(),
                PipelineStage::Content,
                "Terms & Conditions text too short or empty",
            );
        }
        debug!("Extracted {} characters of legal text from {}", text_length, url);

        let analysis = self.classifier.analyze(&text);
        info!(
            "{} rated {} with {} risk categories",
            url, analysis.safety_rating, analysis.risks_found
        );

        if let Some(store) = &self.store {
            if let Err(e) = store.upsert(&key, url.as_str(), &text, &analysis) {
                warn!("Could not save analysis for {}: {}", url, e);
            }
        }

        SiteReport::Analyzed {
            url: url.to_string(),
            risk_categories: analysis.categories(),
            safety_rating: analysis.safety_rating,
            recommendation: analysis.recommendation,
            suspicious_clauses: analysis.suspicious_clauses,
            total_risks: analysis.risks_found,
            text_length,
        }
    }

    fn cached(&self, key: &str) -> Option<StoredAnalysis> {
        let store = self.store.as_ref()?;
        match store.lookup(key) {
            Ok(record) => record,
            Err(e) => {
                warn!("Store lookup failed for {}: {}", key, e);
                None
            }
        }
    }

    /// Flush pending store writes
    pub fn flush(&self) {
        if let Some(store) = &self.store {
            if let Err(e) = store.flush() {
                warn!("Failed to flush analysis store: {}", e);
            }
        }
    }
}

//! Configuration for clausewatch

mod classify;
mod fetch;
mod gate;
mod locator;
mod logging;
mod store;

pub use classify::{ClassifierConfig, PatternSpec};
pub use fetch::{FetchConfig, RenderConfig};
pub use gate::GateConfig;
pub use locator::LocatorConfig;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use store::{AllowListConfig, PipelineConfig, StoreConfig};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Browser-like user agent sent with every outbound request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "clausewatch.toml";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// URL validation and safety gate
    #[serde(default)]
    pub gate: GateConfig,
    /// Page fetching
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Optional headless-browser rendering
    #[serde(default)]
    pub render: RenderConfig,
    /// Legal document discovery
    #[serde(default)]
    pub locator: LocatorConfig,
    /// Risk classification
    #[serde(default)]
    pub classifier: ClassifierConfig,
    /// End-to-end pipeline guards
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Analysis store
    #[serde(default)]
    pub store: StoreConfig,
    /// Trusted domains that skip analysis
    #[serde(default)]
    pub allowlist: AllowListConfig,
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Render this configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate all configuration fields.
    ///
    /// Every problem is collected and reported in a single error.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        // Gate
        if self.gate.dns_timeout_secs == 0 {
            errors.push("gate.dns_timeout_secs must be positive".to_string());
        }
        if self.gate.head_timeout_secs == 0 {
            errors.push("gate.head_timeout_secs must be positive".to_string());
        }
        if self.gate.tld_fetch_timeout_secs == 0 {
            errors.push("gate.tld_fetch_timeout_secs must be positive".to_string());
        }
        if url::Url::parse(&self.gate.tld_registry_url).is_err() {
            errors.push(format!(
                "gate.tld_registry_url is not a valid URL: {}",
                self.gate.tld_registry_url
            ));
        }

        // Fetch
        if self.fetch.page_timeout_secs == 0 {
            errors.push("fetch.page_timeout_secs must be positive".to_string());
        }
        if self.fetch.candidate_timeout_secs == 0 {
            errors.push("fetch.candidate_timeout_secs must be positive".to_string());
        }
        if self.fetch.max_content_size == 0 {
            errors.push("fetch.max_content_size must be positive".to_string());
        }
        if self.fetch.user_agent.trim().is_empty() {
            errors.push("fetch.user_agent must not be empty".to_string());
        }
        if self.render.enabled && self.render.browser_path.as_os_str().is_empty() {
            errors.push("render.browser_path must be set when rendering is enabled".to_string());
        }

        // Locator
        if self.locator.max_candidates == 0 {
            errors.push("locator.max_candidates must be positive".to_string());
        }
        if self.locator.legal_fragments.is_empty() {
            errors.push("locator.legal_fragments must not be empty".to_string());
        }
        if self.locator.link_keywords.is_empty() {
            errors.push("locator.link_keywords must not be empty".to_string());
        }
        for path in &self.locator.fallback_paths {
            if !path.starts_with('/') {
                errors.push(format!("locator.fallback_paths entry must start with '/': {}", path));
            }
        }

        // Classifier
        if self.classifier.max_clauses == 0 {
            errors.push("classifier.max_clauses must be positive".to_string());
        }
        for spec in &self.classifier.patterns {
            if spec.category.trim().is_empty() {
                errors.push("classifier.patterns entries need a category".to_string());
            }
            if let Err(e) = regex::Regex::new(&spec.regex) {
                errors.push(format!(
                    "classifier pattern '{}' is not a valid regex: {}",
                    spec.category, e
                ));
            }
        }

        // Store
        if self.store.enabled && self.store.data_dir.as_os_str().is_empty() {
            errors.push("store.data_dir must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}

/// Application directory under a platform base dir, or a local dot directory
/// when the platform provides none.
pub(crate) fn app_dir(base: Option<PathBuf>) -> PathBuf {
    base.map(|dir| dir.join("clausewatch"))
        .unwrap_or_else(|| PathBuf::from(".clausewatch"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config::default()
    }

    #[test]
    fn default_config_passes_validation() {
        let cfg = valid_config();
        assert!(cfg.validate().is_ok(), "default config should be valid");
    }

    #[test]
    fn validate_rejects_zero_timeouts() {
        let mut cfg = valid_config();
        cfg.gate.dns_timeout_secs = 0;
        cfg.fetch.page_timeout_secs = 0;
        let msg = cfg.validate().unwrap_err().to_string();
        assert!(msg.contains("gate.dns_timeout_secs must be positive"));
        assert!(msg.contains("fetch.page_timeout_secs must be positive"));
    }

    #[test]
    fn validate_rejects_bad_registry_url() {
        let mut cfg = valid_config();
        cfg.gate.tld_registry_url = "not a url".to_string();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("tld_registry_url"));
    }

    #[test]
    fn validate_rejects_relative_fallback_path() {
        let mut cfg = valid_config();
        cfg.locator.fallback_paths.push("terms".to_string());
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("must start with '/'"));
    }

    #[test]
    fn validate_rejects_invalid_pattern_regex() {
        let mut cfg = valid_config();
        cfg.classifier.patterns.push(PatternSpec {
            category: "broken".to_string(),
            regex: "(unclosed".to_string(),
        });
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("classifier pattern 'broken'"));
    }

    #[test]
    fn validate_collects_multiple_errors() {
        let mut cfg = valid_config();
        cfg.locator.max_candidates = 0;
        cfg.classifier.max_clauses = 0;
        cfg.fetch.user_agent = "  ".to_string();
        let msg = cfg.validate().unwrap_err().to_string();
        assert!(msg.contains("locator.max_candidates must be positive"));
        assert!(msg.contains("classifier.max_clauses must be positive"));
        assert!(msg.contains("fetch.user_agent must not be empty"));
    }

    #[test]
    fn default_values_match_pipeline_contract() {
        let cfg = valid_config();
        assert_eq!(cfg.locator.min_document_chars, 600);
        assert_eq!(cfg.locator.context_window, 5);
        assert_eq!(cfg.locator.max_candidates, 8);
        assert_eq!(cfg.classifier.min_text_chars, 50);
        assert_eq!(cfg.classifier.max_clauses, 5);
        assert_eq!(cfg.pipeline.min_text_chars, 100);
        assert_eq!(cfg.gate.tld_cache_max_age_secs, 7 * 24 * 60 * 60);
        assert_eq!(cfg.fetch.page_timeout_secs, 10);
        assert_eq!(cfg.fetch.candidate_timeout_secs, 7);
        assert!(cfg.gate.reject_repeated_labels);
        assert!(!cfg.render.enabled);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [locator]
            max_candidates = 3

            [logging]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.locator.max_candidates, 3);
        assert_eq!(cfg.locator.context_window, 5);
        assert_eq!(cfg.logging.level, LogLevel::Debug);
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.fetch.page_timeout_secs, 10);
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let rendered = valid_config().to_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.allowlist.domains.len(), valid_config().allowlist.domains.len());
    }

    #[test]
    fn load_reports_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Config::load(&tmp.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn load_or_default_uses_defaults_when_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Config::load_or_default(&tmp.path().join("missing.toml")).unwrap();
        assert_eq!(cfg.locator.max_candidates, 8);
    }
}

//! Risk classification of legal text
//!
//! Text is split into sentences and each sentence is tested against an
//! ordered table of named patterns. A sentence counts toward at most one
//! category (the first that matches) and each category is reported once,
//! with the first sentence that triggered it. The number of distinct
//! categories determines a coarse safety score.
//!
//! Classification is pure: the same text and pattern table always give the
//! same result.

mod patterns;
mod segment;

pub use patterns::{default_patterns, RiskPattern, DEFAULT_PATTERN_TABLE};
pub use segment::split_sentences;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::config::ClassifierConfig;

pub const RECOMMEND_ACCEPT: &str = "Acceptable: the terms look fine, proceed";
pub const RECOMMEND_CAUTION: &str = "Proceed with caution";
pub const RECOMMEND_AVOID: &str = "High risk: consider alternatives";
pub const RECOMMEND_NO_CONTENT: &str = "No content to analyze";

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("pattern '{category}' is not a valid regex: {source}")]
    InvalidPattern {
        category: String,
        #[source]
        source: regex::Error,
    },
}

/// First sentence found for one risk category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFinding {
    pub category: String,
    pub sentence: String,
}

/// Classification outcome for one text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Triggering sentences, at most `max_clauses`
    pub suspicious_clauses: Vec<String>,
    /// 0 when there was nothing to analyze, otherwise 2 to 9
    pub safety_score: u8,
    /// `"<score>/10"`
    pub safety_rating: String,
    pub recommendation: String,
    /// Number of distinct categories found
    pub risks_found: usize,
    /// Every distinct category found, in order of first appearance
    pub findings: Vec<RiskFinding>,
}

impl AnalysisResult {
    fn empty() -> Self {
        Self {
            suspicious_clauses: Vec::new(),
            safety_score: 0,
            safety_rating: "0/10".to_string(),
            recommendation: RECOMMEND_NO_CONTENT.to_string(),
            risks_found: 0,
            findings: Vec::new(),
        }
    }

    pub fn categories(&self) -> Vec<String> {
        self.findings.iter().map(|f| f.category.clone()).collect()
    }
}

/// Sentence-level risk classifier over a fixed pattern table
#[derive(Debug, Clone)]
pub struct RiskClassifier {
    patterns: Vec<RiskPattern>,
    min_text_chars: usize,
    min_sentence_chars: usize,
    max_clauses: usize,
}

impl Default for RiskClassifier {
    fn default() -> Self {
        Self::new(default_patterns())
    }
}

impl RiskClassifier {
    /// Patterns are tried in the order given.
    pub fn new(patterns: Vec<RiskPattern>) -> Self {
        Self {
            patterns,
            min_text_chars: 50,
            min_sentence_chars: 10,
            max_clauses: 5,
        }
    }

    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ClassifyError> {
        let patterns = if config.patterns.is_empty() {
            default_patterns()
        } else {
            config
                .patterns
                .iter()
                .map(|spec| {
                    RiskPattern::new(spec.category.clone(), &spec.regex).map_err(|source| {
                        ClassifyError::InvalidPattern {
                            category: spec.category.clone(),
                            source,
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut classifier = Self::new(patterns);
        classifier.min_text_chars = config.min_text_chars;
        classifier.min_sentence_chars = config.min_sentence_chars;
        classifier.max_clauses = config.max_clauses;
        Ok(classifier)
    }

    pub fn patterns(&self) -> &[RiskPattern] {
        &self.patterns
    }

    /// Classify `text`.
    pub fn analyze(&self, text: &str) -> AnalysisResult {
        let trimmed = text.trim();
        if trimmed.chars().count() < self.min_text_chars {
            return AnalysisResult::empty();
        }

        let mut seen = HashSet::new();
        let mut findings = Vec::new();

        for sentence in split_sentences(trimmed, self.min_sentence_chars) {
            let Some(pattern) = self.patterns.iter().find(|p| p.is_match(sentence)) else {
                continue;
            };
            if seen.insert(pattern.category()) {
                findings.push(RiskFinding {
                    category: pattern.category().to_string(),
                    sentence: sentence.to_string(),
                });
            }
        }

        let score = Self::safety_score(findings.len());
        AnalysisResult {
            suspicious_clauses: findings
                .iter()
                .take(self.max_clauses)
                .map(|f| f.sentence.clone())
                .collect(),
            safety_score: score,
            safety_rating: format!("{}/10", score),
            recommendation: Self::recommendation(score).to_string(),
            risks_found: findings.len(),
            findings,
        }
    }

    /// Score for a number of distinct risk categories
    pub fn safety_score(risk_count: usize) -> u8 {
        match risk_count {
            0 => 9,
            1 => 7,
            2 => 6,
            3 | 4 => 4,
            _ => 2,
        }
    }

    pub fn recommendation(score: u8) -> &'static str {
        if score >= 8 {
            RECOMMEND_ACCEPT
        } else if score >= 6 {
            RECOMMEND_CAUTION
        } else {
            RECOMMEND_AVOID
        }
    }
}
